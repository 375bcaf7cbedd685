//! Performer persistence
//!
//! `(name, genre)` identifies a performer. Enrichment data (tags, links,
//! images) is written only when the performer row is first created; later
//! sightings of the same performer change nothing.

use crate::error::IngestResult;
use fakt_common::db::{Link, Performer};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

/// Performer query filter
///
/// `Some` fields match exactly; an empty `ids` list matches any ID.
/// `page_size == 0` disables paging.
#[derive(Debug, Clone, Default)]
pub struct PerformerFilter {
    pub ids: Vec<i64>,
    pub name: Option<String>,
    pub genre: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl PerformerFilter {
    /// Exact dedup-key lookup
    pub fn by_key(name: &str, genre: &str) -> Self {
        Self {
            name: Some(name.trim().to_string()),
            genre: Some(genre.trim().to_string()),
            ..Default::default()
        }
    }

    pub fn by_ids(ids: Vec<i64>) -> Self {
        Self {
            ids,
            ..Default::default()
        }
    }
}

/// Ensure the performer exists, creating it if absent. Sets the ID.
pub async fn performer_must_exist(
    conn: &mut SqliteConnection,
    performer: &mut Performer,
) -> IngestResult<()> {
    let name = performer.name.trim().to_string();
    let genre = performer.genre.trim().to_string();

    let inserted: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO performer (name, genre, home, listen_url, embed_url, info)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(name, genre) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(&genre)
    .bind(&performer.home)
    .bind(&performer.listen_url)
    .bind(&performer.embed_url)
    .bind(&performer.info)
    .fetch_optional(&mut *conn)
    .await?;

    match inserted {
        Some(id) => {
            performer.id = id;
            save_tags(conn, id, &performer.tags).await?;
            save_links(conn, id, &performer.links).await?;
            save_images(conn, id, performer).await?;
            debug!(performer = %name, id, "Created performer");
        }
        None => {
            performer.id =
                sqlx::query_scalar("SELECT id FROM performer WHERE name = ? AND genre = ?")
                    .bind(&name)
                    .bind(&genre)
                    .fetch_one(&mut *conn)
                    .await?;
        }
    }

    Ok(())
}

async fn save_tags(
    conn: &mut SqliteConnection,
    performer_id: i64,
    tags: &[String],
) -> IngestResult<()> {
    for (position, tag) in tags.iter().enumerate() {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }

        sqlx::query("INSERT INTO tag (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(&tag)
            .execute(&mut *conn)
            .await?;

        let tag_id: i64 = sqlx::query_scalar("SELECT id FROM tag WHERE name = ?")
            .bind(&tag)
            .fetch_one(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT OR IGNORE INTO performer_tag (performer_id, tag_id, position) VALUES (?, ?, ?)",
        )
        .bind(performer_id)
        .bind(tag_id)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn save_links(
    conn: &mut SqliteConnection,
    performer_id: i64,
    links: &[Link],
) -> IngestResult<()> {
    for (position, link) in links.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO performer_link (performer_id, uri, text, position) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(performer_id)
        .bind(&link.uri)
        .bind(&link.text)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn save_images(
    conn: &mut SqliteConnection,
    performer_id: i64,
    performer: &Performer,
) -> IngestResult<()> {
    for (variant, path) in &performer.images {
        sqlx::query(
            "INSERT OR IGNORE INTO performer_image (performer_id, variant, path) VALUES (?, ?, ?)",
        )
        .bind(performer_id)
        .bind(variant)
        .bind(path)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Find performers matching `filter`, with tags, links and images loaded
pub async fn find_performers(
    pool: &SqlitePool,
    filter: &PerformerFilter,
) -> IngestResult<Vec<Performer>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, name, genre, home, listen_url, embed_url, info FROM performer WHERE 1 = 1",
    );

    if !filter.ids.is_empty() {
        qb.push(" AND id IN (");
        let mut ids = qb.separated(", ");
        for id in &filter.ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    if let Some(name) = &filter.name {
        qb.push(" AND name = ").push_bind(name.clone());
    }
    if let Some(genre) = &filter.genre {
        qb.push(" AND genre = ").push_bind(genre.clone());
    }

    qb.push(" ORDER BY name, id");

    if filter.page_size > 0 {
        let offset = i64::from(filter.page.saturating_sub(1)) * i64::from(filter.page_size);
        qb.push(" LIMIT ")
            .push_bind(i64::from(filter.page_size))
            .push(" OFFSET ")
            .push_bind(offset);
    }

    let rows = qb.build().fetch_all(pool).await?;

    let mut performers = Vec::with_capacity(rows.len());
    for row in rows {
        let mut performer = Performer {
            id: row.get("id"),
            name: row.get("name"),
            genre: row.get("genre"),
            home: row.get("home"),
            listen_url: row.get("listen_url"),
            embed_url: row.get("embed_url"),
            info: row.get("info"),
            ..Default::default()
        };
        load_details(pool, &mut performer).await?;
        performers.push(performer);
    }

    Ok(performers)
}

async fn load_details(pool: &SqlitePool, performer: &mut Performer) -> IngestResult<()> {
    performer.tags = sqlx::query_scalar(
        r#"
        SELECT t.name FROM performer_tag pt
        JOIN tag t ON t.id = pt.tag_id
        WHERE pt.performer_id = ?
        ORDER BY pt.position
        "#,
    )
    .bind(performer.id)
    .fetch_all(pool)
    .await?;

    performer.links = sqlx::query(
        "SELECT uri, text FROM performer_link WHERE performer_id = ? ORDER BY position",
    )
    .bind(performer.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| Link {
        uri: row.get("uri"),
        text: row.get("text"),
    })
    .collect();

    performer.images =
        sqlx::query("SELECT variant, path FROM performer_image WHERE performer_id = ?")
            .bind(performer.id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|row| (row.get("variant"), row.get("path")))
            .collect();

    Ok(())
}
