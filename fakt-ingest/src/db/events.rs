//! Event persistence
//!
//! An event is identified by `(venue_id, date, title)`. The source name is
//! provenance only: when two feeds list the same show, the first one to
//! reconcile it wins and the other becomes a no-op.

use crate::db::performers::{find_performers, PerformerFilter};
use crate::error::IngestResult;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use fakt_common::db::{Event, Venue};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

/// Event query filter
///
/// The default matches every live (not soft-deleted) event, past ones
/// included; use [`EventFilter::upcoming`] for the public listing.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub ids: Vec<i64>,
    pub venue_id: Option<i64>,
    /// Only events at or after this instant
    pub from: Option<DateTime<Utc>>,
    pub include_deleted: bool,
    pub page: u32,
    pub page_size: u32,
}

impl EventFilter {
    /// Live events at or after `now`
    pub fn upcoming(now: DateTime<Utc>) -> Self {
        Self {
            from: Some(now),
            ..Default::default()
        }
    }
}

/// Ensure the event exists, creating it if absent, and link its performers.
///
/// The venue and every performer must already carry store IDs.
pub async fn event_must_exist(conn: &mut SqliteConnection, event: &mut Event) -> IngestResult<()> {
    let title = event.title.trim().to_string();
    let date = event.date.timestamp();

    let inserted: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO event (title, description, date, utc_offset, source, venue_id)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(venue_id, date, title) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&title)
    .bind(&event.description)
    .bind(date)
    .bind(event.date.offset().local_minus_utc())
    .bind(&event.source)
    .bind(event.venue.id)
    .fetch_optional(&mut *conn)
    .await?;

    event.id = match inserted {
        Some(id) => {
            debug!(event = %title, id, "Created event");
            id
        }
        None => {
            sqlx::query_scalar("SELECT id FROM event WHERE venue_id = ? AND date = ? AND title = ?")
                .bind(event.venue.id)
                .bind(date)
                .bind(&title)
                .fetch_one(&mut *conn)
                .await?
        }
    };

    for (position, performer) in event.performers.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO event_performer (event_id, performer_id, position) \
             VALUES (?, ?, ?)",
        )
        .bind(event.id)
        .bind(performer.id)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Soft-delete events dated before `cutoff`. Returns the number newly marked.
pub async fn mark_past_events_deleted(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> IngestResult<u64> {
    let result = sqlx::query("UPDATE event SET deleted = 1 WHERE date < ? AND deleted = 0")
        .bind(cutoff.timestamp())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Find events matching `filter`, ordered by date, with venue and performers
pub async fn find_events(pool: &SqlitePool, filter: &EventFilter) -> IngestResult<Vec<Event>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT e.id, e.title, e.description, e.date, e.utc_offset, e.source, e.deleted,
               v.id AS venue_id, v.name AS venue_name, v.address AS venue_address
        FROM event e
        JOIN venue v ON v.id = e.venue_id
        WHERE 1 = 1
        "#,
    );

    if !filter.ids.is_empty() {
        qb.push(" AND e.id IN (");
        let mut ids = qb.separated(", ");
        for id in &filter.ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    if let Some(venue_id) = filter.venue_id {
        qb.push(" AND e.venue_id = ").push_bind(venue_id);
    }
    if let Some(from) = filter.from {
        qb.push(" AND e.date >= ").push_bind(from.timestamp());
    }
    if !filter.include_deleted {
        qb.push(" AND e.deleted = 0");
    }

    qb.push(" ORDER BY e.date, e.id");

    if filter.page_size > 0 {
        let offset = i64::from(filter.page.saturating_sub(1)) * i64::from(filter.page_size);
        qb.push(" LIMIT ")
            .push_bind(i64::from(filter.page_size))
            .push(" OFFSET ")
            .push_bind(offset);
    }

    let rows = qb.build().fetch_all(pool).await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        let mut event = event_from_row(&row);
        load_performers(pool, &mut event).await?;
        events.push(event);
    }

    Ok(events)
}

fn event_from_row(row: &SqliteRow) -> Event {
    let timestamp: i64 = row.get("date");
    let offset_secs: i32 = row.get("utc_offset");
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix());
    let date = DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .with_timezone(&offset);

    Event {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        date,
        source: row.get("source"),
        venue: Venue {
            id: row.get("venue_id"),
            name: row.get("venue_name"),
            address: row.get("venue_address"),
        },
        performers: Vec::new(),
        deleted: row.get::<i64, _>("deleted") != 0,
    }
}

async fn load_performers(pool: &SqlitePool, event: &mut Event) -> IngestResult<()> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT performer_id FROM event_performer WHERE event_id = ? ORDER BY position",
    )
    .bind(event.id)
    .fetch_all(pool)
    .await?;

    if ids.is_empty() {
        return Ok(());
    }

    let mut performers = find_performers(pool, &PerformerFilter::by_ids(ids.clone())).await?;
    performers.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
    event.performers = performers;

    Ok(())
}
