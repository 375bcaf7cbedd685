//! Venue persistence
//!
//! Ingest never creates venues. They are registered up front with
//! [`create_venue`]; an event naming an unknown venue fails reconciliation.

use crate::error::{IngestError, IngestResult};
use fakt_common::db::Venue;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Resolve the venue's ID, failing if the store doesn't know it.
///
/// Looks up by ID when one is set, otherwise by name.
pub async fn venue_must_exist(conn: &mut SqliteConnection, venue: &mut Venue) -> IngestResult<()> {
    let id: Option<i64> = if venue.id > 0 {
        sqlx::query_scalar("SELECT id FROM venue WHERE id = ?")
            .bind(venue.id)
            .fetch_optional(&mut *conn)
            .await?
    } else {
        sqlx::query_scalar("SELECT id FROM venue WHERE name = ?")
            .bind(venue.name.trim())
            .fetch_optional(&mut *conn)
            .await?
    };

    match id {
        Some(id) => {
            venue.id = id;
            Ok(())
        }
        None => Err(IngestError::VenueNotFound(venue.name.clone())),
    }
}

/// Register a venue (no-op if the name is already known). Sets the ID.
pub async fn create_venue(pool: &SqlitePool, venue: &mut Venue) -> IngestResult<i64> {
    let name = venue.name.trim();

    sqlx::query(
        r#"
        INSERT INTO venue (name, address) VALUES (?, ?)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(&venue.address)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM venue WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;

    venue.id = id;
    Ok(id)
}

/// All known venues ordered by name
pub async fn find_venues(pool: &SqlitePool) -> IngestResult<Vec<Venue>> {
    let rows = sqlx::query("SELECT id, name, address FROM venue ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Venue {
            id: row.get("id"),
            name: row.get("name"),
            address: row.get("address"),
        })
        .collect())
}
