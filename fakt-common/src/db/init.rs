//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates the schema
//! idempotently. Every uniqueness constraint below is a dedup key the ingest
//! store relies on for conflict-tolerant inserts.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database at `db_path`, creating file and schema if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema.
///
/// The connection is never recycled, so the database lives as long as the
/// pool.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (safe to call repeatedly)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_venue_table(pool).await?;
    create_performer_table(pool).await?;
    create_tag_tables(pool).await?;
    create_performer_link_table(pool).await?;
    create_performer_image_table(pool).await?;
    create_event_table(pool).await?;
    create_event_performer_table(pool).await?;

    info!("Database schema initialized");
    Ok(())
}

async fn create_venue_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            address TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_performer_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performer (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            genre TEXT NOT NULL DEFAULT '',
            home TEXT NOT NULL DEFAULT '',
            listen_url TEXT NOT NULL DEFAULT '',
            embed_url TEXT NOT NULL DEFAULT '',
            info TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(name, genre)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tag_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tag (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performer_tag (
            performer_id INTEGER NOT NULL REFERENCES performer(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tag(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            UNIQUE(performer_id, tag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_performer_link_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performer_link (
            performer_id INTEGER NOT NULL REFERENCES performer(id) ON DELETE CASCADE,
            uri TEXT NOT NULL,
            text TEXT NOT NULL DEFAULT '',
            position INTEGER NOT NULL DEFAULT 0,
            UNIQUE(performer_id, uri)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_performer_image_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performer_image (
            performer_id INTEGER NOT NULL REFERENCES performer(id) ON DELETE CASCADE,
            variant TEXT NOT NULL,
            path TEXT NOT NULL,
            UNIQUE(performer_id, variant)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_event_table(pool: &SqlitePool) -> Result<()> {
    // date holds unix seconds (UTC)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            date INTEGER NOT NULL,
            utc_offset INTEGER NOT NULL DEFAULT 0,
            source TEXT NOT NULL DEFAULT '',
            venue_id INTEGER NOT NULL REFERENCES venue(id),
            deleted INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(venue_id, date, title)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_event_date ON event(date, deleted)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_event_performer_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_performer (
            event_id INTEGER NOT NULL REFERENCES event(id) ON DELETE CASCADE,
            performer_id INTEGER NOT NULL REFERENCES performer(id),
            position INTEGER NOT NULL DEFAULT 0,
            UNIQUE(event_id, performer_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
