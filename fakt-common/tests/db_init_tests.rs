//! Tests for database initialization
//!
//! - Database file is created on first run
//! - Existing databases open without error
//! - Schema creation is idempotent
//! - Dedup constraints exist for every ensure-exists table

use fakt_common::db::init::{init_database, init_memory_database, init_schema};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master \
         WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("fakt.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("fakt.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO venue (name) VALUES ('Fest Hall')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venue")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing data should survive reopening");
}

#[tokio::test]
async fn test_schema_creation_is_idempotent() {
    let pool = init_memory_database().await.unwrap();
    init_schema(&pool).await.unwrap();
    init_schema(&pool).await.unwrap();

    let tables = table_names(&pool).await;
    for expected in [
        "event",
        "event_performer",
        "performer",
        "performer_image",
        "performer_link",
        "performer_tag",
        "tag",
        "venue",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_performer_dedup_key_enforced() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO performer (name, genre) VALUES ('DJ Null', 'techno')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate = sqlx::query("INSERT INTO performer (name, genre) VALUES ('DJ Null', 'techno')")
        .execute(&pool)
        .await;
    assert!(duplicate.is_err(), "(name, genre) must be unique");

    // Same name, different genre is a different performer
    sqlx::query("INSERT INTO performer (name, genre) VALUES ('DJ Null', 'house')")
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_event_requires_existing_venue() {
    let pool = init_memory_database().await.unwrap();

    let orphan = sqlx::query("INSERT INTO event (title, date, venue_id) VALUES ('Night', 0, 999)")
        .execute(&pool)
        .await;
    assert!(orphan.is_err(), "foreign keys should be enforced");
}
