//! Database Test Utilities

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use fakt_common::db::{init_database, Venue};
use fakt_ingest::db::create_venue;
use fakt_ingest::{Ingest, IngestSettings, Source, VisitorChain};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Create a file-backed test database with the schema applied
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let pool = init_database(&temp_dir.path().join("test_fakt.db")).await?;
    Ok((temp_dir, pool))
}

/// Insert a venue the way an operator would before ingest runs
pub async fn seed_venue(pool: &SqlitePool, name: &str) -> Result<i64> {
    let mut venue = Venue::named(name);
    Ok(create_venue(pool, &mut venue).await?)
}

/// Orchestrator with short timings for tests
pub fn test_ingest(
    pool: &SqlitePool,
    sources: Vec<Arc<dyn Source>>,
    visitors: VisitorChain,
) -> Ingest {
    let settings = IngestSettings {
        update_frequency: Duration::from_millis(20),
        ..IngestSettings::default()
    };
    Ingest::new(pool.clone(), settings, sources, visitors)
}

/// Far enough ahead that cleanup never touches it
pub fn future_date() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2099-06-01T20:00:00+02:00").unwrap()
}

pub fn past_date() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2001-03-10T21:30:00+01:00").unwrap()
}
