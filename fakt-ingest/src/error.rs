//! Error types for fakt-ingest
//!
//! Only reconciliation errors travel out of the ingest path. Source errors
//! stay inside the crawl unit that produced them; search and mirror errors
//! stay inside the visitor.

use thiserror::Error;

/// Reconciliation error for a single event
#[derive(Debug, Error)]
pub enum IngestError {
    /// Events may only reference venues the store already knows
    #[error("Venue not found: {0}")]
    VenueNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Common error: {0}")]
    Common(#[from] fakt_common::Error),

    /// Reconciliation failed and so did the rollback
    #[error("{source} -> rollback failed: {rollback}")]
    Rollback {
        source: Box<IngestError>,
        rollback: sqlx::Error,
    },
}

/// Result type for store and ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Crawl failure for one source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid date '{0}': {1}")]
    InvalidDate(String, String),
}

/// Artist search failure
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Image mirroring failure
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Download returned status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}
