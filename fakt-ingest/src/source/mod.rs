//! Event sources
//!
//! A source produces the current listing of one upstream feed. Sources are
//! crawled in parallel, once per ingest cycle; each one's failure stays local
//! to its own crawl.

pub mod json_feed;

pub use json_feed::JsonFeedSource;

use crate::error::SourceError;
use async_trait::async_trait;
use fakt_common::db::Event;

#[async_trait]
pub trait Source: Send + Sync {
    /// Stable provenance name stamped on every event this source yields
    fn name(&self) -> &str;

    /// Fetch the current listing
    async fn crawl(&self) -> Result<Vec<Event>, SourceError>;
}
