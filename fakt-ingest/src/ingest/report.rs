//! Per-cycle outcome summaries

use serde::Serialize;

/// Outcome of one source's crawl unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    /// Set when the crawl itself failed; nothing was ingested
    pub crawl_error: Option<String>,
    pub discovered: usize,
    pub ingested: usize,
    /// One entry per event that failed reconciliation
    pub errors: Vec<String>,
}

impl SourceReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn crawl_failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            crawl_error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.crawl_error.is_none() && self.errors.is_empty()
    }
}

/// Outcome of one full cycle, sources in configured order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub sources: Vec<SourceReport>,
    /// Rows soft-deleted by cleanup, `None` if cleanup failed
    pub cleaned: Option<u64>,
}

impl CycleReport {
    pub fn ingested(&self) -> usize {
        self.sources.iter().map(|s| s.ingested).sum()
    }

    pub fn failed_events(&self) -> usize {
        self.sources.iter().map(|s| s.errors.len()).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.crawl_error.is_some()).count()
    }
}
