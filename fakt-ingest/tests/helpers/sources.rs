//! Scripted sources and visitors

use async_trait::async_trait;
use fakt_common::db::Event;
use fakt_ingest::error::SourceError;
use fakt_ingest::{EventVisitor, Source};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns the same events on every crawl
pub struct StaticSource {
    name: String,
    events: Vec<Event>,
}

impl StaticSource {
    pub fn new(name: &str, events: Vec<Event>) -> Self {
        Self {
            name: name.to_string(),
            events,
        }
    }
}

#[async_trait]
impl Source for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn crawl(&self) -> Result<Vec<Event>, SourceError> {
        Ok(self.events.clone())
    }
}

/// Always fails to crawl
pub struct FailingSource {
    name: String,
}

impl FailingSource {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl Source for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn crawl(&self) -> Result<Vec<Event>, SourceError> {
        Err(SourceError::Status(503))
    }
}

/// Panics mid-crawl
pub struct PanickingSource;

#[async_trait]
impl Source for PanickingSource {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn crawl(&self) -> Result<Vec<Event>, SourceError> {
        panic!("scraper bug");
    }
}

/// Counts crawls, returns nothing
#[derive(Default)]
pub struct CountingSource {
    crawls: AtomicUsize,
}

impl CountingSource {
    pub fn crawls(&self) -> usize {
        self.crawls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn crawl(&self) -> Result<Vec<Event>, SourceError> {
        self.crawls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// Records `source/title` of every visited event
#[derive(Default)]
pub struct RecordingVisitor {
    seen: Mutex<Vec<String>>,
}

impl RecordingVisitor {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventVisitor for RecordingVisitor {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn visit(&self, event: &mut Event) {
        self.seen
            .lock()
            .unwrap()
            .push(format!("{}/{}", event.source, event.title));
    }
}
