//! Event enrichment
//!
//! Visitors mutate an event in place before it is reconciled. They never
//! fail outward: each visitor logs its own errors and leaves the event with
//! whatever data it has.
//!
//! Order matters and is part of configuration. [`KnownPerformerVisitor`]
//! must run before [`ArtistSearchVisitor`] so performers already in the store
//! are substituted first and skipped by the search.

pub mod artist_search;
pub mod performer_store;

pub use artist_search::{
    transform_embed, ArtistInfo, ArtistSearch, ArtistSearchVisitor, SearchResult, EMBED_PARAMS,
};
pub use performer_store::KnownPerformerVisitor;

use async_trait::async_trait;
use fakt_common::db::Event;
use std::sync::Arc;
use tracing::trace;

#[async_trait]
pub trait EventVisitor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Enrich `event` in place
    async fn visit(&self, event: &mut Event);
}

/// Ordered visitor list, applied front to back
#[derive(Clone, Default)]
pub struct VisitorChain {
    visitors: Vec<Arc<dyn EventVisitor>>,
}

impl VisitorChain {
    pub fn new(visitors: Vec<Arc<dyn EventVisitor>>) -> Self {
        Self { visitors }
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.visitors.iter().map(|v| v.name()).collect()
    }

    /// Run every visitor over `event` in order
    pub async fn visit(&self, event: &mut Event) {
        for visitor in &self.visitors {
            trace!(visitor = visitor.name(), event = %event.title, "Visiting event");
            visitor.visit(event).await;
        }
    }
}
