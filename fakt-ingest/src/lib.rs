//! fakt-ingest library interface
//!
//! Periodically crawls the configured listing sources, enriches each
//! discovered event through the visitor chain, and reconciles it into the
//! catalog with idempotent find-or-create semantics. Exposed as a library
//! for integration testing and for embedding custom sources or visitors.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod media;
pub mod services;
pub mod source;
pub mod visitor;

pub use crate::error::{IngestError, IngestResult};
pub use crate::ingest::{CycleReport, Ingest, IngestSettings, SourceReport};
pub use crate::source::Source;
pub use crate::visitor::{EventVisitor, VisitorChain};
