//! Test Helper Utilities
//!
//! Shared utilities for testing fakt-ingest

#![allow(dead_code)]

pub mod db_utils;
pub mod http;
pub mod sources;

pub use db_utils::{create_test_db, future_date, past_date, seed_venue, test_ingest};
pub use http::{serve, serve_routes, ServedResponse};
pub use sources::{CountingSource, FailingSource, PanickingSource, RecordingVisitor, StaticSource};
