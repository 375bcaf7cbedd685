//! # fakt common library
//!
//! Shared code for the fakt services:
//! - Event, venue and performer record model
//! - Database initialization and schema
//! - Bootstrap configuration loading
//! - Time zone helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
