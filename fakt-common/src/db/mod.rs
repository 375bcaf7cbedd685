//! Database schema and record model

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
