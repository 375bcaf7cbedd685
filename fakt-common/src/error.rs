//! Failures shared by the fakt crates
//!
//! Everything here is either a startup problem (bad config, unknown zone,
//! unreadable database) or a listing date that cannot be pinned to one
//! instant.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable, unparseable or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Not an IANA zone name
    #[error("Unknown time zone '{name}': {reason}")]
    TimeZone { name: String, reason: String },

    /// Wall-clock time skipped or repeated by a DST transition
    #[error("Local time {time} is {problem} in {zone}")]
    LocalTime {
        time: String,
        zone: String,
        problem: &'static str,
    },
}
