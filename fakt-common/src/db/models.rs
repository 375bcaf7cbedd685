//! Event record model
//!
//! Plain data shared by sources, visitors and the store. Persistent IDs are
//! assigned by the store; `0` means "not persisted yet".

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A listed event at a known venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date: DateTime<FixedOffset>,
    /// Provenance tag, overwritten with the originating source's name
    pub source: String,
    pub venue: Venue,
    pub performers: Vec<Performer>,
    pub deleted: bool,
}

impl Event {
    /// New, unpersisted event
    pub fn new(title: impl Into<String>, date: DateTime<FixedOffset>, venue: Venue) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            date,
            source: String::new(),
            venue,
            performers: Vec::new(),
            deleted: false,
        }
    }

    /// Builder-style performer append
    pub fn with_performer(mut self, performer: Performer) -> Self {
        self.performers.push(performer);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub address: String,
}

impl Venue {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A performing artist
///
/// `(name, genre)` is the dedup key used by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performer {
    pub id: i64,
    pub name: String,
    pub genre: String,
    /// Home town, used to narrow artist searches
    pub home: String,
    pub listen_url: String,
    pub embed_url: String,
    /// Free-text biography
    pub info: String,
    pub tags: Vec<String>,
    pub links: Vec<Link>,
    /// Mirrored image variants keyed by variant name ("orig", "thumb")
    pub images: BTreeMap<String, String>,
}

impl Performer {
    pub fn new(name: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            genre: genre.into(),
            ..Default::default()
        }
    }

    /// Stable hex SHA-256 of the normalized name, empty for a blank name
    pub fn name_hash(&self) -> String {
        let normalized = self.name.trim().to_lowercase();
        if normalized.is_empty() {
            return String::new();
        }
        format!("{:x}", Sha256::digest(normalized.as_bytes()))
    }

    /// Already persisted or already carrying a listen URL
    pub fn is_enriched(&self) -> bool {
        self.id > 0 || !self.listen_url.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub uri: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_hash_is_stable_and_normalized() {
        let a = Performer::new("DJ Null", "techno");
        let b = Performer::new("  dj null ", "house");
        assert_eq!(a.name_hash(), b.name_hash());
        assert_eq!(a.name_hash().len(), 64);
    }

    #[test]
    fn test_name_hash_blank_name_is_empty() {
        assert_eq!(Performer::new("   ", "").name_hash(), "");
    }

    #[test]
    fn test_is_enriched() {
        let mut p = Performer::new("Band", "rock");
        assert!(!p.is_enriched());

        p.listen_url = "https://band.example/".to_string();
        assert!(p.is_enriched());

        let mut q = Performer::new("Other", "rock");
        q.id = 7;
        assert!(q.is_enriched());
    }

    #[test]
    fn test_event_serializes_with_offset() {
        let date = DateTime::parse_from_rfc3339("2024-05-01T20:00:00+02:00").unwrap();
        let event = Event::new("Night", date, Venue::named("Fest Hall"))
            .with_performer(Performer::new("DJ Null", "techno"));

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.date.offset().local_minus_utc(), 7200);
        assert_eq!(back.performers[0].name, "DJ Null");
    }
}
