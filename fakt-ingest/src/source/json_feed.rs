//! JSON listing feed
//!
//! Fetches an array of listings over HTTP:
//!
//! ```json
//! [{
//!   "title": "Night",
//!   "description": "optional",
//!   "date": "2024-05-01 20:00",
//!   "venue": "Fest Hall",
//!   "address": "optional",
//!   "performers": [{"name": "DJ Null", "genre": "techno", "home": "Berlin"}]
//! }]
//! ```
//!
//! Dates without an offset are wall-clock times in the configured zone.
//! A listing with an unusable date is skipped; the rest of the feed is kept.

use super::Source;
use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use fakt_common::db::{Event, Performer, Venue};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("fakt-ingest/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Accepted wall-clock formats, tried in order
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    #[serde(default)]
    description: String,
    date: String,
    venue: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    performers: Vec<FeedPerformer>,
}

#[derive(Debug, Deserialize)]
struct FeedPerformer {
    name: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    home: String,
}

pub struct JsonFeedSource {
    name: String,
    url: String,
    timezone: Tz,
    http_client: reqwest::Client,
}

impl JsonFeedSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timezone: Tz,
    ) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            name: name.into(),
            url: url.into(),
            timezone,
            http_client,
        })
    }
}

#[async_trait]
impl Source for JsonFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn crawl(&self) -> Result<Vec<Event>, SourceError> {
        debug!(source = %self.name, url = %self.url, "Fetching feed");

        let response = self.http_client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_listing(&body, &self.timezone)
    }
}

/// Parse a feed body into events. Items with bad dates are skipped.
pub fn parse_listing(body: &str, tz: &Tz) -> Result<Vec<Event>, SourceError> {
    let items: Vec<FeedItem> =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    let mut events = Vec::with_capacity(items.len());
    for item in items {
        let date = match parse_date(&item.date, tz) {
            Ok(date) => date,
            Err(e) => {
                warn!(title = %item.title, error = %e, "Skipping listing");
                continue;
            }
        };

        let venue = Venue {
            id: 0,
            name: item.venue.trim().to_string(),
            address: item.address,
        };

        let mut event = Event::new(item.title.trim(), date, venue);
        event.description = item.description;
        event.performers = item
            .performers
            .into_iter()
            .filter(|p| !p.name.trim().is_empty())
            .map(|p| {
                let mut performer = Performer::new(p.name.trim(), p.genre.trim());
                performer.home = p.home.trim().to_string();
                performer
            })
            .collect();

        events.push(event);
    }

    Ok(events)
}

/// RFC 3339 dates keep their offset; anything else is local to `tz`
pub fn parse_date(raw: &str, tz: &Tz) -> Result<DateTime<FixedOffset>, SourceError> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date);
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            SourceError::InvalidDate(raw.to_string(), "unrecognized format".to_string())
        })?;

    fakt_common::time::localize(tz, naive)
        .map_err(|e| SourceError::InvalidDate(raw.to_string(), e.to_string()))
}
