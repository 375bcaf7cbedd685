//! Artist search enrichment
//!
//! Fills in listen URL, tags, bio, embeddable player and links for
//! performers that have never been enriched, and mirrors their artwork
//! locally instead of hot-linking it.

use super::EventVisitor;
use crate::error::SearchError;
use crate::media::ImageMirror;
use async_trait::async_trait;
use chrono::Utc;
use fakt_common::db::{Event, Link, Performer};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error};
use url::Url;

/// Fixed player parameters: small, white background, dark-gray links,
/// no artwork, transparent
pub const EMBED_PARAMS: &[(&str, &str)] = &[
    ("size", "small"),
    ("bgcol", "ffffff"),
    ("linkcol", "333333"),
    ("artwork", "none"),
    ("transparent", "true"),
];

/// One artist search hit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub name: String,
    /// Artist page, used as listen URL
    pub url: String,
    /// Artwork image URL
    pub art: String,
    pub tags: Vec<String>,
}

/// Extended artist page data
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArtistInfo {
    pub bio: String,
    /// Embeddable player URL as published by the artist page
    pub embed: String,
    pub links: Vec<Link>,
}

/// External artist search service
#[async_trait]
pub trait ArtistSearch: Send + Sync {
    /// Search by name, narrowed by home town
    async fn search(
        &self,
        name: &str,
        home: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, SearchError>;

    /// Fetch extended info from an artist page
    async fn artist_info(&self, url: &str) -> Result<ArtistInfo, SearchError>;
}

pub struct ArtistSearchVisitor {
    search: Arc<dyn ArtistSearch>,
    mirror: Arc<dyn ImageMirror>,
}

impl ArtistSearchVisitor {
    pub fn new(search: Arc<dyn ArtistSearch>, mirror: Arc<dyn ImageMirror>) -> Self {
        Self { search, mirror }
    }

    async fn enrich(&self, index: usize, performer: &mut Performer, result: &SearchResult) {
        let mut image_key = performer.name_hash();
        if image_key.is_empty() {
            let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
            image_key = format!("{}{}", index, nanos);
        }

        match self.mirror.mirror(&result.art, &image_key).await {
            Ok(images) => performer.images = images,
            Err(e) => error!(
                performer = %performer.name,
                error = %e,
                "Failed to mirror artist images"
            ),
        }

        performer.listen_url = result.url.clone();
        performer.tags = result.tags.clone();

        let info = match self.search.artist_info(&result.url).await {
            Ok(info) => info,
            Err(e) => {
                error!(performer = %performer.name, error = %e, "Failed to get artist info");
                ArtistInfo::default()
            }
        };

        performer.info = info.bio;
        performer.embed_url = transform_embed(&info.embed, EMBED_PARAMS);
        performer.links.extend(info.links);

        debug!(
            performer = %performer.name,
            listen_url = %performer.listen_url,
            "Enriched performer"
        );
    }
}

#[async_trait]
impl EventVisitor for ArtistSearchVisitor {
    fn name(&self) -> &'static str {
        "artist-search"
    }

    async fn visit(&self, event: &mut Event) {
        for (index, performer) in event.performers.iter_mut().enumerate() {
            if performer.is_enriched() {
                continue;
            }

            let results = match self.search.search(&performer.name, &performer.home, 1).await {
                Ok(results) => results,
                Err(e) => {
                    // Remaining performers stay unenriched this cycle
                    error!(
                        performer = %performer.name,
                        error = %e,
                        "Failed to query artist search"
                    );
                    return;
                }
            };

            if let Some(result) = results.first() {
                self.enrich(index, performer, result).await;
            }
        }
    }
}

/// Rewrite the `key=value` path segments of an embedded-player URL.
///
/// Existing keys are overridden in place; missing keys are appended in
/// sorted order. An empty input stays empty and an unparseable one is
/// returned unchanged.
pub fn transform_embed(embed: &str, params: &[(&str, &str)]) -> String {
    let embed = embed.trim();
    if embed.is_empty() {
        return String::new();
    }

    let Ok(mut url) = Url::parse(embed) else {
        return embed.to_string();
    };

    let overrides: BTreeMap<&str, &str> = params.iter().copied().collect();
    let trailing_slash = url.path().ends_with('/');

    let mut seen = BTreeSet::new();
    let mut segments: Vec<String> = Vec::new();
    for segment in url.path_segments().into_iter().flatten().filter(|s| !s.is_empty()) {
        match segment.split_once('=') {
            Some((key, _)) if overrides.contains_key(key) => {
                segments.push(format!("{}={}", key, overrides[key]));
                seen.insert(key.to_string());
            }
            _ => segments.push(segment.to_string()),
        }
    }
    for (key, value) in &overrides {
        if !seen.contains(*key) {
            segments.push(format!("{}={}", key, value));
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if trailing_slash {
        path.push('/');
    }
    url.set_path(&path);
    url.to_string()
}
