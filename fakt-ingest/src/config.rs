//! Ingest wiring from the shared TOML configuration

use crate::ingest::IngestSettings;
use crate::media::FsImageMirror;
use crate::services::ArtistSearchClient;
use crate::source::{JsonFeedSource, Source};
use crate::visitor::{ArtistSearchVisitor, EventVisitor, KnownPerformerVisitor, VisitorChain};
use fakt_common::config::{IngestConfig, TomlConfig};
use fakt_common::time::parse_timezone;
use fakt_common::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Orchestrator settings from `[ingest]`.
///
/// An unknown time zone is a configuration error; nothing should run with
/// a guessed zone.
pub fn settings_from_config(config: &IngestConfig) -> Result<IngestSettings> {
    if config.update_frequency_secs == 0 {
        return Err(Error::Config(
            "ingest.update_frequency_secs must be greater than zero".to_string(),
        ));
    }

    Ok(IngestSettings {
        update_frequency: Duration::from_secs(config.update_frequency_secs),
        timezone: parse_timezone(&config.timezone)?,
        ..IngestSettings::default()
    })
}

/// One [`JsonFeedSource`] per `[[ingest.sources]]` entry, in file order
pub fn sources_from_config(
    config: &IngestConfig,
    settings: &IngestSettings,
) -> Result<Vec<Arc<dyn Source>>> {
    let mut sources: Vec<Arc<dyn Source>> = Vec::with_capacity(config.sources.len());

    for entry in &config.sources {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(Error::Config(format!(
                "source with url {} has no name",
                entry.url
            )));
        }
        if sources.iter().any(|s| s.name() == name) {
            return Err(Error::Config(format!("duplicate source name: {}", name)));
        }
        url::Url::parse(&entry.url).map_err(|e| {
            Error::Config(format!("source {}: invalid url {}: {}", name, entry.url, e))
        })?;

        let source = JsonFeedSource::new(name, entry.url.as_str(), settings.timezone)
            .map_err(|e| Error::Config(format!("source {}: {}", name, e)))?;
        sources.push(Arc::new(source));
    }

    Ok(sources)
}

/// The enrichment chain.
///
/// Known performers always come first. With `[ingest.artist_search]` set,
/// remote search follows, mirroring artwork into the static directory.
pub fn visitors_from_config(
    config: &TomlConfig,
    root: &Path,
    pool: SqlitePool,
) -> Result<VisitorChain> {
    let mut visitors: Vec<Arc<dyn EventVisitor>> =
        vec![Arc::new(KnownPerformerVisitor::new(pool))];

    if let Some(search) = &config.ingest.artist_search {
        let client = ArtistSearchClient::new(&search.url)
            .map_err(|e| Error::Config(format!("ingest.artist_search: {}", e)))?;
        let mirror = FsImageMirror::new(
            config.static_files_path(root),
            search.static_url_prefix.as_str(),
        )
        .map_err(|e| Error::Config(format!("image mirror: {}", e)))?;
        visitors.push(Arc::new(ArtistSearchVisitor::new(
            Arc::new(client),
            Arc::new(mirror),
        )));
    }

    Ok(VisitorChain::new(visitors))
}
