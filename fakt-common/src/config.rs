//! Bootstrap configuration loading and root folder resolution
//!
//! Configuration file priority:
//! 1. Explicit path (command-line argument)
//! 2. `FAKT_CONFIG` environment variable
//! 3. `~/.config/fakt/fakt.toml`
//! 4. Built-in defaults (a missing file is not an error)
//!
//! Root folder priority:
//! 1. Command-line argument
//! 2. `FAKT_ROOT_FOLDER` environment variable
//! 3. TOML `root_folder`
//! 4. OS-dependent default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "FAKT_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "FAKT_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Root folder holding the database and mirrored images
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// SQLite database file (defaults to `<root>/fakt.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory for mirrored performer images (defaults to `<root>/static`)
    #[serde(default)]
    pub static_files_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Ingest worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Run the periodic ingest at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between the end of one cycle and the start of the next
    #[serde(default = "default_update_frequency_secs")]
    pub update_frequency_secs: u64,

    /// IANA time zone used to interpret listing dates
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Upstream feeds, crawled in parallel
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Remote performer enrichment; absent disables it
    #[serde(default)]
    pub artist_search: Option<ArtistSearchConfig>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            update_frequency_secs: default_update_frequency_secs(),
            timezone: default_timezone(),
            sources: Vec::new(),
            artist_search: None,
        }
    }
}

/// One upstream listing feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Provenance name stamped on every event from this feed
    pub name: String,
    /// Feed URL
    pub url: String,
}

/// Artist search service and where mirrored artwork is published
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArtistSearchConfig {
    /// Base URL of the search service
    pub url: String,

    /// URL prefix under which the static image directory is served
    #[serde(default = "default_static_url_prefix")]
    pub static_url_prefix: String,
}

fn default_static_url_prefix() -> String {
    "/static".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_update_frequency_secs() -> u64 {
    3600
}

fn default_timezone() -> String {
    crate::time::DEFAULT_TIMEZONE.to_string()
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate the config file following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("fakt").join("fakt.toml"))
        .filter(|p| p.exists())
}

/// Load the bootstrap configuration, falling back to defaults.
///
/// A missing file is logged and replaced by defaults. A file that exists but
/// cannot be parsed is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            info!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("fakt"))
        .unwrap_or_else(|| PathBuf::from("./fakt_data"))
}

impl TomlConfig {
    /// Database file, relative paths resolved against `root`
    pub fn database_path(&self, root: &Path) -> PathBuf {
        match &self.database_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join("fakt.db"),
        }
    }

    /// Mirrored image directory, relative paths resolved against `root`
    pub fn static_files_path(&self, root: &Path) -> PathBuf {
        match &self.static_files_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join("static"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.root_folder.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.ingest.enabled);
        assert_eq!(config.ingest.update_frequency_secs, 3600);
        assert_eq!(config.ingest.timezone, "Europe/Berlin");
        assert!(config.ingest.sources.is_empty());
        assert!(config.ingest.artist_search.is_none());
    }

    #[test]
    fn test_artist_search_prefix_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [ingest.artist_search]
            url = "http://search.local:8090"
            "#,
        )
        .unwrap();
        let search = config.ingest.artist_search.unwrap();
        assert_eq!(search.url, "http://search.local:8090");
        assert_eq!(search.static_url_prefix, "/static");
    }

    #[test]
    fn test_database_path_defaults_under_root() {
        let config = TomlConfig::default();
        let root = Path::new("/srv/fakt");
        assert_eq!(config.database_path(root), PathBuf::from("/srv/fakt/fakt.db"));
        assert_eq!(config.static_files_path(root), PathBuf::from("/srv/fakt/static"));
    }

    #[test]
    fn test_relative_paths_resolved_against_root() {
        let config = TomlConfig {
            database_path: Some(PathBuf::from("data/events.db")),
            static_files_path: Some(PathBuf::from("/var/www/img")),
            ..Default::default()
        };
        let root = Path::new("/srv/fakt");
        assert_eq!(
            config.database_path(root),
            PathBuf::from("/srv/fakt/data/events.db")
        );
        assert_eq!(config.static_files_path(root), PathBuf::from("/var/www/img"));
    }

    #[test]
    fn test_cli_root_folder_wins() {
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }
}
