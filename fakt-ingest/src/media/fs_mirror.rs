//! Filesystem image mirror
//!
//! Writes `<root>/<key>/orig.<ext>` and reports it as
//! `<url_prefix>/<key>/orig.<ext>`.

use super::ImageMirror;
use crate::error::MirrorError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("fakt-ingest/", env!("CARGO_PKG_VERSION"));
const DEFAULT_EXTENSION: &str = "jpg";

pub struct FsImageMirror {
    root: PathBuf,
    url_prefix: String,
    http_client: reqwest::Client,
}

impl FsImageMirror {
    pub fn new(
        root: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
    ) -> Result<Self, MirrorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl ImageMirror for FsImageMirror {
    async fn mirror(
        &self,
        src_url: &str,
        key: &str,
    ) -> Result<BTreeMap<String, String>, MirrorError> {
        let url = Url::parse(src_url)
            .map_err(|e| MirrorError::InvalidUrl(format!("{}: {}", src_url, e)))?;
        let key = sanitize_key(key);
        if key.is_empty() {
            return Err(MirrorError::InvalidUrl(format!("{}: empty image key", src_url)));
        }
        let extension = image_extension(&url);

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        let dir = self.root.join(&key);
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("orig.{}", extension);
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        debug!(key = %key, bytes = bytes.len(), "Mirrored image");

        Ok(BTreeMap::from([(
            "orig".to_string(),
            format!("{}/{}/{}", self.url_prefix, key, file_name),
        )]))
    }
}

/// Keep only characters safe in a directory name
fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Extension from the URL path, `jpg` when missing or implausible
fn image_extension(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            (1..=4).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
