//! HTTP artist search client
//!
//! Talks to a JSON search service:
//! - `GET {base}/search?q=<name>&home=<town>&limit=<n>` returns an array of
//!   `{name, url, art, tags}`
//! - `GET {base}/artist?url=<artist page>` returns `{bio, embed, links}`

use crate::error::SearchError;
use crate::visitor::{ArtistInfo, ArtistSearch, SearchResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("fakt-ingest/", env!("CARGO_PKG_VERSION"));

pub struct ArtistSearchClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl ArtistSearchClient {
    pub fn new(base_url: &str) -> Result<Self, SearchError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| SearchError::Parse(format!("{}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SearchError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        tracing::debug!(url = %url, "Querying artist search");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ArtistSearch for ArtistSearchClient {
    async fn search(
        &self,
        name: &str,
        home: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let limit_param = limit.to_string();
        let mut results: Vec<SearchResult> = self
            .get_json("search", &[("q", name), ("home", home), ("limit", limit_param.as_str())])
            .await?;
        results.truncate(limit);
        Ok(results)
    }

    async fn artist_info(&self, url: &str) -> Result<ArtistInfo, SearchError> {
        self.get_json("artist", &[("url", url)]).await
    }
}
