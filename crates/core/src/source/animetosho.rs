//! AnimeTosho JSON feed sources.
//!
//! The feed is keyed by AniDB ids: episode id for single episodes, anime id
//! for batches and movies. Filtering happens server-side through a filter
//! expression, so results aren't post-classified.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::JsonSourceConfig;
use crate::metrics::SOURCE_SEARCHES;

use super::http::{FetchError, SourceClient};
use super::query::FilterExpression;
use super::units::{date_from_unix, parse_info_hash, sanitize_peer_count};
use super::{
    Accuracy, CanonicalResult, Operation, Query, ReleaseType, Source, SourceError, UrlSource,
};

/// AnimeTosho search source.
pub struct AnimeToshoSource {
    name: String,
    client: SourceClient,
    url: String,
    filter: FilterExpression,
}

impl AnimeToshoSource {
    pub fn new(name: impl Into<String>, config: &JsonSourceConfig, client: SourceClient) -> Self {
        Self {
            name: name.into(),
            client,
            url: config.url.trim_end_matches('/').to_string(),
            filter: FilterExpression::default(),
        }
    }

    /// Variant that only returns multi-audio / multi-sub releases.
    pub fn multi_audio(
        name: impl Into<String>,
        config: &JsonSourceConfig,
        client: SourceClient,
    ) -> Self {
        Self {
            filter: FilterExpression::multi_audio(),
            ..Self::new(name, config, client)
        }
    }

    fn build_url(&self, selector: &str, query: &Query) -> String {
        format!(
            "{}?{}{}",
            self.url,
            selector,
            self.filter.query_params(query.resolution, &query.exclusions)
        )
    }

    async fn fetch_entries(&self, url: &str) -> Result<Vec<ToshoEntry>, FetchError> {
        let values: Vec<serde_json::Value> = self.client.get_json(url).await?;
        Ok(decode_entries(values))
    }

    async fn perform_search(&self, operation: Operation, url: &str) -> Vec<ToshoEntry> {
        match self.fetch_entries(url).await {
            Ok(entries) => {
                debug!(source = %self.name, entries = entries.len(), "Feed decoded");
                SOURCE_SEARCHES
                    .with_label_values(&[self.name.as_str(), operation.as_str(), "ok"])
                    .inc();
                entries
            }
            Err(e) => {
                warn!(source = %self.name, operation = %operation, error = %e, "Search failed");
                SOURCE_SEARCHES
                    .with_label_values(&[self.name.as_str(), operation.as_str(), "error"])
                    .inc();
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Source for AnimeToshoSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn single(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        let eid = query.require_anidb_eid()?;
        let url = self.build_url(&format!("eid={}", eid), query);
        let entries = self.perform_search(Operation::Single, &url).await;
        Ok(entries.into_iter().map(|e| e.into_result(false)).collect())
    }

    async fn batch(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        let aid = query.require_anidb_aid()?;
        let url = self.build_url(&format!("order=size-d&aid={}", aid), query);
        let entries = self.perform_search(Operation::Batch, &url).await;
        Ok(entries
            .into_iter()
            .filter(|e| e.num_files.unwrap_or(0) > 1)
            .map(|e| e.into_result(true))
            .collect())
    }

    async fn movie(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        let aid = query.require_anidb_aid()?;
        let url = self.build_url(&format!("aid={}", aid), query);
        let entries = self.perform_search(Operation::Movie, &url).await;
        Ok(entries.into_iter().map(|e| e.into_result(false)).collect())
    }

    async fn test(&self) -> bool {
        let ok = self.client.probe(&self.url).await;
        if !ok {
            warn!(source = %self.name, "Connectivity test failed");
        }
        ok
    }
}

/// Resolves info-hashes to NZB URLs through the same feed.
pub struct ToshoNzbSource {
    client: SourceClient,
    url: String,
}

impl ToshoNzbSource {
    pub fn new(config: &JsonSourceConfig, client: SourceClient) -> Self {
        Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl UrlSource for ToshoNzbSource {
    fn name(&self) -> &str {
        "animetosho_nzb"
    }

    async fn search(&self, hash: &str) -> Result<Option<String>, SourceError> {
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(SourceError::InvalidQuery("No hash provided".to_string()));
        }

        let url = format!("{}?show=torrent&btih={}", self.url, urlencoding::encode(hash));
        match self.client.get_json::<ToshoEntry>(&url).await {
            Ok(entry) => Ok(entry.nzb_url.filter(|u| !u.is_empty())),
            Err(e) => {
                warn!(hash = %hash, error = %e, "NZB lookup failed");
                Ok(None)
            }
        }
    }

    async fn test(&self) -> bool {
        self.client.probe(&self.url).await
    }
}

/// One record of the AnimeTosho feed.
#[derive(Debug, Clone, Default, Deserialize)]
struct ToshoEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    torrent_name: Option<String>,
    #[serde(default)]
    magnet_uri: Option<String>,
    #[serde(default)]
    torrent_url: Option<String>,
    #[serde(default)]
    info_hash: Option<String>,
    #[serde(default)]
    seeders: Option<i64>,
    #[serde(default)]
    leechers: Option<i64>,
    #[serde(default)]
    torrent_downloaded_count: Option<i64>,
    #[serde(default)]
    total_size: Option<u64>,
    #[serde(default)]
    num_files: Option<u32>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    anidb_fid: Option<u64>,
    #[serde(default)]
    nzb_url: Option<String>,
}

impl ToshoEntry {
    fn into_result(self, batch: bool) -> CanonicalResult {
        let title = self
            .title
            .filter(|t| !t.is_empty())
            .or(self.torrent_name)
            .unwrap_or_default();

        let link = self
            .magnet_uri
            .filter(|m| !m.is_empty())
            .or(self.torrent_url)
            .unwrap_or_default();

        let hash = self
            .info_hash
            .map(|h| h.to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| parse_info_hash(&link));

        let accuracy = if self.anidb_fid.is_some_and(|fid| fid > 0) && !batch {
            Accuracy::High
        } else {
            Accuracy::Medium
        };

        CanonicalResult {
            title,
            link,
            seeders: sanitize_peer_count(self.seeders),
            leechers: sanitize_peer_count(self.leechers),
            downloads: self
                .torrent_downloaded_count
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(0),
            hash,
            size: self.total_size.unwrap_or(0),
            accuracy,
            date: self
                .timestamp
                .map(date_from_unix)
                .unwrap_or_else(chrono::Utc::now),
            release_type: batch.then_some(ReleaseType::Batch),
        }
    }
}

/// Decode feed records one by one, skipping malformed ones.
fn decode_entries(values: Vec<serde_json::Value>) -> Vec<ToshoEntry> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(index = index, error = %e, "Skipping malformed feed record");
                None
            }
        })
        .collect()
}
