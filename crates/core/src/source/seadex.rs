//! SeaDex curated-release source.
//!
//! SeaDex lists the recommended ("best") and alternative releases for an
//! AniList entry. It has no notion of episodes, so every operation returns
//! the same list.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::JsonSourceConfig;
use crate::metrics::SOURCE_SEARCHES;

use super::http::{FetchError, SourceClient};
use super::units::parse_date;
use super::{Accuracy, CanonicalResult, Operation, Query, ReleaseType, Source, SourceError};

/// Placeholder SeaDex uses for private-tracker hashes.
const REDACTED_HASH: &str = "<redacted>";

pub struct SeadexSource {
    client: SourceClient,
    url: String,
}

impl SeadexSource {
    pub fn new(config: &JsonSourceConfig, client: SourceClient) -> Self {
        Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
        }
    }

    fn build_url(&self, anilist_id: u64) -> String {
        format!(
            "{}?page=1&perPage=1&filter=alID%3D%22{}%22&skipTotal=1&expand=trs",
            self.url, anilist_id
        )
    }

    async fn fetch_torrents(&self, anilist_id: u64) -> Result<Vec<SeadexTorrent>, FetchError> {
        let page: SeadexPage = self.client.get_json(&self.build_url(anilist_id)).await?;

        let trs = page
            .items
            .into_iter()
            .next()
            .and_then(|entry| entry.expand)
            .map(|expand| expand.trs)
            .unwrap_or_default();

        Ok(trs
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(torrent) => Some(torrent),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed SeaDex torrent");
                    None
                }
            })
            .collect())
    }

    async fn releases(
        &self,
        operation: Operation,
        query: &Query,
    ) -> Result<Vec<CanonicalResult>, SourceError> {
        let anilist_id = query.require_anilist_id()?;
        let titles = query.require_titles()?;

        let torrents = match self.fetch_torrents(anilist_id).await {
            Ok(torrents) => {
                SOURCE_SEARCHES
                    .with_label_values(&[self.name(), operation.as_str(), "ok"])
                    .inc();
                torrents
            }
            Err(e) => {
                warn!(source = "seadex", operation = %operation, error = %e, "Search failed");
                SOURCE_SEARCHES
                    .with_label_values(&[self.name(), operation.as_str(), "error"])
                    .inc();
                return Ok(Vec::new());
            }
        };

        debug!(anilist_id = anilist_id, torrents = torrents.len(), "SeaDex entry fetched");

        Ok(torrents
            .into_iter()
            .filter(|t| t.is_listed(query.episode_count))
            .map(|t| t.into_result(&titles[0]))
            .collect())
    }
}

#[async_trait]
impl Source for SeadexSource {
    fn name(&self) -> &str {
        "seadex"
    }

    async fn single(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        self.releases(Operation::Single, query).await
    }

    async fn batch(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        self.releases(Operation::Batch, query).await
    }

    async fn movie(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        self.releases(Operation::Movie, query).await
    }

    async fn test(&self) -> bool {
        let ok = self.client.probe(&self.url).await;
        if !ok {
            warn!(source = "seadex", "Connectivity test failed");
        }
        ok
    }
}

#[derive(Debug, Deserialize)]
struct SeadexPage {
    #[serde(default)]
    items: Vec<SeadexEntry>,
}

#[derive(Debug, Deserialize)]
struct SeadexEntry {
    #[serde(default)]
    expand: Option<SeadexExpand>,
}

#[derive(Debug, Deserialize)]
struct SeadexExpand {
    #[serde(default)]
    trs: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeadexTorrent {
    #[serde(default)]
    info_hash: String,
    #[serde(default)]
    files: Vec<SeadexFile>,
    #[serde(default)]
    release_group: String,
    #[serde(default)]
    dual_audio: bool,
    #[serde(default)]
    is_best: bool,
    #[serde(default)]
    created: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SeadexFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    length: u64,
}

impl SeadexTorrent {
    /// Drops redacted hashes, and single-file releases of multi-episode shows.
    fn is_listed(&self, episode_count: Option<u32>) -> bool {
        if self.info_hash.is_empty() || self.info_hash == REDACTED_HASH {
            return false;
        }
        let multi_episode = episode_count.is_some_and(|count| count > 1);
        !(multi_episode && self.files.len() == 1)
    }

    fn into_result(self, primary_title: &str) -> CanonicalResult {
        let title = match self.files.as_slice() {
            [only] => only.name.clone(),
            _ if self.dual_audio => {
                format!("[{}] {} Dual Audio", self.release_group, primary_title)
            }
            _ => format!("[{}] {}", self.release_group, primary_title),
        };

        CanonicalResult {
            title,
            link: self.info_hash.clone(),
            seeders: 0,
            leechers: 0,
            downloads: 0,
            hash: self.info_hash.to_ascii_lowercase(),
            size: self.files.iter().map(|f| f.length).sum(),
            accuracy: Accuracy::High,
            date: parse_date(&self.created),
            release_type: Some(if self.is_best {
                ReleaseType::Best
            } else {
                ReleaseType::Alt
            }),
        }
    }
}
