//! Types for the anime source search system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Requested video resolution.
///
/// Serialized as the bare number string (`"1080"`), with `""` meaning any.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Resolution {
    #[serde(rename = "2160")]
    R2160,
    #[serde(rename = "1080")]
    R1080,
    #[serde(rename = "720")]
    R720,
    #[serde(rename = "540")]
    R540,
    #[serde(rename = "480")]
    R480,
    #[default]
    #[serde(rename = "")]
    Any,
}

impl Resolution {
    /// Every concrete resolution, highest first.
    pub const ALL: [Resolution; 5] = [
        Resolution::R2160,
        Resolution::R1080,
        Resolution::R720,
        Resolution::R540,
        Resolution::R480,
    ];

    /// The numeric tag, or an empty string for [`Resolution::Any`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::R2160 => "2160",
            Resolution::R1080 => "1080",
            Resolution::R720 => "720",
            Resolution::R540 => "540",
            Resolution::R480 => "480",
            Resolution::Any => "",
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Resolution::Any)
    }

    /// Every concrete resolution except this one.
    pub fn siblings(&self) -> Vec<Resolution> {
        Self::ALL.into_iter().filter(|r| r != self).collect()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub/dub preference hint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioType {
    Sub,
    Dub,
}

/// Caller-supplied search parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// AniList anime id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anilist_id: Option<u64>,
    /// AniDB anime id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anidb_aid: Option<u64>,
    /// AniDB episode id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anidb_eid: Option<u64>,
    /// Titles and alternative titles, primary first.
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Total episode count of the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub resolution: Resolution,
    /// Keywords to exclude from searches.
    #[serde(default)]
    pub exclusions: BTreeSet<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioType>,
}

impl Query {
    /// Query with just a title list.
    pub fn titled<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            titles: titles.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Fails unless at least one title is present.
    pub fn require_titles(&self) -> Result<&[String], SourceError> {
        if self.titles.is_empty() {
            return Err(SourceError::InvalidQuery("No titles provided".to_string()));
        }
        Ok(&self.titles)
    }

    pub fn require_anilist_id(&self) -> Result<u64, SourceError> {
        require_id(self.anilist_id, "anilistId")
    }

    pub fn require_anidb_aid(&self) -> Result<u64, SourceError> {
        require_id(self.anidb_aid, "anidbAid")
    }

    pub fn require_anidb_eid(&self) -> Result<u64, SourceError> {
        require_id(self.anidb_eid, "anidbEid")
    }
}

fn require_id(id: Option<u64>, field: &str) -> Result<u64, SourceError> {
    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(SourceError::InvalidQuery(format!("No {} provided", field))),
    }
}

/// Confidence that a result matches the requested media.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    High,
    Medium,
    Low,
}

/// Optional release tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Batch,
    Best,
    Alt,
}

/// The normalized, provider-agnostic search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalResult {
    pub title: String,
    /// Magnet URI, direct URL or bare info-hash, depending on the provider.
    pub link: String,
    pub seeders: u32,
    pub leechers: u32,
    pub downloads: u32,
    /// Lowercase hex info-hash, empty if unknown.
    pub hash: String,
    /// Size in bytes.
    pub size: u64,
    pub accuracy: Accuracy,
    pub date: DateTime<Utc>,
    #[serde(default, rename = "type")]
    pub release_type: Option<ReleaseType>,
}

/// The three search operations of a [`Source`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Single,
    Batch,
    Movie,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Single => "single",
            Operation::Batch => "batch",
            Operation::Movie => "movie",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Operation::Single),
            "batch" => Ok(Operation::Batch),
            "movie" => Ok(Operation::Movie),
            other => Err(format!("unknown operation: {}", other)),
        }
    }
}

/// Caller-visible errors of the source contract.
///
/// Transport and parse failures never surface here; they degrade to an
/// empty result list.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Source {provider} doesn't implement {operation}")]
    Unsupported {
        provider: String,
        operation: Operation,
    },
}

impl SourceError {
    fn unsupported(provider: &str, operation: Operation) -> Self {
        SourceError::Unsupported {
            provider: provider.to_string(),
            operation,
        }
    }
}

/// Trait for torrent/NZB search providers.
///
/// Operations a provider does not support fall back to
/// [`SourceError::Unsupported`].
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable provider id, used for logging and lookup.
    fn name(&self) -> &str;

    /// Results for one specific episode.
    async fn single(&self, _query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        Err(SourceError::unsupported(self.name(), Operation::Single))
    }

    /// Multi-episode collections.
    async fn batch(&self, _query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        Err(SourceError::unsupported(self.name(), Operation::Batch))
    }

    /// Standalone features.
    async fn movie(&self, _query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        Err(SourceError::unsupported(self.name(), Operation::Movie))
    }

    /// Liveness probe. Never fails; any error reads as `false`.
    async fn test(&self) -> bool;

    /// Dispatch to one of the three search operations.
    async fn search(
        &self,
        operation: Operation,
        query: &Query,
    ) -> Result<Vec<CanonicalResult>, SourceError> {
        match operation {
            Operation::Single => self.single(query).await,
            Operation::Batch => self.batch(query).await,
            Operation::Movie => self.movie(query).await,
        }
    }
}

/// Providers that resolve an info-hash to an NZB or direct-download URL.
#[async_trait]
pub trait UrlSource: Send + Sync {
    fn name(&self) -> &str;

    /// Look up a download URL for the given BitTorrent info-hash.
    async fn search(&self, hash: &str) -> Result<Option<String>, SourceError>;

    async fn test(&self) -> bool;
}
