//! Torrent/NZB source abstraction.
//!
//! Every provider implements the [`Source`] trait and normalizes its
//! responses into [`CanonicalResult`]s. Sources are built once from
//! configuration and shared through a [`SourceRegistry`].

mod animetosho;
mod classify;
mod html;
mod http;
mod nyaa;
mod query;
mod seadex;
mod types;
mod units;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{HtmlSourceConfig, SourcesConfig};

pub use animetosho::{AnimeToshoSource, ToshoNzbSource};
pub use classify::{
    batch_terms, classify_batch, classify_movie, classify_single, single_terms, BATCH_LIMIT,
    MOVIE_LIMIT, SINGLE_LIMIT,
};
pub use html::{parse_results, RowError, MIN_CELLS};
pub use http::{FetchError, SourceClient};
pub use nyaa::NyaaSource;
pub use query::{build_search_query, FilterExpression};
pub use seadex::SeadexSource;
pub use types::*;
pub use units::{
    date_from_unix, parse_date, parse_info_hash, parse_size, sanitize_peer_count,
    try_parse_date, MAX_PEER_COUNT,
};

/// The set of sources available to callers, keyed by stable id.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<(String, Arc<dyn Source>)>,
    nzb: Option<Arc<dyn UrlSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under `id`, replacing any previous one.
    pub fn with_source(mut self, id: impl Into<String>, source: Arc<dyn Source>) -> Self {
        let id = id.into();
        self.sources.retain(|(existing, _)| *existing != id);
        self.sources.push((id, source));
        self
    }

    pub fn with_nzb(mut self, nzb: Arc<dyn UrlSource>) -> Self {
        self.nzb = Some(nzb);
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Source>> {
        self.sources
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, source)| Arc::clone(source))
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.sources.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Source>)> {
        self.sources.iter().map(|(id, source)| (id.as_str(), source))
    }

    pub fn nzb(&self) -> Option<Arc<dyn UrlSource>> {
        self.nzb.clone()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Construct every enabled source from configuration.
pub fn build_sources(config: &SourcesConfig) -> SourceRegistry {
    let client = SourceClient::new(Duration::from_secs(config.timeout_secs));
    let mut registry = SourceRegistry::new();

    if config.nyaa.enabled {
        let client = html_client(&client, "nyaa", &config.nyaa, config);
        registry = registry.with_source(
            "nyaa",
            Arc::new(NyaaSource::new("nyaa", &config.nyaa, client)),
        );
    }

    if config.sukebei.enabled {
        let client = html_client(&client, "sukebei", &config.sukebei, config);
        registry = registry.with_source(
            "sukebei",
            Arc::new(NyaaSource::new("sukebei", &config.sukebei, client)),
        );
    }

    if config.animetosho.enabled {
        registry = registry.with_source(
            "animetosho",
            Arc::new(AnimeToshoSource::new(
                "animetosho",
                &config.animetosho,
                client.clone(),
            )),
        );
    }

    if config.animetosho_multi.enabled {
        registry = registry.with_source(
            "animetosho_multi",
            Arc::new(AnimeToshoSource::multi_audio(
                "animetosho_multi",
                &config.animetosho_multi,
                client.clone(),
            )),
        );
    }

    if config.seadex.enabled {
        registry = registry.with_source(
            "seadex",
            Arc::new(SeadexSource::new(&config.seadex, client.clone())),
        );
    }

    if config.animetosho_nzb.enabled {
        registry = registry.with_nzb(Arc::new(ToshoNzbSource::new(
            &config.animetosho_nzb,
            client.clone(),
        )));
    }

    info!(sources = ?registry.ids(), nzb = registry.nzb.is_some(), "Sources initialized");
    registry
}

fn html_client(
    base: &SourceClient,
    id: &str,
    html: &HtmlSourceConfig,
    config: &SourcesConfig,
) -> SourceClient {
    if !html.via_gateway {
        return base.clone();
    }
    match &config.gateway_url {
        Some(gateway) => base.clone().via_gateway(gateway.clone()),
        None => {
            debug!(source = %id, "No gateway configured, fetching directly");
            base.clone()
        }
    }
}
