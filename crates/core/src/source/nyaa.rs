//! Nyaa and Sukebei HTML search sources.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::HtmlSourceConfig;
use crate::metrics::SOURCE_SEARCHES;

use super::classify::{batch_terms, classify_batch, classify_movie, classify_single, single_terms};
use super::html::parse_results;
use super::http::{FetchError, SourceClient};
use super::query::build_search_query;
use super::{CanonicalResult, Operation, Query, Source, SourceError};

/// A source backed by a Nyaa-style HTML search page.
pub struct NyaaSource {
    name: String,
    client: SourceClient,
    base_url: String,
    category: String,
    sort_by_seeders: bool,
}

impl NyaaSource {
    /// Create a source from its configuration.
    pub fn new(name: impl Into<String>, config: &HtmlSourceConfig, client: SourceClient) -> Self {
        Self {
            name: name.into(),
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            category: config.category.clone(),
            sort_by_seeders: config.sort_by_seeders,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the search page URL for an encoded query string.
    fn build_search_url(&self, encoded_query: &str) -> String {
        let mut url = format!(
            "{}/?f=0&c={}&q={}",
            self.base_url, self.category, encoded_query
        );
        if self.sort_by_seeders {
            url.push_str("&s=seeders&o=desc");
        }
        url
    }

    async fn fetch_results(&self, encoded_query: &str) -> Result<Vec<CanonicalResult>, FetchError> {
        let url = self.build_search_url(encoded_query);
        let html = self.client.get_text(&url).await?;
        let results = parse_results(&html, &self.base_url);

        debug!(source = %self.name, results = results.len(), "Search page parsed");
        Ok(results)
    }

    /// Fetch and parse, degrading any transport failure to an empty list.
    async fn perform_search(
        &self,
        operation: Operation,
        terms: &[String],
        query: &Query,
    ) -> Vec<CanonicalResult> {
        let encoded = build_search_query(terms, query.resolution, &query.exclusions);

        match self.fetch_results(&encoded).await {
            Ok(results) => {
                SOURCE_SEARCHES
                    .with_label_values(&[self.name.as_str(), operation.as_str(), "ok"])
                    .inc();
                results
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
impl Source for NyaaSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn single(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        let titles = query.require_titles()?;
        let terms = single_terms(titles, query.episode);
        let results = self.perform_search(Operation::Single, &terms, query).await;
        Ok(classify_single(results, query.episode))
    }

    async fn batch(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        let titles = query.require_titles()?;
        let terms = batch_terms(titles);
        let results = self.perform_search(Operation::Batch, &terms, query).await;
        Ok(classify_batch(results, query.episode_count))
    }

    async fn movie(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        let titles = query.require_titles()?;
        let results = self.perform_search(Operation::Movie, titles, query).await;
        Ok(classify_movie(results))
    }

    async fn test(&self) -> bool {
        let ok = self.client.probe(&self.base_url).await;
        if !ok {
            warn!(source = %self.name, "Connectivity test failed");
        }
        ok
    }
}
