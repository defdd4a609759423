//! Mock sources for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::source::{CanonicalResult, Operation, Query, Source, SourceError, UrlSource};

/// Mock implementation of the `Source` trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable results for every supported operation
/// - Mark operations as unsupported
/// - Control the liveness probe
/// - Record the queries it received
pub struct MockSource {
    name: String,
    results: Vec<CanonicalResult>,
    unsupported: HashSet<Operation>,
    alive: bool,
    queries: Mutex<Vec<(Operation, Query)>>,
}

impl MockSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Vec::new(),
            unsupported: HashSet::new(),
            alive: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(mut self, results: Vec<CanonicalResult>) -> Self {
        self.results = results;
        self
    }

    pub fn without(mut self, operation: Operation) -> Self {
        self.unsupported.insert(operation);
        self
    }

    pub fn alive(mut self, alive: bool) -> Self {
        self.alive = alive;
        self
    }

    /// Queries received so far, in order.
    pub fn recorded_queries(&self) -> Vec<(Operation, Query)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn respond(
        &self,
        operation: Operation,
        query: &Query,
    ) -> Result<Vec<CanonicalResult>, SourceError> {
        if self.unsupported.contains(&operation) {
            return Err(SourceError::Unsupported {
                provider: self.name.clone(),
                operation,
            });
        }
        query.require_titles()?;

        if let Ok(mut queries) = self.queries.lock() {
            queries.push((operation, query.clone()));
        }
        Ok(self.results.clone())
    }
}

#[async_trait]
impl Source for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn single(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        self.respond(Operation::Single, query)
    }

    async fn batch(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        self.respond(Operation::Batch, query)
    }

    async fn movie(&self, query: &Query) -> Result<Vec<CanonicalResult>, SourceError> {
        self.respond(Operation::Movie, query)
    }

    async fn test(&self) -> bool {
        self.alive
    }
}

/// Mock implementation of the `UrlSource` trait, backed by a fixed map.
#[derive(Default)]
pub struct MockUrlSource {
    urls: HashMap<String, String>,
}

impl MockUrlSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, hash: &str, url: &str) -> Self {
        self.urls.insert(hash.to_ascii_lowercase(), url.to_string());
        self
    }
}

#[async_trait]
impl UrlSource for MockUrlSource {
    fn name(&self) -> &str {
        "mock_nzb"
    }

    async fn search(&self, hash: &str) -> Result<Option<String>, SourceError> {
        if hash.trim().is_empty() {
            return Err(SourceError::InvalidQuery("No hash provided".to_string()));
        }
        Ok(self.urls.get(&hash.to_ascii_lowercase()).cloned())
    }

    async fn test(&self) -> bool {
        true
    }
}
