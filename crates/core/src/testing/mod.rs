//! Testing utilities and mock implementations.
//!
//! Mock implementations of the external-facing traits, so the gateway and
//! the HTTP API can be exercised without real upstreams.
//!
//! # Example
//!
//! ```rust,ignore
//! use anisearch_core::testing::{fixtures, MockSource, MockUpstream};
//!
//! let upstream = MockUpstream::new();
//! upstream.set_body("<html>...</html>");
//!
//! let source = MockSource::new("mock")
//!     .with_results(vec![fixtures::result("[Group] Show - 01", "abc")]);
//! ```

mod mock_source;
mod mock_upstream;

pub use mock_source::{MockSource, MockUrlSource};
pub use mock_upstream::MockUpstream;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::source::{Accuracy, CanonicalResult, Query};

    /// A canonical result with reasonable defaults.
    pub fn result(title: &str, hash: &str) -> CanonicalResult {
        CanonicalResult {
            title: title.to_string(),
            link: format!("magnet:?xt=urn:btih:{}", hash),
            seeders: 50,
            leechers: 10,
            downloads: 100,
            hash: hash.to_string(),
            size: 1024 * 1024 * 700,
            accuracy: Accuracy::Medium,
            date: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
            release_type: None,
        }
    }

    /// A query for one episode of a titled show.
    pub fn episode_query(title: &str, episode: u32) -> Query {
        Query {
            episode: Some(episode),
            ..Query::titled([title])
        }
    }
}
