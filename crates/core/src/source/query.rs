//! Provider query construction.
//!
//! Two families: plain search strings for HTML search pages, and boolean
//! filter expressions for the id-keyed JSON feeds.

use std::collections::BTreeSet;

use super::Resolution;

/// Build a URL-encoded free-text search string.
///
/// The first term is the primary search; the resolution is appended as
/// `{res}p` and every exclusion as `-{term}`.
pub fn build_search_query(
    terms: &[String],
    resolution: Resolution,
    exclusions: &BTreeSet<String>,
) -> String {
    let mut query = terms.first().cloned().unwrap_or_default();

    if !resolution.is_any() {
        query.push_str(&format!(" {}p", resolution));
    }

    for exclusion in exclusions {
        query.push_str(&format!(" -{}", exclusion));
    }

    urlencoding::encode(&query).into_owned()
}

/// Builder for filter expressions understood by the AnimeTosho feed.
///
/// Resolution filtering is negative: every *other* resolution is excluded as
/// a substring, since releases aren't reliably tagged with one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterExpression {
    /// Require a multi-audio/multi-sub marker in the release name.
    pub require_multi_audio: bool,
}

impl FilterExpression {
    const MULTI_AUDIO_MARKER: &'static str = "(multi*|multisub*)";

    pub fn multi_audio() -> Self {
        Self {
            require_multi_audio: true,
        }
    }

    /// The raw expression, or `None` when nothing needs filtering.
    pub fn build(&self, resolution: Resolution, exclusions: &BTreeSet<String>) -> Option<String> {
        let mut expr = String::new();

        if self.require_multi_audio {
            expr.push_str(Self::MULTI_AUDIO_MARKER);
        }

        if !exclusions.is_empty() {
            let terms: Vec<String> = exclusions.iter().map(|e| format!("\"{}\"", e)).collect();
            expr.push_str(&format!("!({})", terms.join("|")));
        }

        if !resolution.is_any() {
            let siblings: Vec<String> = resolution
                .siblings()
                .iter()
                .map(|r| format!("*{}*", r))
                .collect();
            expr.push_str(&format!("!({})", siblings.join("|")));
        }

        if expr.is_empty() {
            None
        } else {
            Some(expr)
        }
    }

    /// The expression as query parameters (`&qx=1&q=...`), empty when there
    /// is nothing to filter.
    pub fn query_params(&self, resolution: Resolution, exclusions: &BTreeSet<String>) -> String {
        match self.build(resolution, exclusions) {
            Some(expr) => format!("&qx=1&q={}", urlencoding::encode(&expr)),
            None => String::new(),
        }
    }
}
