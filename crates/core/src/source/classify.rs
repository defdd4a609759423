//! Single/batch/movie heuristics for providers that don't label releases.
//!
//! These policies are shared by every HTML-driven source.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{CanonicalResult, ReleaseType};

/// Results returned by `single` when no episode number narrows the search.
pub const SINGLE_LIMIT: usize = 20;
/// Results returned by `batch`.
pub const BATCH_LIMIT: usize = 10;
/// Results returned by `movie`.
pub const MOVIE_LIMIT: usize = 15;

static SERIES_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(s\d+|season|episode|ep\d+|\d+x\d+)\b").expect("valid series regex")
});

/// Free-text search terms for a single episode: each title followed by the
/// zero-padded episode number.
pub fn single_terms(titles: &[String], episode: Option<u32>) -> Vec<String> {
    match episode {
        Some(ep) => titles
            .iter()
            .map(|title| format!("{} {:02}", title, ep))
            .collect(),
        None => titles.to_vec(),
    }
}

/// Free-text search terms for a batch: each title followed by "batch".
pub fn batch_terms(titles: &[String]) -> Vec<String> {
    titles.iter().map(|title| format!("{} batch", title)).collect()
}

/// Keep results naming the requested episode.
///
/// With an episode number, a title must contain it as a whole word
/// (optionally with one leading zero) and must not mention "batch". Without
/// one, the upstream ordering is truncated to [`SINGLE_LIMIT`].
pub fn classify_single(results: Vec<CanonicalResult>, episode: Option<u32>) -> Vec<CanonicalResult> {
    let Some(ep) = episode else {
        return results.into_iter().take(SINGLE_LIMIT).collect();
    };

    let episode_re = match Regex::new(&format!(r"\b0?{}\b", ep)) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    results
        .into_iter()
        .filter(|result| {
            let title = result.title.to_lowercase();
            episode_re.is_match(&title) && !title.contains("batch")
        })
        .collect()
}

/// Keep results that look like multi-episode collections and tag them.
///
/// A title qualifies when it contains "batch", "complete", or the literal
/// range `1-{episode_count}`.
pub fn classify_batch(
    results: Vec<CanonicalResult>,
    episode_count: Option<u32>,
) -> Vec<CanonicalResult> {
    let range = episode_count.map(|count| format!("1-{}", count));

    results
        .into_iter()
        .filter(|result| {
            let title = result.title.to_lowercase();
            title.contains("batch")
                || title.contains("complete")
                || range.as_deref().is_some_and(|r| title.contains(r))
        })
        .take(BATCH_LIMIT)
        .map(|mut result| {
            result.release_type = Some(ReleaseType::Batch);
            result
        })
        .collect()
}

/// Drop anything carrying season/episode markers or "batch".
pub fn classify_movie(results: Vec<CanonicalResult>) -> Vec<CanonicalResult> {
    results
        .into_iter()
        .filter(|result| is_movie_title(&result.title))
        .take(MOVIE_LIMIT)
        .collect()
}

fn is_movie_title(title: &str) -> bool {
    let title = title.to_lowercase();
    !SERIES_MARKER_RE.is_match(&title) && !title.contains("batch")
}
