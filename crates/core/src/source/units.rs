//! Parsers for the loosely formatted fields providers report.
//!
//! None of these fail: unparseable input falls back to a fixed default
//! (0 bytes, empty hash, the current time).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Seeder/leecher counts at or above this are provider telemetry bugs.
pub const MAX_PEER_COUNT: i64 = 30_000;

static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([\d.]+)\s*([KMGT]?i?B)$").expect("valid size regex"));

static BTIH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)btih:([a-f0-9]{40})").expect("valid btih regex"));

/// Naive formats tried after RFC 3339 / RFC 2822, all read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parse a human-readable size ("1.5 GiB", "700 MB") into bytes.
///
/// Decimal units use powers of 1000, binary units powers of 1024.
/// Returns 0 on no match or unknown unit.
pub fn parse_size(text: &str) -> u64 {
    let Some(caps) = SIZE_RE.captures(text.trim()) else {
        return 0;
    };

    let Ok(value) = caps[1].parse::<f64>() else {
        return 0;
    };

    let multiplier: u64 = match caps[2].to_ascii_uppercase().as_str() {
        "B" => 1,
        "KB" => 1_000,
        "KIB" => 1 << 10,
        "MB" => 1_000_000,
        "MIB" => 1 << 20,
        "GB" => 1_000_000_000,
        "GIB" => 1 << 30,
        "TB" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return 0,
    };

    (value * multiplier as f64).floor() as u64
}

/// Extract the lowercase BitTorrent info-hash from a magnet URI.
///
/// Returns an empty string when there is no 40-hex `btih:` parameter.
pub fn parse_info_hash(magnet: &str) -> String {
    BTIH_RE
        .captures(magnet)
        .map(|caps| caps[1].to_ascii_lowercase())
        .unwrap_or_default()
}

/// Parse a free-text date. `None` for blanks, the `-` placeholder and
/// anything unrecognized.
pub fn try_parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|ndt| ndt.and_utc())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| ndt.and_utc())
        })
}

/// Parse a free-text date, substituting the current time on failure.
pub fn parse_date(text: &str) -> DateTime<Utc> {
    try_parse_date(text).unwrap_or_else(Utc::now)
}

/// Unix seconds to a timestamp, substituting the current time when out of
/// range.
pub fn date_from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

/// Normalize a reported seeder/leecher count.
///
/// Absent and negative values become 0, as do values at or above
/// [`MAX_PEER_COUNT`].
pub fn sanitize_peer_count(value: Option<i64>) -> u32 {
    match value {
        Some(v) if (0..MAX_PEER_COUNT).contains(&v) => v as u32,
        _ => 0,
    }
}
