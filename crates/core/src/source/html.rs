//! Result-table scraper for Nyaa-style search pages.
//!
//! Each `tbody tr` is one release. Cells, in order: category, title,
//! download links, size, date, seeders, leechers and (optionally) completed
//! downloads.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use super::units::{date_from_unix, parse_date, parse_info_hash, parse_size, sanitize_peer_count};
use super::{Accuracy, CanonicalResult};

/// Minimum number of cells in a result row.
pub const MIN_CELLS: usize = 7;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody tr").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));

/// Why a single row was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row has {0} cells, expected at least {MIN_CELLS}")]
    TooFewCells(usize),

    #[error("row has no title link")]
    MissingTitle,

    #[error("row has no download link")]
    MissingLink,
}

/// Parse every result row of a search page.
///
/// Rows that fail extraction are logged and skipped; they never abort the
/// remaining rows.
pub fn parse_results(html: &str, base_url: &str) -> Vec<CanonicalResult> {
    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for (index, row) in document.select(&ROW).enumerate() {
        match extract_row(row, base_url) {
            Ok(result) => results.push(result),
            Err(RowError::TooFewCells(n)) => {
                debug!(row = index, cells = n, "Skipping short row");
            }
            Err(e) => {
                warn!(row = index, error = %e, "Error parsing row");
            }
        }
    }

    results
}

fn extract_row(row: ElementRef<'_>, base_url: &str) -> Result<CanonicalResult, RowError> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    if cells.len() < MIN_CELLS {
        return Err(RowError::TooFewCells(cells.len()));
    }

    let title = extract_title(cells[1]).ok_or(RowError::MissingTitle)?;
    let link = extract_link(cells[2], base_url).ok_or(RowError::MissingLink)?;
    let hash = if link.starts_with("magnet:") {
        parse_info_hash(&link)
    } else {
        String::new()
    };

    let date = cells[4]
        .value()
        .attr("data-timestamp")
        .and_then(|ts| ts.trim().parse::<i64>().ok())
        .map(date_from_unix)
        .unwrap_or_else(|| parse_date(&cell_text(cells[4])));

    Ok(CanonicalResult {
        title,
        link,
        seeders: parse_count(cells[5]),
        leechers: parse_count(cells[6]),
        downloads: cells
            .get(7)
            .and_then(|c| cell_text(*c).parse::<u32>().ok())
            .unwrap_or(0),
        hash,
        size: parse_size(&cell_text(cells[3])),
        accuracy: Accuracy::Medium,
        date,
        release_type: None,
    })
}

/// The last non-comment anchor; its `title` attribute wins over its text.
fn extract_title(cell: ElementRef<'_>) -> Option<String> {
    let anchor = cell
        .select(&ANCHOR)
        .filter(|a| !a.value().classes().any(|c| c == "comments"))
        .last()?;

    let title = anchor
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| anchor.text().collect::<String>().trim().to_string());

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// A magnet URI if the cell has one, otherwise the last anchor's href.
fn extract_link(cell: ElementRef<'_>, base_url: &str) -> Option<String> {
    let hrefs: Vec<&str> = cell
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .collect();

    if let Some(magnet) = hrefs.iter().find(|h| h.starts_with("magnet:")) {
        return Some(magnet.to_string());
    }

    hrefs.last().map(|href| resolve_link(href, base_url))
}

fn resolve_link(href: &str, base_url: &str) -> String {
    if href.starts_with("http") || href.starts_with("magnet:") {
        return href.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn parse_count(cell: ElementRef<'_>) -> u32 {
    sanitize_peer_count(cell_text(cell).parse::<i64>().ok())
}
