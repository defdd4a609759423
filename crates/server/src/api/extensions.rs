//! Extension file listing.
//!
//! The files themselves are served by `ServeDir` under `/extensions`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ExtensionFile {
    pub name: String,
    #[serde(rename = "isFile")]
    pub is_file: bool,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct ExtensionListing {
    pub ok: bool,
    pub path: String,
    pub files: Vec<ExtensionFile>,
}

#[derive(Debug, Serialize)]
pub struct ListingError {
    pub ok: bool,
    pub error: String,
}

/// GET /extensions/list
///
/// Lists the top level of the extensions directory, for debugging
/// deployments.
pub async fn list_extensions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExtensionListing>, (StatusCode, Json<ListingError>)> {
    let dir = resolve(state.extensions_dir());

    match read_listing(&dir).await {
        Ok(files) => Ok(Json(ExtensionListing {
            ok: true,
            path: dir.display().to_string(),
            files,
        })),
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Failed to list extensions");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ListingError {
                    ok: false,
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Relative directories are reported against the working directory.
fn resolve(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

async fn read_listing(dir: &Path) -> std::io::Result<Vec<ExtensionFile>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        // Follows symlinks, like stat(2)
        let metadata = tokio::fs::metadata(entry.path()).await?;
        files.push(ExtensionFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_file: metadata.is_file(),
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
