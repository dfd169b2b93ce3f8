//! Locating per-item detail documents.
//!
//! A mapping document refers to point clouds and images by a path fragment.
//! Depending on how the dataset was laid out, the matching detail document
//! sits either directly under the search root (absolute layout) or under the
//! mapping document's own directory (relative layout).
//!
//! The resolver tries the absolute layout first. The first time a lookup
//! there fails it switches to the relative layout for the rest of the run
//! and never tries the absolute layout again. A lookup that fails in the
//! relative layout is fatal.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Path layout currently in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Nothing resolved yet.
    #[default]
    Unknown,
    /// `search_root / fragment`
    Absolute,
    /// `search_root / mapping_dir / fragment`
    Relative,
}

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid detail document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("Could not resolve '{fragment}' (tried {attempted:?}): {source}")]
pub struct ResolveError {
    pub fragment: String,
    pub attempted: Vec<PathBuf>,
    #[source]
    pub source: DetailError,
}

/// The parts of a detail document the pipeline reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemDetail {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub metadata: JsonValue,
}

impl ItemDetail {
    /// Ground-detection reference of a point cloud item.
    ///
    /// Any missing level or wrong type along the metadata path yields `None`.
    pub fn ground_reference(&self) -> Option<String> {
        match self
            .metadata
            .pointer("/user/lidar_ground_detection/groundMapId")?
        {
            JsonValue::String(id) => Some(id.clone()),
            JsonValue::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedDetail {
    pub path: PathBuf,
    pub mode: SearchMode,
    pub detail: ItemDetail,
}

/// Resolves path fragments to detail documents for one run.
#[derive(Debug)]
pub struct MappingResolver {
    search_root: PathBuf,
    mapping_dir: PathBuf,
    mode: SearchMode,
}

impl MappingResolver {
    /// `mapping_dir` is the remote directory of the mapping document
    /// (`/`, `/scene_a`, ...).
    pub fn new(search_root: impl Into<PathBuf>, mapping_dir: &str) -> Self {
        Self {
            search_root: search_root.into(),
            mapping_dir: PathBuf::from(mapping_dir.trim_start_matches('/')),
            mode: SearchMode::Unknown,
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Detail document path for `fragment` under `mode`.
    ///
    /// The file extension is rewritten to `.json`; the binary payload is
    /// never opened.
    pub fn candidate(&self, mode: SearchMode, fragment: &str) -> PathBuf {
        let fragment = fragment.trim_start_matches('/');
        let path = match mode {
            SearchMode::Unknown | SearchMode::Absolute => self.search_root.join(fragment),
            SearchMode::Relative => self.search_root.join(&self.mapping_dir).join(fragment),
        };
        path.with_extension("json")
    }

    /// Resolve `fragment`, switching layouts as described in the module docs.
    pub fn resolve(&mut self, fragment: &str) -> Result<ResolvedDetail, ResolveError> {
        let mut attempted = Vec::with_capacity(2);

        if self.mode != SearchMode::Relative {
            let path = self.candidate(SearchMode::Absolute, fragment);
            debug!("Searching {} in the absolute path", fragment);
            match read_detail(&path) {
                Ok(detail) => {
                    self.mode = SearchMode::Absolute;
                    return Ok(ResolvedDetail {
                        path,
                        mode: SearchMode::Absolute,
                        detail,
                    });
                }
                Err(e) => {
                    info!(
                        "Absolute lookup of {} failed ({}); switching to relative paths",
                        fragment, e
                    );
                    self.mode = SearchMode::Relative;
                    attempted.push(path);
                }
            }
        }

        let path = self.candidate(SearchMode::Relative, fragment);
        debug!("Searching {} in the relative path", fragment);
        match read_detail(&path) {
            Ok(detail) => Ok(ResolvedDetail {
                path,
                mode: SearchMode::Relative,
                detail,
            }),
            Err(source) => {
                attempted.push(path);
                Err(ResolveError {
                    fragment: fragment.to_string(),
                    attempted,
                    source,
                })
            }
        }
    }
}

fn read_detail(path: &Path) -> Result<ItemDetail, DetailError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
