//! Item store seam.
//!
//! The store owns every uploaded file and document and the annotations
//! attached to them. Writes overwrite by logical path (`dir` + `name`): the
//! item id is derived from that path, so re-uploading replaces the item in
//! place. No locking happens at this layer.

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Directory, inside an export destination, holding the detail documents.
pub const DETAILS_DIR: &str = "json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Invalid item name: {0:?}")]
    InvalidName(String),
}

/// A stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
    /// Remote directory, always absolute (`/`, `/lidar`, ...).
    pub dir: String,
    pub name: String,
    pub mimetype: String,
    #[serde(default)]
    pub metadata: JsonValue,
}

impl ItemRef {
    pub fn new(dir: &str, name: &str, metadata: Option<JsonValue>) -> Result<Self, StoreError> {
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let dir = normalize_dir(dir);
        let filename = join_remote(&dir, name);
        Ok(Self {
            id: item_id(&filename),
            mimetype: mimetype_for(name).to_string(),
            dir,
            name: name.to_string(),
            metadata: metadata.unwrap_or_else(|| json!({})),
        })
    }

    /// Full remote path, e.g. `/lidar/0.pcd`.
    pub fn filename(&self) -> String {
        join_remote(&self.dir, &self.name)
    }

    pub fn is_json(&self) -> bool {
        self.mimetype.contains("json")
    }

    /// Where this item's detail document lands under an export's `json/` dir.
    pub fn detail_path(&self) -> PathBuf {
        Path::new(self.dir.trim_start_matches('/'))
            .join(&self.name)
            .with_extension("json")
    }

    /// The per-item detail document written by [`ItemStore::export_details`].
    pub fn detail_document(&self) -> JsonValue {
        json!({
            "id": self.id,
            "filename": self.filename(),
            "name": self.name,
            "dir": self.dir,
            "metadata": self.metadata,
        })
    }
}

/// Storage backend for items, documents and annotations.
pub trait ItemStore {
    /// Store `body` at `remote_dir/remote_name`, replacing any existing item.
    fn upload_bytes(
        &mut self,
        remote_dir: &str,
        remote_name: &str,
        body: &[u8],
        metadata: Option<JsonValue>,
    ) -> Result<ItemRef, StoreError>;

    /// Store a local file. The default reads it into memory.
    fn upload_file(
        &mut self,
        local_path: &Path,
        remote_dir: &str,
        remote_name: &str,
    ) -> Result<ItemRef, StoreError> {
        let body = fs::read(local_path)?;
        self.upload_bytes(remote_dir, remote_name, &body, None)
    }

    fn item(&self, item_id: &str) -> Result<ItemRef, StoreError>;

    fn items(&self) -> Vec<ItemRef>;

    fn download(&self, item_id: &str) -> Result<Vec<u8>, StoreError>;

    /// Replace an item's metadata.
    fn set_metadata(&mut self, item_id: &str, metadata: JsonValue) -> Result<ItemRef, StoreError>;

    /// Append annotations to an item.
    fn upload_annotations(
        &mut self,
        item_id: &str,
        annotations: Vec<JsonValue>,
    ) -> Result<(), StoreError>;

    fn clear_annotations(&mut self, item_id: &str) -> Result<(), StoreError>;

    fn annotations(&self, item_id: &str) -> Result<Vec<JsonValue>, StoreError>;

    /// Look an item up by its full remote path.
    fn find(&self, filename: &str) -> Result<ItemRef, StoreError> {
        let id = item_id(filename);
        self.item(&id)
            .map_err(|_| StoreError::NotFound(filename.to_string()))
    }

    /// Write one detail document per item under `dest/json/`.
    /// Returns the number of documents written.
    fn export_details(&self, dest: &Path) -> Result<usize, StoreError> {
        let root = dest.join(DETAILS_DIR);
        let items = self.items();
        for item in &items {
            let path = root.join(item.detail_path());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_json::to_vec(&item.detail_document())?)?;
        }
        debug!("Exported {} detail documents to {}", items.len(), root.display());
        Ok(items.len())
    }
}

/// Deterministic item id for a full remote path.
pub fn item_id(filename: &str) -> String {
    let digest = Sha256::digest(filename.as_bytes());
    format!("{digest:x}")[..24].to_string()
}

/// SHA-256 hex digest of a document body.
pub fn content_digest(body: &[u8]) -> String {
    format!("{:x}", Sha256::digest(body))
}

fn normalize_dir(dir: &str) -> String {
    let trimmed = dir.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn join_remote(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn mimetype_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => "application/json",
        "pcd" => "application/pcd",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_paths() {
        let item = ItemRef::new("lidar/", "0.pcd", None).unwrap();
        assert_eq!(item.dir, "/lidar");
        assert_eq!(item.filename(), "/lidar/0.pcd");
        assert_eq!(item.detail_path(), PathBuf::from("lidar/0.json"));
        assert_eq!(item.mimetype, "application/pcd");

        let root = ItemRef::new("", "mapping.json", None).unwrap();
        assert_eq!(root.filename(), "/mapping.json");
        assert_eq!(root.detail_path(), PathBuf::from("mapping.json"));
        assert!(root.is_json());
    }

    #[test]
    fn test_id_depends_only_on_path() {
        let a = ItemRef::new("/frames/0", "1.png", None).unwrap();
        let b = ItemRef::new("frames/0/", "1.png", Some(json!({"x": 1}))).unwrap();
        let c = ItemRef::new("/frames/1", "1.png", None).unwrap();
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 24);
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            ItemRef::new("/", "", None),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            ItemRef::new("/", "a/b.json", None),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn test_content_digest() {
        assert_eq!(
            content_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
