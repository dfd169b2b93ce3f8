use super::{ItemRef, ItemStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const INDEX_FILE: &str = "index.json";
const ITEMS_DIR: &str = "items";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    item: ItemRef,
    #[serde(default)]
    annotations: Vec<JsonValue>,
}

/// Store backed by a directory.
///
/// Bodies live under `<root>/items/<remote path>`; item records and
/// annotations live in `<root>/index.json`. Every file is written to a
/// temporary sibling and renamed into place.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    index: BTreeMap<String, IndexEntry>,
}

impl LocalStore {
    /// Open (or create) a store rooted at `root`.
    #[tracing::instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ITEMS_DIR))?;
        let index_path = root.join(INDEX_FILE);
        let index = if index_path.exists() {
            serde_json::from_slice(&fs::read(&index_path)?)?
        } else {
            BTreeMap::new()
        };
        info!("Opened store with {} items", index.len());
        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn body_path(&self, item: &ItemRef) -> PathBuf {
        self.root
            .join(ITEMS_DIR)
            .join(item.filename().trim_start_matches('/'))
    }

    fn save_index(&self) -> Result<(), StoreError> {
        write_atomic(&self.root.join(INDEX_FILE), &serde_json::to_vec_pretty(&self.index)?)
    }

    fn entry(&self, item_id: &str) -> Result<&IndexEntry, StoreError> {
        self.index
            .get(item_id)
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))
    }

    fn entry_mut(&mut self, item_id: &str) -> Result<&mut IndexEntry, StoreError> {
        self.index
            .get_mut(item_id)
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))
    }

    fn record(&mut self, item: ItemRef) -> Result<ItemRef, StoreError> {
        let annotations = self
            .index
            .remove(&item.id)
            .map(|previous| previous.annotations)
            .unwrap_or_default();
        self.index.insert(
            item.id.clone(),
            IndexEntry {
                item: item.clone(),
                annotations,
            },
        );
        self.save_index()?;
        Ok(item)
    }
}

impl ItemStore for LocalStore {
    fn upload_bytes(
        &mut self,
        remote_dir: &str,
        remote_name: &str,
        body: &[u8],
        metadata: Option<JsonValue>,
    ) -> Result<ItemRef, StoreError> {
        let item = ItemRef::new(remote_dir, remote_name, metadata)?;
        write_atomic(&self.body_path(&item), body)?;
        debug!("Stored {} ({} bytes)", item.filename(), body.len());
        self.record(item)
    }

    fn upload_file(
        &mut self,
        local_path: &Path,
        remote_dir: &str,
        remote_name: &str,
    ) -> Result<ItemRef, StoreError> {
        let item = ItemRef::new(remote_dir, remote_name, None)?;
        let target = self.body_path(&item);
        let parent = parent_dir(&target)?;
        fs::create_dir_all(parent)?;
        let staged = NamedTempFile::new_in(parent)?;
        fs::copy(local_path, staged.path())?;
        staged.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        debug!("Copied {} to {}", local_path.display(), item.filename());
        self.record(item)
    }

    fn item(&self, item_id: &str) -> Result<ItemRef, StoreError> {
        self.entry(item_id).map(|entry| entry.item.clone())
    }

    fn items(&self) -> Vec<ItemRef> {
        self.index.values().map(|entry| entry.item.clone()).collect()
    }

    fn download(&self, item_id: &str) -> Result<Vec<u8>, StoreError> {
        let item = &self.entry(item_id)?.item;
        Ok(fs::read(self.body_path(item))?)
    }

    fn set_metadata(&mut self, item_id: &str, metadata: JsonValue) -> Result<ItemRef, StoreError> {
        let entry = self.entry_mut(item_id)?;
        entry.item.metadata = metadata;
        let item = entry.item.clone();
        self.save_index()?;
        Ok(item)
    }

    fn upload_annotations(
        &mut self,
        item_id: &str,
        annotations: Vec<JsonValue>,
    ) -> Result<(), StoreError> {
        self.entry_mut(item_id)?.annotations.extend(annotations);
        self.save_index()
    }

    fn clear_annotations(&mut self, item_id: &str) -> Result<(), StoreError> {
        self.entry_mut(item_id)?.annotations.clear();
        self.save_index()
    }

    fn annotations(&self, item_id: &str) -> Result<Vec<JsonValue>, StoreError> {
        self.entry(item_id).map(|entry| entry.annotations.clone())
    }
}

fn parent_dir(path: &Path) -> Result<&Path, StoreError> {
    path.parent()
        .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))
}

/// Write `bytes` to `path` through a temporary file in the same directory.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = parent_dir(path)?;
    fs::create_dir_all(parent)?;
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(bytes)?;
    staged.flush()?;
    staged.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
