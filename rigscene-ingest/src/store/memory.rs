use super::{ItemRef, ItemStore, StoreError};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    item: ItemRef,
    body: Vec<u8>,
    annotations: Vec<JsonValue>,
}

/// Store kept entirely in memory. Used by tests and demos.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, item_id: &str) -> Result<&mut Entry, StoreError> {
        self.entries
            .get_mut(item_id)
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))
    }

    fn entry(&self, item_id: &str) -> Result<&Entry, StoreError> {
        self.entries
            .get(item_id)
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))
    }
}

impl ItemStore for MemoryStore {
    fn upload_bytes(
        &mut self,
        remote_dir: &str,
        remote_name: &str,
        body: &[u8],
        metadata: Option<JsonValue>,
    ) -> Result<ItemRef, StoreError> {
        let item = ItemRef::new(remote_dir, remote_name, metadata)?;
        debug!("Storing {} ({} bytes)", item.filename(), body.len());
        let annotations = self
            .entries
            .remove(&item.id)
            .map(|previous| previous.annotations)
            .unwrap_or_default();
        self.entries.insert(
            item.id.clone(),
            Entry {
                item: item.clone(),
                body: body.to_vec(),
                annotations,
            },
        );
        Ok(item)
    }

    fn item(&self, item_id: &str) -> Result<ItemRef, StoreError> {
        self.entry(item_id).map(|entry| entry.item.clone())
    }

    fn items(&self) -> Vec<ItemRef> {
        self.entries.values().map(|entry| entry.item.clone()).collect()
    }

    fn download(&self, item_id: &str) -> Result<Vec<u8>, StoreError> {
        self.entry(item_id).map(|entry| entry.body.clone())
    }

    fn set_metadata(&mut self, item_id: &str, metadata: JsonValue) -> Result<ItemRef, StoreError> {
        let entry = self.entry_mut(item_id)?;
        entry.item.metadata = metadata;
        Ok(entry.item.clone())
    }

    fn upload_annotations(
        &mut self,
        item_id: &str,
        annotations: Vec<JsonValue>,
    ) -> Result<(), StoreError> {
        self.entry_mut(item_id)?.annotations.extend(annotations);
        Ok(())
    }

    fn clear_annotations(&mut self, item_id: &str) -> Result<(), StoreError> {
        self.entry_mut(item_id)?.annotations.clear();
        Ok(())
    }

    fn annotations(&self, item_id: &str) -> Result<Vec<JsonValue>, StoreError> {
        self.entry(item_id).map(|entry| entry.annotations.clone())
    }
}
