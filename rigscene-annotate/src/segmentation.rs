//! Per-object 3D segmentation membership.
//!
//! Membership is accumulated per frame and externalized as one reference
//! document per object. The frame span is always derived from the
//! accumulated frame keys.

use crate::records::{AnnotationRecord, Attributes, RefCoordinates, SourceIds, SpanMetadata, SpanSystem};
use indexmap::IndexMap;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;

/// Remote directory holding the reference documents.
pub const REFERENCE_DIR: &str = "/.refs/semantic";

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationRef {
    pub uid: String,
    pub object_uid: String,
    pub label: String,
    pub attributes: Attributes,
    pub frames: BTreeMap<u32, Vec<u64>>,
}

impl SegmentationRef {
    pub fn new(
        uid: impl Into<String>,
        object_uid: impl Into<String>,
        label: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            uid: uid.into(),
            object_uid: object_uid.into(),
            label: label.into(),
            attributes,
            frames: BTreeMap::new(),
        }
    }

    /// Set the member point ids for `frame`, replacing earlier ones.
    pub fn insert(&mut self, frame: u32, point_ids: Vec<u64>) {
        self.frames.insert(frame, point_ids);
    }

    /// `(first, last)` frame with membership, `None` while empty.
    pub fn span(&self) -> Option<(u32, u32)> {
        let first = *self.frames.keys().next()?;
        let last = *self.frames.keys().next_back()?;
        Some((first, last))
    }

    pub fn reference_name(&self) -> String {
        format!("{}.json", self.uid)
    }

    pub fn reference_document(&self) -> JsonValue {
        let frames: serde_json::Map<String, JsonValue> = self
            .frames
            .iter()
            .map(|(frame, ids)| (frame.to_string(), json!(ids)))
            .collect();
        json!({"type": "index", "frames": frames})
    }

    /// The annotation pointing at the stored reference document `reference_id`.
    pub fn to_record(&self, reference_id: &str) -> AnnotationRecord {
        let (frame, end_frame) = self.span().unwrap_or_default();
        AnnotationRecord::Semantic3dRef {
            label: self.label.clone(),
            coordinates: RefCoordinates {
                interpolation: "none",
                mode: "overwrite",
                reference: reference_id.to_string(),
                ref_type: "id",
            },
            metadata: SpanMetadata {
                system: SpanSystem {
                    frame,
                    end_frame,
                    attributes: self.attributes.clone(),
                },
                source: SourceIds {
                    object_uid: self.object_uid.clone(),
                    uid: self.uid.clone(),
                },
            },
        }
    }
}

/// Segmentations keyed by uid, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SegmentationSet {
    refs: IndexMap<String, SegmentationRef>,
}

impl SegmentationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        uid: &str,
        object_uid: &str,
        label: &str,
        attributes: &Attributes,
        frame: u32,
        point_ids: Vec<u64>,
    ) {
        self.refs
            .entry(uid.to_string())
            .or_insert_with(|| SegmentationRef::new(uid, object_uid, label, attributes.clone()))
            .insert(frame, point_ids);
    }

    pub fn get(&self, uid: &str) -> Option<&SegmentationRef> {
        self.refs.get(uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentationRef> {
        self.refs.values()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_covers_all_frame_keys() {
        let mut seg = SegmentationRef::new("s", "o", "lane", Attributes::new());
        assert_eq!(seg.span(), None);
        for frame in [7, 2, 9, 4] {
            seg.insert(frame, vec![frame as u64]);
        }
        let min = *seg.frames.keys().min().unwrap();
        let max = *seg.frames.keys().max().unwrap();
        assert_eq!(seg.span(), Some((min, max)));
        assert_eq!(seg.span(), Some((2, 9)));
    }

    #[test]
    fn test_reference_document() {
        let mut seg = SegmentationRef::new("s1", "o1", "lane", Attributes::new());
        seg.insert(3, vec![10, 11]);
        seg.insert(0, vec![1]);
        assert_eq!(
            seg.reference_document(),
            json!({"type": "index", "frames": {"0": [1], "3": [10, 11]}})
        );
        assert_eq!(seg.reference_name(), "s1.json");
    }

    #[test]
    fn test_set_accumulates_by_uid() {
        let mut set = SegmentationSet::new();
        let attrs = Attributes::new();
        set.add("s1", "o1", "lane", &attrs, 0, vec![1, 2]);
        set.add("s2", "o2", "curb", &attrs, 0, vec![3]);
        set.add("s1", "o1", "lane", &attrs, 4, vec![5]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("s1").unwrap().span(), Some((0, 4)));
        let uids: Vec<&str> = set.iter().map(|s| s.uid.as_str()).collect();
        assert_eq!(uids, ["s1", "s2"]);
    }

    #[test]
    fn test_record_shape() {
        let mut seg = SegmentationRef::new("s1", "o1", "lane", Attributes::new());
        seg.insert(2, vec![1]);
        seg.insert(6, vec![1]);
        let json = seg.to_record("ref-id").to_json().unwrap();
        assert_eq!(json["type"], "ref_semantic_3d");
        assert_eq!(json["coordinates"]["ref"], "ref-id");
        assert_eq!(json["coordinates"]["refType"], "id");
        assert_eq!(json["coordinates"]["mode"], "overwrite");
        assert_eq!(json["metadata"]["system"]["frame"], 2);
        assert_eq!(json["metadata"]["system"]["endFrame"], 6);
        assert_eq!(json["metadata"]["uid"], "s1");
    }
}
