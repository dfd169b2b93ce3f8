//! Serde model of the mapping document.
//!
//! Every numeric and geometry field is optional on input and falls back to
//! zero, so a partially specified calibration still loads.

use crate::types::{Distortion, Extrinsic, Intrinsic, Rotation, Translation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// File name of the mapping document, locally and in the store.
pub const MAPPING_NAME: &str = "mapping.json";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub frames: IndexMap<String, MappingFrame>,
}

impl MappingDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// Provenance of a frame in the source recording.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameMetadata {
    /// Frame number in the source recording. Kept for reference only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FrameMetadata>,
    /// Point cloud location relative to the search root or mapping directory.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub position: Translation,
    pub heading: Rotation,
    pub images: IndexMap<String, MappingImage>,
}

impl MappingFrame {
    /// Lidar pose exactly as stored; no axis correction is applied.
    pub fn extrinsic(&self) -> Extrinsic {
        Extrinsic::new(self.heading, self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingImage {
    /// Auxiliary calibration information, carried through untouched.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, JsonValue>,
    pub image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub intrinsics: Intrinsic,
    pub extrinsics: Extrinsic,
    pub distortion: Distortion,
}
