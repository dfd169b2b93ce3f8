use crate::mapping::FrameMetadata;
use crate::types::Extrinsic;
use serde::{Deserialize, Serialize};

/// The point cloud capture of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcdEntry {
    #[serde(rename = "lidar_pcd_id")]
    pub item_id: String,
    /// Ground-detection reference, when the point cloud has one.
    #[serde(rename = "ground_map_id", default)]
    pub ground_id: Option<String>,
    pub remote_path: String,
    #[serde(default)]
    pub extrinsic: Extrinsic,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// One camera image of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    #[serde(rename = "image_id")]
    pub item_id: String,
    pub camera_id: String,
    pub remote_path: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// One synchronized capture: a point cloud and its camera images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FrameMetadata>,
    #[serde(rename = "lidar")]
    pub pcd: PcdEntry,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

impl Frame {
    pub fn new(pcd: PcdEntry, images: Vec<ImageEntry>) -> Self {
        Self {
            metadata: None,
            pcd,
            images,
        }
    }

    pub fn with_metadata(mut self, metadata: FrameMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Source frame number recorded in the metadata, if any.
    pub fn source_frame(&self) -> Option<i64> {
        self.metadata.as_ref().and_then(|m| m.frame)
    }
}
