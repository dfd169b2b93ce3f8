//! Canonical scene data model.
//!
//! A [`Scene`] owns its frames (index order) and a registry of distinct
//! cameras keyed by id. It is filled frame by frame during assembly and then
//! written once as the canonical scene document.

mod camera;
mod frame;

pub use camera::{Camera, CameraCalibration, CalibrationExtra};
pub use frame::{Frame, ImageEntry, PcdEntry};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SceneKind {
    #[default]
    LidarScene,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(rename = "type", default)]
    kind: SceneKind,
    #[serde(with = "camera_list", default)]
    cameras: IndexMap<String, Camera>,
    #[serde(default)]
    frames: Vec<Frame>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a camera. Returns false (and keeps the existing entry) when
    /// the id is already known.
    pub fn add_camera(&mut self, camera: Camera) -> bool {
        if self.cameras.contains_key(&camera.id) {
            return false;
        }
        self.cameras.insert(camera.id.clone(), camera);
        true
    }

    /// Append a frame and return its index.
    pub fn add_frame(&mut self, frame: Frame) -> usize {
        self.frames.push(frame);
        self.frames.len() - 1
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn cameras(&self) -> impl Iterator<Item = &Camera> {
        self.cameras.values()
    }

    pub fn camera(&self, id: &str) -> Option<&Camera> {
        self.cameras.get(id)
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    /// Serialize to the canonical scene document.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Cameras are written as an ordered list and re-keyed by id when read.
mod camera_list {
    use super::Camera;
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        cameras: &IndexMap<String, Camera>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(cameras.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<String, Camera>, D::Error> {
        let cameras = Vec::<Camera>::deserialize(deserializer)?;
        Ok(cameras
            .into_iter()
            .map(|camera| (camera.id.clone(), camera))
            .collect())
    }
}
