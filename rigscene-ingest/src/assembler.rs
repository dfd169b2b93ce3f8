//! Scene assembly.
//!
//! Walks a mapping document frame by frame, resolves every point cloud and
//! image to its stored item, builds the [`Scene`] and publishes it as a
//! single document. Any resolution failure aborts the run before anything
//! is published.

use crate::resolver::{MappingResolver, ResolveError};
use crate::scratch::ScratchDir;
use crate::store::{DETAILS_DIR, ItemRef, ItemStore, StoreError};
use rigscene_data::{
    CalibrationExtra, Camera, CameraCalibration, Frame, ImageEntry, MappingDocument, PcdEntry,
    Scene,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

/// Remote name of the published scene document.
pub const SCENE_NAME: &str = "frames.json";

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Expected a JSON mapping item, got '{mimetype}' ({filename})")]
    UnsupportedInput { filename: String, mimetype: String },

    #[error("Frame {frame}: {source}")]
    Resolve {
        frame: String,
        #[source]
        source: ResolveError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scratch space error: {0}")]
    Scratch(#[from] std::io::Error),
}

/// How camera ids are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraIdentity {
    /// `{slot}_frame_{frame}`: one camera per frame and image slot.
    #[default]
    PerFrame,
    /// `{slot}`: one camera per image slot, first calibration wins.
    PerSlot,
}

impl CameraIdentity {
    pub fn camera_id(self, frame_key: &str, image_key: &str) -> String {
        match self {
            CameraIdentity::PerFrame => format!("{image_key}_frame_{frame_key}"),
            CameraIdentity::PerSlot => image_key.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub camera_identity: CameraIdentity,
    /// Playback rate written into the scene item's metadata.
    pub fps: u32,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            camera_identity: CameraIdentity::PerFrame,
            fps: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneAssembler {
    config: AssemblerConfig,
}

impl SceneAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Build the scene for `mapping`, resolving detail documents through
    /// `resolver`. Frames keep the document's key order and are indexed
    /// from zero.
    #[tracing::instrument(skip_all, fields(frames = mapping.frames.len()))]
    pub fn assemble(
        &self,
        mapping: &MappingDocument,
        resolver: &mut MappingResolver,
    ) -> Result<Scene, AssembleError> {
        let mut scene = Scene::new();

        for (frame_key, frame) in &mapping.frames {
            let pcd = resolver
                .resolve(&frame.path)
                .map_err(|source| AssembleError::Resolve {
                    frame: frame_key.clone(),
                    source,
                })?;
            let pcd_entry = PcdEntry {
                ground_id: pcd.detail.ground_reference(),
                item_id: pcd.detail.id,
                remote_path: pcd.detail.filename,
                extrinsic: frame.extrinsic(),
                timestamp: frame.timestamp,
            };

            let mut images = Vec::with_capacity(frame.images.len());
            for (image_key, image) in &frame.images {
                let resolved =
                    resolver
                        .resolve(&image.image_path)
                        .map_err(|source| AssembleError::Resolve {
                            frame: frame_key.clone(),
                            source,
                        })?;

                let camera_id = self.config.camera_identity.camera_id(frame_key, image_key);
                let extras = image
                    .metadata
                    .iter()
                    .map(|(key, value)| (key.clone(), CalibrationExtra::Json(value.clone())))
                    .collect();
                let camera = Camera::new(
                    camera_id.clone(),
                    image.image_path.clone(),
                    CameraCalibration {
                        intrinsic: image.intrinsics,
                        extrinsic: image.extrinsics,
                        distortion: image.distortion,
                    },
                )
                .with_extras(extras);
                if scene.add_camera(camera) {
                    debug!("Registered camera {}", camera_id);
                }

                images.push(ImageEntry {
                    item_id: resolved.detail.id,
                    camera_id,
                    remote_path: resolved.detail.filename,
                    timestamp: image.timestamp,
                });
            }

            let mut assembled = Frame::new(pcd_entry, images);
            if let Some(metadata) = &frame.metadata {
                assembled = assembled.with_metadata(metadata.clone());
            }
            let index = scene.add_frame(assembled);
            debug!("Assembled frame {} as index {}", frame_key, index);
        }

        info!(
            "Assembled scene: {} frames, {} cameras ({:?} layout)",
            scene.frame_count(),
            scene.camera_count(),
            resolver.mode()
        );
        Ok(scene)
    }

    /// Publish `scene` as the scene document in `remote_dir`.
    ///
    /// The document is fully serialized before the single store write.
    pub fn publish(
        &self,
        scene: &Scene,
        store: &mut dyn ItemStore,
        remote_dir: &str,
    ) -> Result<ItemRef, AssembleError> {
        let body = scene.to_json_bytes()?;
        let metadata = json!({
            "system": {"shebang": {"dltype": "PCDFrames"}},
            "fps": self.config.fps,
        });
        let item = store.upload_bytes(remote_dir, SCENE_NAME, &body, Some(metadata))?;
        info!("Published scene document {} ({})", item.filename(), item.id);
        Ok(item)
    }

    /// Full run for a stored mapping item: export detail documents to a
    /// scratch directory, assemble, publish. The scratch directory is
    /// removed on every exit path.
    #[tracing::instrument(skip_all, fields(mapping = %mapping_item.filename()))]
    pub fn run(
        &self,
        store: &mut dyn ItemStore,
        mapping_item: &ItemRef,
    ) -> Result<ItemRef, AssembleError> {
        if !mapping_item.is_json() {
            return Err(AssembleError::UnsupportedInput {
                filename: mapping_item.filename(),
                mimetype: mapping_item.mimetype.clone(),
            });
        }

        let mapping = MappingDocument::from_slice(&store.download(&mapping_item.id)?)?;
        let scratch = ScratchDir::create("rigscene-")?;
        store.export_details(scratch.path())?;

        let mut resolver = MappingResolver::new(scratch.join(DETAILS_DIR), &mapping_item.dir);
        let scene = self.assemble(&mapping, &mut resolver)?;
        let published = self.publish(&scene, store, &mapping_item.dir)?;
        scratch.close()?;
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_camera_ids() {
        assert_eq!(CameraIdentity::PerFrame.camera_id("3", "1"), "1_frame_3");
        assert_eq!(CameraIdentity::PerSlot.camera_id("3", "1"), "1");
    }

    #[test]
    fn test_non_json_mapping_is_rejected() {
        let mut store = MemoryStore::new();
        let item = store.upload_bytes("/", "mapping.zip", b"PK", None).unwrap();
        let result = SceneAssembler::default().run(&mut store, &item);
        assert!(matches!(result, Err(AssembleError::UnsupportedInput { .. })));
        // nothing was published
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_publish_metadata() {
        let mut store = MemoryStore::new();
        let assembler = SceneAssembler::new(AssemblerConfig {
            fps: 5,
            ..Default::default()
        });
        let item = assembler.publish(&Scene::new(), &mut store, "/scene").unwrap();
        assert_eq!(item.filename(), "/scene/frames.json");
        assert_eq!(item.metadata["system"]["shebang"]["dltype"], "PCDFrames");
        assert_eq!(item.metadata["fps"], 5);
    }
}
