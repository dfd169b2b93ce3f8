//! Projection of image annotations onto the scene's camera images.
//!
//! Box and 2D polyline annotations drawn on a selected camera are collected
//! into one batch per image item. Publishing replaces the annotations of
//! every image with a non-empty batch and leaves all other images alone.

use crate::attributes::AttributeMap;
use crate::builder::source_frames;
use crate::error::AnnotateError;
use crate::records::{AnnotationRecord, BoxCoordinates, Point2Record, SourceIds};
use indexmap::IndexMap;
use rigscene_data::recording::{Annotation, Geometry};
use rigscene_data::{Frame, Recording, Scene};
use rigscene_ingest::{ItemRef, ItemStore};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

/// Picks the cameras whose annotations are projected, by substring of the
/// annotation's sensor name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSelector {
    pub contains: String,
    pub excludes: Vec<String>,
}

impl Default for CameraSelector {
    fn default() -> Self {
        Self::rgb_highres()
    }
}

impl CameraSelector {
    pub fn ir() -> Self {
        Self {
            contains: "ir".to_string(),
            excludes: Vec::new(),
        }
    }

    pub fn rgb() -> Self {
        Self {
            contains: "rgb".to_string(),
            excludes: vec!["rgb_highres".to_string()],
        }
    }

    pub fn rgb_highres() -> Self {
        Self {
            contains: "rgb_highres".to_string(),
            excludes: Vec::new(),
        }
    }

    pub fn matches(&self, sensor: &str) -> bool {
        sensor.contains(&self.contains) && !self.excludes.iter().any(|e| sensor.contains(e.as_str()))
    }
}

/// Image slot of a camera within its own group: center 0, left 1, anything
/// else 2. Only valid when a single camera group was staged.
pub fn image_slot(camera: &str) -> usize {
    if camera.contains("center") {
        0
    } else if camera.contains("left") {
        1
    } else {
        2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectionSummary {
    pub projected: usize,
    /// Annotations whose target image does not exist in the scene.
    pub skipped: usize,
    pub images: usize,
}

pub struct ImageProjector<'a> {
    selector: CameraSelector,
    /// Staged channels in slot order. Empty means a single group.
    channels: Vec<String>,
    attributes: &'a AttributeMap,
    batches: IndexMap<String, Vec<JsonValue>>,
    skipped: usize,
}

impl<'a> ImageProjector<'a> {
    pub fn new(selector: CameraSelector, attributes: &'a AttributeMap) -> Self {
        Self {
            selector,
            channels: Vec::new(),
            attributes,
            batches: IndexMap::new(),
            skipped: 0,
        }
    }

    /// Resolve image slots against the channels the scene was staged with,
    /// in slot order.
    pub fn with_channels(mut self, channels: &[&str]) -> Self {
        self.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn selector(&self) -> &CameraSelector {
        &self.selector
    }

    fn slot(&self, sensor: &str) -> Option<usize> {
        if self.channels.is_empty() {
            return Some(image_slot(sensor));
        }
        self.channels.iter().position(|c| c == sensor)
    }

    /// Pending batch for an image item.
    pub fn batch(&self, image_id: &str) -> Option<&[JsonValue]> {
        self.batches.get(image_id).map(Vec::as_slice)
    }

    /// Collect the image annotations of every scene frame.
    pub fn project(&mut self, recording: &Recording, scene: &Scene) -> Result<(), AnnotateError> {
        for (index, source) in source_frames(scene, recording) {
            let (Some(source), Some(frame)) = (source, scene.frame(index as usize)) else {
                continue;
            };
            for annotation in source.annotations.values() {
                self.project_one(index, frame, annotation)?;
            }
        }
        Ok(())
    }

    fn project_one(
        &mut self,
        index: u32,
        frame: &Frame,
        annotation: &Annotation,
    ) -> Result<(), AnnotateError> {
        if !self.selector.matches(&annotation.sensor) {
            return Ok(());
        }
        let record = match &annotation.geometry {
            Geometry::Bbox { pos, size } => AnnotationRecord::Box2d {
                label: annotation.label(),
                coordinates: BoxCoordinates {
                    left: pos.x - size.x / 2.0,
                    top: pos.y - size.y / 2.0,
                    right: pos.x + size.x / 2.0,
                    bottom: pos.y + size.y / 2.0,
                },
                attributes: self.attributes.translate(&annotation.attributes),
                metadata: source_ids(annotation),
            },
            Geometry::Poly2d { points } => AnnotationRecord::Polyline2d {
                label: annotation.label(),
                coordinates: points.iter().copied().map(Point2Record::from).collect(),
                attributes: self.attributes.translate(&annotation.attributes),
                metadata: source_ids(annotation),
            },
            _ => return Ok(()),
        };

        let Some(slot) = self.slot(&annotation.sensor) else {
            warn!(
                "Camera {} was not staged, skipping {}",
                annotation.sensor, annotation.uid
            );
            self.skipped += 1;
            return Ok(());
        };
        let Some(image) = frame.images.get(slot) else {
            warn!(
                "Frame {} has no image in slot {} for {}",
                index, slot, annotation.uid
            );
            self.skipped += 1;
            return Ok(());
        };
        self.batches
            .entry(image.item_id.clone())
            .or_default()
            .push(record.to_json()?);
        Ok(())
    }

    /// Replace the annotations of every image with a non-empty batch.
    #[tracing::instrument(skip_all)]
    pub fn publish(&mut self, store: &mut dyn ItemStore) -> Result<ProjectionSummary, AnnotateError> {
        let mut summary = ProjectionSummary {
            skipped: self.skipped,
            ..Default::default()
        };
        for (image_id, batch) in self.batches.drain(..) {
            if batch.is_empty() {
                continue;
            }
            summary.projected += batch.len();
            summary.images += 1;
            store.clear_annotations(&image_id)?;
            debug!("Uploading {} annotations to image {}", batch.len(), image_id);
            store.upload_annotations(&image_id, batch)?;
        }
        info!(
            "Projected {} annotations onto {} images ({} skipped)",
            summary.projected, summary.images, summary.skipped
        );
        Ok(summary)
    }

    /// Project against the published scene document `scene_item`.
    #[tracing::instrument(skip_all, fields(scene = %scene_item.filename()))]
    pub fn run(
        mut self,
        recording: &Recording,
        store: &mut dyn ItemStore,
        scene_item: &ItemRef,
    ) -> Result<ProjectionSummary, AnnotateError> {
        let scene = Scene::from_slice(&store.download(&scene_item.id)?)?;
        self.project(recording, &scene)?;
        self.publish(store)
    }
}

fn source_ids(annotation: &Annotation) -> SourceIds {
    SourceIds {
        object_uid: annotation.object.uid.clone(),
        uid: annotation.uid.clone(),
    }
}
