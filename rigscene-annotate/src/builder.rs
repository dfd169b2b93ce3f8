//! Building and publishing the 3D annotations of a scene.
//!
//! Annotations are consumed frame by frame in scene order. Cuboids are
//! grouped into tracks by object uid, 3D polylines stay per frame, and
//! segmentations accumulate per uid until they are externalized as
//! reference documents.

use crate::attributes::AttributeMap;
use crate::error::AnnotateError;
use crate::records::{
    AnnotationRecord, FrameMetadata, FrameSystem, PolylineCoordinates, SourceIds, Vec3Record,
};
use crate::segmentation::{REFERENCE_DIR, SegmentationSet};
use crate::tracks::{CuboidSample, CuboidTrack, TrackSet};
use rigscene_data::recording::{Annotation, Geometry, RecordingFrame};
use rigscene_data::{Recording, Scene};
use rigscene_ingest::store::content_digest;
use rigscene_ingest::{ItemRef, ItemStore};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

/// Everything one builder run produced, ready for publication.
#[derive(Debug, Clone, Default)]
pub struct AnnotationOutputs {
    pub tracks: Vec<CuboidTrack>,
    pub polylines: Vec<AnnotationRecord>,
    pub segmentations: SegmentationSet,
}

impl AnnotationOutputs {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.polylines.is_empty() && self.segmentations.is_empty()
    }
}

pub struct AnnotationTrackBuilder<'a> {
    attributes: &'a AttributeMap,
    tracks: TrackSet,
    polylines: Vec<AnnotationRecord>,
    segmentations: SegmentationSet,
    last_frame: Option<u32>,
}

impl<'a> AnnotationTrackBuilder<'a> {
    pub fn new(attributes: &'a AttributeMap) -> Self {
        Self {
            attributes,
            tracks: TrackSet::new(),
            polylines: Vec::new(),
            segmentations: SegmentationSet::new(),
            last_frame: None,
        }
    }

    /// Build from a recording whose frame order is the scene frame order.
    pub fn from_recording(
        attributes: &'a AttributeMap,
        recording: &Recording,
    ) -> Result<AnnotationOutputs, AnnotateError> {
        let mut builder = Self::new(attributes);
        for (index, frame) in recording.frames.values().enumerate() {
            builder.push_frame(index as u32, frame.annotations.values())?;
        }
        Ok(builder.finish())
    }

    /// Build for the frames of `scene`. Scene frame `i` takes its annotations
    /// from recording frame `i`.
    pub fn from_scene(
        attributes: &'a AttributeMap,
        scene: &Scene,
        recording: &Recording,
    ) -> Result<AnnotationOutputs, AnnotateError> {
        let mut builder = Self::new(attributes);
        for (index, source) in source_frames(scene, recording) {
            if let Some(RecordingFrame { annotations, .. }) = source {
                builder.push_frame(index, annotations.values())?;
            }
        }
        Ok(builder.finish())
    }

    /// Consume the annotations of scene frame `frame`. Frames must be pushed
    /// in non-decreasing order.
    pub fn push_frame<'b>(
        &mut self,
        frame: u32,
        annotations: impl IntoIterator<Item = &'b Annotation>,
    ) -> Result<(), AnnotateError> {
        match self.last_frame {
            Some(last) if frame < last => warn!("Frame {} pushed after frame {}", frame, last),
            _ => {}
        }
        self.last_frame = Some(frame);

        for annotation in annotations {
            self.push(frame, annotation)?;
        }
        Ok(())
    }

    fn push(&mut self, frame: u32, annotation: &Annotation) -> Result<(), AnnotateError> {
        let attributes = self.attributes.translate(&annotation.attributes);
        let label = annotation.label();
        let object_uid = &annotation.object.uid;

        match &annotation.geometry {
            Geometry::Cuboid { pos, size, quat } => {
                let sample = CuboidSample::new(frame, *pos, *size, *quat, attributes);
                self.tracks
                    .record(object_uid, &annotation.uid, &label, sample)?;
            }
            Geometry::Poly3d { points } => {
                let mut vertices = points.iter().copied().map(Vec3Record::from);
                let position = vertices.next();
                self.polylines.push(AnnotationRecord::Polyline3d {
                    label,
                    coordinates: PolylineCoordinates {
                        interpolation: "Linear",
                        line_type: "linear",
                        position,
                        points: vertices.collect(),
                    },
                    metadata: FrameMetadata {
                        system: FrameSystem { frame, attributes },
                        source: SourceIds {
                            object_uid: object_uid.clone(),
                            uid: annotation.uid.clone(),
                        },
                    },
                });
            }
            Geometry::Seg3d { point_ids } => {
                self.segmentations.add(
                    &annotation.uid,
                    object_uid,
                    &label,
                    &attributes,
                    frame,
                    point_ids.clone(),
                );
            }
            Geometry::Bbox { .. } | Geometry::Poly2d { .. } => {
                debug!("Skipping image annotation {}", annotation.uid);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> AnnotationOutputs {
        info!(
            "Built {} tracks, {} polylines, {} segmentations",
            self.tracks.len(),
            self.polylines.len(),
            self.segmentations.len()
        );
        AnnotationOutputs {
            tracks: self.tracks.into_tracks(),
            polylines: self.polylines,
            segmentations: self.segmentations,
        }
    }
}

/// Pair every scene frame index with the recording frame it came from.
/// Scene frames are built from the recording frames in document order, so
/// frame `i` of the scene is frame `i` of the recording whatever its key.
pub(crate) fn source_frames<'r>(
    scene: &Scene,
    recording: &'r Recording,
) -> Vec<(u32, Option<&'r RecordingFrame>)> {
    scene
        .frames()
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let source = recording.frames.get_index(index);
            match (source, frame.source_frame()) {
                (None, _) => warn!("No recording frame for scene frame {}", index),
                (Some((key, _)), Some(number)) if key.parse::<i64>().ok() != Some(number) => {
                    debug!(
                        "Scene frame {} names source frame {} but pairs with '{}'",
                        index, number, key
                    )
                }
                _ => {}
            }
            (index as u32, source.map(|(_, f)| f))
        })
        .collect()
}

/// What [`publish_annotations`] wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedAnnotations {
    /// Stored segmentation reference documents, in segmentation order.
    pub references: Vec<ItemRef>,
    pub annotations: usize,
}

/// Externalize every segmentation reference, then attach the combined batch
/// (polylines, segmentation references, tracks) to the scene item in one
/// upload.
#[tracing::instrument(skip_all, fields(scene = %scene_item.filename()))]
pub fn publish_annotations(
    outputs: &AnnotationOutputs,
    scene_item: &ItemRef,
    store: &mut dyn ItemStore,
) -> Result<PublishedAnnotations, AnnotateError> {
    let mut published = PublishedAnnotations::default();
    let mut batch: Vec<JsonValue> = Vec::new();
    for polyline in &outputs.polylines {
        batch.push(polyline.to_json()?);
    }

    for segmentation in outputs.segmentations.iter() {
        let body = serde_json::to_vec(&segmentation.reference_document())?;
        let metadata = json!({"digest": content_digest(&body)});
        let reference = store.upload_bytes(
            REFERENCE_DIR,
            &segmentation.reference_name(),
            &body,
            Some(metadata),
        )?;
        debug!("Stored segmentation {} as {}", segmentation.uid, reference.id);
        batch.push(segmentation.to_record(&reference.id).to_json()?);
        published.references.push(reference);
    }

    for track in &outputs.tracks {
        batch.push(track.to_record().to_json()?);
    }

    published.annotations = batch.len();
    if !batch.is_empty() {
        store.upload_annotations(&scene_item.id, batch)?;
    }
    info!(
        "Published {} annotations and {} segmentation references",
        published.annotations,
        published.references.len()
    );
    Ok(published)
}
