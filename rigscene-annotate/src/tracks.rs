//! Cuboid tracks and the uid → object id table.
//!
//! Both tables live for one builder run only. Object ids are handed out
//! sequentially from zero in the order uids are first seen, and a track's
//! index in [`TrackSet`] equals its object id.

use crate::error::AnnotateError;
use crate::records::{
    AnnotationRecord, Attributes, CubeCoordinates, CubeFrame, SourceIds, TrackMetadata,
    TrackSystem,
};
use glam::EulerRot;
use rigscene_data::{Rotation, Translation};
use std::collections::HashMap;
use tracing::{debug, warn};

pub type ObjectId = u32;

#[derive(Debug, Clone, Default)]
pub struct ObjectIdRegistry {
    ids: HashMap<String, ObjectId>,
    uids: Vec<String>,
}

impl ObjectIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: &str) -> Option<ObjectId> {
        self.ids.get(uid).copied()
    }

    /// Returns the id for `uid` and whether it was assigned by this call.
    pub fn get_or_assign(&mut self, uid: &str) -> (ObjectId, bool) {
        if let Some(id) = self.get(uid) {
            return (id, false);
        }
        let id = self.uids.len() as ObjectId;
        self.ids.insert(uid.to_string(), id);
        self.uids.push(uid.to_string());
        (id, true)
    }

    pub fn uid(&self, id: ObjectId) -> Option<&str> {
        self.uids.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}

/// One frame's pose of a tracked cuboid.
#[derive(Debug, Clone, PartialEq)]
pub struct CuboidSample {
    pub frame: u32,
    pub position: [f64; 3],
    pub scale: [f64; 3],
    /// Extrinsic x-y-z Euler angles in radians.
    pub rotation: [f64; 3],
    pub attributes: Attributes,
}

impl CuboidSample {
    pub fn new(
        frame: u32,
        position: Translation,
        size: Translation,
        quat: Rotation,
        attributes: Attributes,
    ) -> Self {
        Self {
            frame,
            position: position.to_array(),
            scale: size.to_array(),
            rotation: euler_xyz(quat),
            attributes,
        }
    }
}

/// Extrinsic x-y-z Euler angles of `quat`. A zero quaternion carries no
/// orientation and maps to zero angles.
pub fn euler_xyz(quat: Rotation) -> [f64; 3] {
    if quat.norm() == 0.0 {
        warn!("Zero cuboid quaternion, using identity orientation");
        return [0.0; 3];
    }
    let (z, y, x) = quat.to_dquat().normalize().to_euler(EulerRot::ZYX);
    [x, y, z]
}

#[derive(Debug, Clone, PartialEq)]
pub struct CuboidTrack {
    pub object_id: ObjectId,
    pub object_uid: String,
    /// uid of the annotation that opened the track.
    pub uid: String,
    pub label: String,
    pub start_frame: u32,
    pub end_frame: u32,
    pub samples: Vec<CuboidSample>,
}

impl CuboidTrack {
    pub fn new(
        object_id: ObjectId,
        object_uid: impl Into<String>,
        uid: impl Into<String>,
        label: impl Into<String>,
        first: CuboidSample,
    ) -> Self {
        Self {
            object_id,
            object_uid: object_uid.into(),
            uid: uid.into(),
            label: label.into(),
            start_frame: first.frame,
            end_frame: first.frame,
            samples: vec![first],
        }
    }

    /// Append a sample. Samples must arrive in non-decreasing frame order; a
    /// second sample for the last frame replaces the first, so a track holds
    /// at most one sample per frame.
    pub fn append(&mut self, sample: CuboidSample) -> Result<(), AnnotateError> {
        if sample.frame < self.end_frame {
            return Err(AnnotateError::FrameRegression {
                object_id: self.object_id,
                uid: self.object_uid.clone(),
                frame: sample.frame,
                end_frame: self.end_frame,
            });
        }
        if let Some(last) = self.samples.last_mut().filter(|last| last.frame == sample.frame) {
            warn!(
                "Object {} has two cuboids in frame {}, keeping the later one",
                self.object_uid, sample.frame
            );
            *last = sample;
            return Ok(());
        }
        self.end_frame = sample.frame;
        self.samples.push(sample);
        Ok(())
    }

    /// Attributes of the first sample, used at track level.
    pub fn attributes(&self) -> Attributes {
        self.samples
            .first()
            .map(|s| s.attributes.clone())
            .unwrap_or_default()
    }

    pub fn to_record(&self) -> AnnotationRecord {
        AnnotationRecord::Cube3d {
            label: self.label.clone(),
            object_id: self.object_id.to_string(),
            metadata: TrackMetadata {
                system: TrackSystem {
                    frame: self.start_frame,
                    end_frame: self.end_frame,
                    frame_number_based: true,
                    attributes: self.attributes(),
                },
                source: SourceIds {
                    object_uid: self.object_uid.clone(),
                    uid: self.uid.clone(),
                },
            },
            frames: self
                .samples
                .iter()
                .map(|s| CubeFrame {
                    frame: s.frame,
                    coordinates: CubeCoordinates {
                        position: s.position,
                        scale: s.scale,
                        rotation: s.rotation,
                    },
                    attributes: s.attributes.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    registry: ObjectIdRegistry,
    tracks: Vec<CuboidTrack>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a cuboid sample to the track of `object_uid`, opening a new
    /// track on first sight.
    pub fn record(
        &mut self,
        object_uid: &str,
        uid: &str,
        label: &str,
        sample: CuboidSample,
    ) -> Result<ObjectId, AnnotateError> {
        let (id, is_new) = self.registry.get_or_assign(object_uid);
        if is_new {
            debug!("New track {} for object {}", id, object_uid);
            self.tracks
                .push(CuboidTrack::new(id, object_uid, uid, label, sample));
        } else {
            self.tracks[id as usize].append(sample)?;
        }
        Ok(id)
    }

    pub fn registry(&self) -> &ObjectIdRegistry {
        &self.registry
    }

    pub fn get(&self, id: ObjectId) -> Option<&CuboidTrack> {
        self.tracks.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CuboidTrack> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn into_tracks(self) -> Vec<CuboidTrack> {
        self.tracks
    }
}
