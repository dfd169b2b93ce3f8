//! Derive a mapping document from a recording.

use super::document::{FrameMetadata, MappingDocument, MappingFrame, MappingImage};
use crate::recording::{LIDAR_SENSOR, Recording, RecordingError};
use crate::transform::{TransformError, normalize_camera_pose};
use crate::types::{Distortion, Extrinsic, Intrinsic};
use indexmap::IndexMap;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("Camera '{sensor}' in frame {frame}: {source}")]
    Transform {
        frame: String,
        sensor: String,
        #[source]
        source: TransformError,
    },
}

/// Remote path of the point cloud staged for frame `index`.
pub fn pcd_remote_path(index: usize) -> String {
    format!("lidar/{index}.pcd")
}

/// Remote path of the image staged for frame `index`, camera slot `slot`.
pub fn image_remote_path(index: usize, slot: usize, extension: &str) -> String {
    format!("frames/{index}/{slot}{extension}")
}

/// Build the mapping document for `channels` (in slot order).
///
/// Frames are re-keyed by their position in the recording. Camera poses are
/// normalized into the scene convention; the lidar pose is copied as-is.
#[tracing::instrument(skip_all, fields(frames = recording.frame_count()))]
pub fn build_mapping(
    recording: &Recording,
    channels: &[&str],
) -> Result<MappingDocument, MappingError> {
    let mut frames = IndexMap::with_capacity(recording.frame_count());

    for (index, (frame_key, frame)) in recording.frames.iter().enumerate() {
        let lidar = frame.sensor(frame_key, LIDAR_SENSOR)?;
        let source_frame = frame_key.parse::<i64>().ok();
        if source_frame.is_none() {
            warn!("Frame key '{}' is not numeric", frame_key);
        }

        let mut images = IndexMap::with_capacity(channels.len());
        for (slot, channel) in channels.iter().enumerate() {
            let sensor = frame.sensor(frame_key, channel)?;
            let (translation, rotation) =
                normalize_camera_pose(sensor.extrinsics.quat, sensor.extrinsics.pos).map_err(
                    |source| MappingError::Transform {
                        frame: frame_key.clone(),
                        sensor: channel.to_string(),
                        source,
                    },
                )?;
            let intrinsics = sensor.intrinsics.clone().unwrap_or_default();

            let mut metadata = IndexMap::new();
            if let Some(number) = source_frame {
                metadata.insert("frame".to_string(), json!(number));
            }
            metadata.insert("image_uri".to_string(), json!(sensor.uri));

            images.insert(
                slot.to_string(),
                MappingImage {
                    metadata,
                    image_path: image_remote_path(index, slot, &sensor.extension()),
                    timestamp: Some(sensor.timestamp),
                    intrinsics: Intrinsic::from_projection_matrix(&intrinsics.camera_matrix),
                    extrinsics: Extrinsic::new(rotation, translation),
                    distortion: Distortion::from_coefficients(&intrinsics.distortion),
                },
            );
        }

        debug!("Mapped frame {} -> {} ({} images)", frame_key, index, images.len());
        frames.insert(
            index.to_string(),
            MappingFrame {
                metadata: Some(FrameMetadata {
                    frame: source_frame,
                    sensor_uri: Some(lidar.uri.clone()),
                }),
                path: pcd_remote_path(index),
                timestamp: Some(frame.timestamp),
                position: lidar.extrinsics.pos,
                heading: lidar.extrinsics.quat,
                images,
            },
        );
    }

    info!("Built mapping for {} frames", frames.len());
    Ok(MappingDocument { frames })
}
