//! Staging recording media and the mapping document into the store.

use crate::store::{ItemRef, ItemStore, StoreError};
use rigscene_data::recording::LIDAR_SENSOR;
use rigscene_data::{MappingDocument, Recording, RecordingError};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub use rigscene_data::mapping::MAPPING_NAME;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Mapping serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Counts of what [`stage_media`] uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StagedMedia {
    pub point_clouds: usize,
    pub images: usize,
}

/// Upload every frame's point cloud as `/lidar/{i}.pcd` and each enabled
/// camera's image as `/frames/{i}/{slot}{ext}`.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub fn stage_media(
    recording: &Recording,
    data_dir: &Path,
    channels: &[&str],
    store: &mut dyn ItemStore,
) -> Result<StagedMedia, MediaError> {
    let total = recording.frame_count();
    let report_every = (total / 10).max(1);
    let mut staged = StagedMedia::default();

    for (index, (frame_key, frame)) in recording.frames.iter().enumerate() {
        let lidar = frame.sensor(frame_key, LIDAR_SENSOR)?;
        let pcd_path = lidar.local_path(data_dir);
        store.upload_file(&pcd_path, "/lidar", &format!("{index}.pcd"))?;
        debug!("Uploaded {} as /lidar/{}.pcd", pcd_path.display(), index);
        staged.point_clouds += 1;

        for (slot, channel) in channels.iter().enumerate() {
            let sensor = frame.sensor(frame_key, channel)?;
            let image_path = sensor.local_path(data_dir);
            let remote_dir = format!("/frames/{index}");
            let remote_name = format!("{slot}{}", sensor.extension());
            store.upload_file(&image_path, &remote_dir, &remote_name)?;
            debug!(
                "Uploaded {} as {}/{}",
                image_path.display(),
                remote_dir,
                remote_name
            );
            staged.images += 1;
        }

        if index % report_every == 0 {
            info!("Staged {}/{} frames", index + 1, total);
        }
    }

    info!(
        "Staged {} point clouds and {} images",
        staged.point_clouds, staged.images
    );
    Ok(staged)
}

/// Write the mapping document to `data_dir` and upload it to the store root.
#[tracing::instrument(skip_all)]
pub fn upload_mapping(
    mapping: &MappingDocument,
    data_dir: &Path,
    store: &mut dyn ItemStore,
) -> Result<ItemRef, MediaError> {
    let local_path = data_dir.join(MAPPING_NAME);
    std::fs::write(&local_path, mapping.to_pretty_json()?).map_err(StoreError::from)?;
    let item = store.upload_file(&local_path, "/", MAPPING_NAME)?;
    info!("Uploaded mapping document as {}", item.filename());
    Ok(item)
}
