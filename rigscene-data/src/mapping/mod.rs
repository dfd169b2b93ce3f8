//! The per-frame mapping document.
//!
//! A mapping document lists, for every frame, the point cloud path, the lidar
//! pose and the enabled camera images with their (already normalized)
//! calibration. It is produced from a [`Recording`](crate::Recording) by
//! [`build_mapping`] and consumed by the scene assembler.

mod builder;
mod cameras;
mod document;

pub use builder::{MappingError, build_mapping, image_remote_path, pcd_remote_path};
pub use cameras::{CameraGroups, parse_flag};
pub use document::{FrameMetadata, MAPPING_NAME, MappingDocument, MappingFrame, MappingImage};
