//! Rigscene Data Crate
//!
//! Value types and documents shared by the rigscene pipeline: geometry
//! primitives, the camera coordinate normalizer, the raw multi-sensor
//! recording model, the per-frame mapping document and the canonical scene.
//! This crate does no store or network I/O.

pub mod mapping;
pub mod recording;
pub mod scene;
pub mod transform;
pub mod types;

pub use mapping::{
    CameraGroups, FrameMetadata, MappingDocument, MappingError, MappingFrame, MappingImage,
    build_mapping, image_remote_path, parse_flag, pcd_remote_path,
};
pub use recording::{Recording, RecordingError};
pub use scene::{CalibrationExtra, Camera, CameraCalibration, Frame, ImageEntry, PcdEntry, Scene};
pub use transform::{AngleUnit, TransformError, normalize_camera_pose, rotate};
pub use types::{Distortion, Extrinsic, Intrinsic, Rotation, Translation};
