//! Rigscene Annotate Crate
//!
//! Converts the per-frame annotations of a recording into annotations on a
//! published scene:
//!
//! - [`builder`]: cuboid tracks with stable object ids, standalone 3D
//!   polylines and segmentation references, published against the scene item
//! - [`projector`]: 2D boxes and polylines attached to the camera images
//! - [`attributes`]: translation of attribute titles through the label schema

pub mod attributes;
pub mod builder;
pub mod projector;
pub mod records;
pub mod segmentation;
pub mod tracks;

mod error;

pub use attributes::AttributeMap;
pub use builder::{AnnotationOutputs, AnnotationTrackBuilder, PublishedAnnotations, publish_annotations};
pub use error::AnnotateError;
pub use projector::{CameraSelector, ImageProjector, ProjectionSummary, image_slot};
pub use segmentation::{SegmentationRef, SegmentationSet};
pub use tracks::{CuboidSample, CuboidTrack, ObjectId, ObjectIdRegistry, TrackSet};
