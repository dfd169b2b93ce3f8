//! Rigscene
//!
//! Converts multi-sensor rig recordings (lidar plus calibrated cameras) into
//! a canonical lidar scene document with cuboid tracks, segmentation
//! references and per-image 2D annotations.
//!
//! The work is split across the workspace crates, re-exported here:
//!
//! - [`data`]: geometry, coordinate normalization, recording and scene models
//! - [`ingest`]: item store, media staging, mapping resolution, scene assembly
//! - [`annotate`]: tracks, segmentations and image projection
//! - [`app`]: configuration and the end-to-end recording parser

pub use rigscene_annotate as annotate;
pub use rigscene_app as app;
pub use rigscene_data as data;
pub use rigscene_ingest as ingest;

pub use rigscene_app::{ParserConfig, RecordingParser};
