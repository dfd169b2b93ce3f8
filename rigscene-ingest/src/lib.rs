//! Rigscene Ingest Crate
//!
//! Turns a recording into a published scene document:
//!
//! - [`store`]: the item store seam (trait, in-memory and directory stores)
//! - [`media`]: staging point clouds and images into the store
//! - [`resolver`]: locating per-item detail documents under two path layouts
//! - [`assembler`]: building and publishing the canonical [`Scene`](rigscene_data::Scene)
//! - [`scratch`]: run-scoped scratch directories

pub mod assembler;
pub mod media;
pub mod resolver;
pub mod scratch;
pub mod store;

pub use assembler::{AssembleError, AssemblerConfig, CameraIdentity, SceneAssembler};
pub use media::{MediaError, StagedMedia, stage_media, upload_mapping};
pub use resolver::{ItemDetail, MappingResolver, ResolveError, ResolvedDetail, SearchMode};
pub use scratch::ScratchDir;
pub use store::{ItemRef, ItemStore, LocalStore, MemoryStore, StoreError};
