//! The full conversion of an extracted recording into an annotated scene.

use crate::config::ParserConfig;
use rigscene_annotate::{
    AnnotateError, AnnotationTrackBuilder, AttributeMap, ImageProjector, publish_annotations,
};
use rigscene_data::{MappingError, Recording, RecordingError, Scene, build_mapping};
use rigscene_ingest::{
    AssembleError, ItemRef, ItemStore, MediaError, SceneAssembler, StoreError, stage_media,
    upload_mapping,
};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    #[error("Media staging failed: {0}")]
    Media(#[from] MediaError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Scene assembly failed: {0}")]
    Assemble(#[from] AssembleError),

    #[error("Annotation failed: {0}")]
    Annotate(#[from] AnnotateError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scene document error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct RecordingParser {
    config: ParserConfig,
    attributes: AttributeMap,
}

impl RecordingParser {
    pub fn new(config: ParserConfig, attributes: AttributeMap) -> Self {
        Self { config, attributes }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Stage media, publish the mapping and the scene, then annotate the
    /// scene and its images. Each stage completes before the next starts
    /// and the first failure ends the run.
    #[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub fn run(&self, data_dir: &Path, store: &mut dyn ItemStore) -> Result<ItemRef, PipelineError> {
        let recording = Recording::discover(data_dir)?;
        let channels = self.config.cameras.channels();
        info!(
            "Converting {} frames with cameras {:?}",
            recording.frame_count(),
            channels
        );

        stage_media(&recording, data_dir, &channels, store)?;
        let mapping = build_mapping(&recording, &channels)?;
        let mapping_item = upload_mapping(&mapping, data_dir, store)?;

        let assembler = SceneAssembler::new(self.config.assembler.clone());
        let scene_item = assembler.run(store, &mapping_item)?;
        let scene = Scene::from_slice(&store.download(&scene_item.id)?)?;

        let outputs = AnnotationTrackBuilder::from_scene(&self.attributes, &scene, &recording)?;
        publish_annotations(&outputs, &scene_item, store)?;

        let mut projector = ImageProjector::new(self.config.projection.clone(), &self.attributes)
            .with_channels(&channels);
        projector.project(&recording, &scene)?;
        let summary = projector.publish(store)?;
        info!(
            "Finished {}: {} tracks, {} image annotations",
            scene_item.filename(),
            outputs.tracks.len(),
            summary.projected
        );
        Ok(scene_item)
    }
}
