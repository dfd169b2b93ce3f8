use rigscene_ingest::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Object {object_id} ({uid}): frame {frame} arrives after the track already ends at {end_frame}"
    )]
    FrameRegression {
        object_id: u32,
        uid: String,
        frame: u32,
        end_frame: u32,
    },

    #[error("Unsupported attribute dictionary: {0}")]
    InvalidAttributeMap(String),
}
