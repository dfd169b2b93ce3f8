//! Serialized annotation records as uploaded to the store.

use indexmap::IndexMap;
use rigscene_data::Translation;
use rigscene_data::recording::Point2;
use serde::Serialize;
use serde_json::Value as JsonValue;

pub type Attributes = IndexMap<String, JsonValue>;

/// Identity of the source annotation an uploaded record came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceIds {
    pub object_uid: String,
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vec3Record {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubeCoordinates {
    pub position: [f64; 3],
    pub scale: [f64; 3],
    /// Extrinsic x-y-z Euler angles in radians.
    pub rotation: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubeFrame {
    pub frame: u32,
    pub coordinates: CubeCoordinates,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSystem {
    pub frame: u32,
    pub end_frame: u32,
    pub frame_number_based: bool,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMetadata {
    pub system: TrackSystem,
    #[serde(flatten)]
    pub source: SourceIds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanSystem {
    pub frame: u32,
    pub end_frame: u32,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanMetadata {
    pub system: SpanSystem,
    #[serde(flatten)]
    pub source: SourceIds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSystem {
    pub frame: u32,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameMetadata {
    pub system: FrameSystem,
    #[serde(flatten)]
    pub source: SourceIds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineCoordinates {
    pub interpolation: &'static str,
    pub line_type: &'static str,
    /// First vertex; `None` for an empty polyline.
    pub position: Option<Vec3Record>,
    pub points: Vec<Vec3Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefCoordinates {
    pub interpolation: &'static str,
    pub mode: &'static str,
    #[serde(rename = "ref")]
    pub reference: String,
    pub ref_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxCoordinates {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point2Record {
    pub x: f64,
    pub y: f64,
}

impl From<Point2> for Point2Record {
    fn from(p: Point2) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Translation> for Vec3Record {
    fn from(t: Translation) -> Self {
        Self {
            x: t.x,
            y: t.y,
            z: t.z,
        }
    }
}

/// Every record kind uploaded by this crate, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AnnotationRecord {
    #[serde(rename = "cube_3d")]
    Cube3d {
        label: String,
        object_id: String,
        metadata: TrackMetadata,
        frames: Vec<CubeFrame>,
    },
    #[serde(rename = "polyline_3d")]
    Polyline3d {
        label: String,
        coordinates: PolylineCoordinates,
        metadata: FrameMetadata,
    },
    #[serde(rename = "ref_semantic_3d")]
    Semantic3dRef {
        label: String,
        coordinates: RefCoordinates,
        metadata: SpanMetadata,
    },
    #[serde(rename = "box")]
    Box2d {
        label: String,
        coordinates: BoxCoordinates,
        attributes: Attributes,
        metadata: SourceIds,
    },
    #[serde(rename = "segment")]
    Polyline2d {
        label: String,
        coordinates: Vec<Point2Record>,
        attributes: Attributes,
        metadata: SourceIds,
    },
}

impl AnnotationRecord {
    pub fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }
}
