use crate::types::{Distortion, Extrinsic, Intrinsic};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A calibrated camera registered in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    /// Channel label; the image path the camera was first seen with.
    #[serde(rename = "name")]
    pub channel: String,
    #[serde(rename = "sensorsData")]
    pub calibration: CameraCalibration,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extras: IndexMap<String, CalibrationExtra>,
}

impl Camera {
    pub fn new(id: impl Into<String>, channel: impl Into<String>, calibration: CameraCalibration) -> Self {
        Self {
            id: id.into(),
            channel: channel.into(),
            calibration,
            extras: IndexMap::new(),
        }
    }

    pub fn with_extras(mut self, extras: IndexMap<String, CalibrationExtra>) -> Self {
        self.extras = extras;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraCalibration {
    #[serde(rename = "intrinsicData", default)]
    pub intrinsic: Intrinsic,
    #[serde(default)]
    pub extrinsic: Extrinsic,
    #[serde(default)]
    pub distortion: Distortion,
}

/// Auxiliary calibration information attached to a camera.
///
/// JSON values are written as-is. `Opaque` marks a value that has no JSON
/// form (only its type name is kept) and is written as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationExtra {
    Json(JsonValue),
    Opaque(String),
}

impl Serialize for CalibrationExtra {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CalibrationExtra::Json(value) => value.serialize(serializer),
            CalibrationExtra::Opaque(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CalibrationExtra {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(CalibrationExtra::Json)
    }
}

impl From<JsonValue> for CalibrationExtra {
    fn from(value: JsonValue) -> Self {
        CalibrationExtra::Json(value)
    }
}
