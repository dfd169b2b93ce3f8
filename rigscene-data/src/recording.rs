//! Raw multi-sensor recording with its per-frame annotations.
//!
//! This is the document handed over by the extraction step: one entry per
//! source frame (in document order), each carrying the sensor references
//! (file uri, calibration) and the annotations made on that frame.

use crate::mapping::MAPPING_NAME;
use crate::types::{Rotation, Translation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the sensor carrying the point cloud in every frame.
pub const LIDAR_SENSOR: &str = "lidar";

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Recording parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No supported recording document found in {0}")]
    NotFound(PathBuf),

    #[error("Frame {frame} has no sensor '{sensor}'")]
    MissingSensor { frame: String, sensor: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub frames: IndexMap<String, RecordingFrame>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingFrame {
    pub timestamp: f64,
    pub sensors: IndexMap<String, SensorReference>,
    pub annotations: IndexMap<String, Annotation>,
}

impl RecordingFrame {
    pub fn sensor(&self, frame: &str, name: &str) -> Result<&SensorReference, RecordingError> {
        self.sensors
            .get(name)
            .ok_or_else(|| RecordingError::MissingSensor {
                frame: frame.to_string(),
                sensor: name.to_string(),
            })
    }
}

/// One sensor's capture within a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReference {
    /// File location relative to the recording root (usually with a leading '/').
    pub uri: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub extrinsics: SensorExtrinsics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsics: Option<SensorIntrinsics>,
}

impl SensorReference {
    /// Extension of the referenced file including the dot, or empty.
    pub fn extension(&self) -> String {
        Path::new(&self.uri)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }

    /// Resolve the uri against the directory the recording was extracted to.
    pub fn local_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.uri.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorExtrinsics {
    pub pos: Translation,
    pub quat: Rotation,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorIntrinsics {
    /// Row-major 3x4 projection matrix.
    pub camera_matrix: Vec<f64>,
    /// `[k1, k2, k3, p1, p2]`
    pub distortion: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub uid: String,
    #[serde(rename = "type")]
    pub object_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Geometric payload of an annotation, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Cuboid {
        pos: Translation,
        size: Translation,
        quat: Rotation,
    },
    Poly3d {
        points: Vec<Translation>,
    },
    Seg3d {
        point_ids: Vec<u64>,
    },
    Bbox {
        pos: Point2,
        size: Point2,
    },
    Poly2d {
        points: Vec<Point2>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub uid: String,
    /// Annotation name; for image annotations it embeds the camera name.
    #[serde(default)]
    pub name: String,
    /// Identity of the sensor the annotation was drawn on.
    #[serde(default)]
    pub sensor: String,
    pub object: ObjectRef,
    #[serde(default)]
    pub attributes: IndexMap<String, JsonValue>,
    #[serde(flatten)]
    pub geometry: Geometry,
}

impl Annotation {
    /// Class label shown to annotators, e.g. `road_vehicle` -> `road vehicle`.
    pub fn label(&self) -> String {
        self.object.object_type.replace('_', " ")
    }
}

impl Recording {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RecordingError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let bytes = fs::read(path.as_ref())?;
        let recording = Self::from_slice(&bytes)?;
        debug!("Loaded recording with {} frames", recording.frames.len());
        Ok(recording)
    }

    /// Find the recording document inside an extracted data directory.
    ///
    /// Candidates are the `.json` files of `dir` in name order, minus a
    /// mapping document left by an earlier run; the first one that parses
    /// wins.
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn discover(dir: &Path) -> Result<Self, RecordingError> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| path.file_name().is_none_or(|name| name != MAPPING_NAME))
            .collect();
        candidates.sort();

        for candidate in candidates {
            match Self::from_path(&candidate) {
                Ok(recording) => {
                    info!("Using recording document {}", candidate.display());
                    return Ok(recording);
                }
                Err(e) => warn!("Skipping {}: {}", candidate.display(), e),
            }
        }
        Err(RecordingError::NotFound(dir.to_path_buf()))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "frames": {
            "12": {
                "timestamp": 1.5,
                "sensors": {
                    "lidar": {"uri": "/lidar/000.pcd", "timestamp": 1.5,
                              "extrinsics": {"pos": {"x": 1.0}, "quat": {"w": 1.0}}}
                },
                "annotations": {
                    "a1": {"uid": "a1", "type": "cuboid", "object": {"uid": "o1", "type": "road_vehicle"},
                           "sensor": "lidar",
                           "pos": {"x": 1.0, "y": 2.0, "z": 3.0}, "size": {"x": 4.0, "y": 2.0, "z": 1.5},
                           "quat": {"w": 1.0}, "attributes": {"occlusion": "25 %"}},
                    "a2": {"uid": "a2", "type": "seg3d", "object": {"uid": "o2", "type": "track"},
                           "point_ids": [1, 2, 3]}
                }
            },
            "3": {}
        }
    }"#;

    #[test]
    fn test_parse_keeps_frame_order() {
        let recording = Recording::from_slice(SAMPLE.as_bytes()).unwrap();
        let keys: Vec<&str> = recording.frames.keys().map(String::as_str).collect();
        assert_eq!(keys, ["12", "3"]);
        assert!(recording.frames["3"].sensors.is_empty());
    }

    #[test]
    fn test_parse_geometry_kinds() {
        let recording = Recording::from_slice(SAMPLE.as_bytes()).unwrap();
        let annotations = &recording.frames["12"].annotations;
        assert!(matches!(annotations["a1"].geometry, Geometry::Cuboid { .. }));
        assert_eq!(annotations["a1"].label(), "road vehicle");
        match &annotations["a2"].geometry {
            Geometry::Seg3d { point_ids } => assert_eq!(point_ids, &[1, 2, 3]),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_missing_sensor() {
        let recording = Recording::from_slice(SAMPLE.as_bytes()).unwrap();
        let frame = &recording.frames["3"];
        assert!(matches!(
            frame.sensor("3", LIDAR_SENSOR),
            Err(RecordingError::MissingSensor { .. })
        ));
    }

    #[test]
    fn test_sensor_paths() {
        let sensor = SensorReference {
            uri: "/camera/rgb/0001.png".to_string(),
            ..Default::default()
        };
        assert_eq!(sensor.extension(), ".png");
        assert_eq!(
            sensor.local_path(Path::new("/data")),
            PathBuf::from("/data/camera/rgb/0001.png")
        );
    }

    #[test]
    fn test_discover_skips_unparseable_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_notes.json"), b"[1, 2").unwrap();
        fs::write(dir.path().join("readme.txt"), b"not json").unwrap();
        let mut f = fs::File::create(dir.path().join("b_scene.json")).unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();

        let recording = Recording::discover(dir.path()).unwrap();
        assert_eq!(recording.frame_count(), 2);
    }

    #[test]
    fn test_discover_ignores_mapping_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MAPPING_NAME), br#"{"frames": {"0": {}}}"#).unwrap();
        fs::write(dir.path().join("scene.json"), SAMPLE.as_bytes()).unwrap();
        assert_eq!(Recording::discover(dir.path()).unwrap().frame_count(), 2);
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Recording::discover(dir.path()),
            Err(RecordingError::NotFound(_))
        ));
    }
}
