//! Scene assembly example
//!
//! Writes a small synthetic recording (a car driving past the rig) to a
//! temporary directory, converts it and prints what ended up in the store.
//!
//! Usage:
//!   cargo run --example assemble_scene -- [store_dir]

use rigscene::annotate::AttributeMap;
use rigscene::app::{LoggingConfig, init_logging};
use rigscene::data::Scene;
use rigscene::ingest::{ItemStore, LocalStore, MemoryStore};
use rigscene::{ParserConfig, RecordingParser};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const FRAMES: usize = 5;
const CAMERAS: [&str; 3] = ["rgb_highres_center", "rgb_highres_left", "rgb_highres_right"];

fn write_recording(dir: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir.join("lidar"))?;
    fs::create_dir_all(dir.join("camera"))?;

    let mut frames = serde_json::Map::new();
    for frame in 0..FRAMES {
        let t = frame as f64 * 0.1;
        let mut sensors = serde_json::Map::new();

        let pcd = format!("lidar/{frame:04}.pcd");
        fs::write(dir.join(&pcd), b"VERSION .7\nPOINTS 0\n")?;
        sensors.insert(
            "lidar".into(),
            json!({"uri": format!("/{pcd}"), "timestamp": t,
                   "extrinsics": {"pos": {"z": 1.8}, "quat": {"w": 1.0}}}),
        );

        for (slot, name) in CAMERAS.iter().enumerate() {
            let image = format!("camera/{name}_{frame:04}.jpg");
            fs::write(dir.join(&image), b"\xff\xd8\xff")?;
            let yaw = (slot as f64 - 1.0) * 0.6;
            sensors.insert(
                name.to_string(),
                json!({
                    "uri": format!("/{image}"),
                    "timestamp": t + 0.005,
                    "extrinsics": {"pos": {"x": 0.2, "z": 1.6},
                                   "quat": {"z": (yaw / 2.0).sin(), "w": (yaw / 2.0).cos()}},
                    "intrinsics": {
                        "camera_matrix": [1400.0, 0.0, 960.0, 0.0, 0.0, 1400.0, 540.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                        "distortion": [-0.05, 0.01, 0.0, 0.0, 0.0]
                    }
                }),
            );
        }

        frames.insert(
            (100 + frame).to_string(),
            json!({
                "timestamp": t,
                "sensors": sensors,
                "annotations": {
                    "car": {"uid": format!("car-{frame}"), "type": "cuboid", "sensor": "lidar",
                            "object": {"uid": "car", "type": "road_vehicle"},
                            "pos": {"x": 12.0 - 2.0 * frame as f64, "y": 3.5, "z": 0.8},
                            "size": {"x": 4.5, "y": 1.9, "z": 1.6}, "quat": {"w": 1.0},
                            "attributes": {"occlusion": "0 %", "carrying": "false"}},
                    "box": {"uid": format!("box-{frame}"), "type": "bbox",
                            "sensor": "rgb_highres_center",
                            "object": {"uid": "car", "type": "road_vehicle"},
                            "pos": {"x": 900.0 + 40.0 * frame as f64, "y": 560.0},
                            "size": {"x": 180.0, "y": 90.0}}
                }
            }),
        );
    }

    fs::write(
        dir.join("recording.json"),
        serde_json::to_vec_pretty(&json!({ "frames": frames }))?,
    )?;
    Ok(())
}

fn report(store: &dyn ItemStore, scene_id: &str) -> Result<(), Box<dyn Error>> {
    let scene = Scene::from_slice(&store.download(scene_id)?)?;
    info!(
        "Scene has {} frames and {} cameras",
        scene.frame_count(),
        scene.camera_count()
    );
    for annotation in store.annotations(scene_id)? {
        info!(
            "  {} '{}' frames {}..={}",
            annotation["type"],
            annotation["label"],
            annotation["metadata"]["system"]["frame"],
            annotation["metadata"]["system"]["endFrame"]
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging(&LoggingConfig::default());

    let data = tempfile::tempdir()?;
    write_recording(data.path())?;
    info!("Wrote synthetic recording to {}", data.path().display());

    let parser = RecordingParser::new(ParserConfig::default(), AttributeMap::new());

    match std::env::args().nth(1).map(PathBuf::from) {
        Some(root) => {
            let mut store = LocalStore::open(&root)?;
            let scene = parser.run(data.path(), &mut store)?;
            report(&store, &scene.id)?;
            info!("Store written to {}", root.display());
        }
        None => {
            let mut store = MemoryStore::new();
            let scene = parser.run(data.path(), &mut store)?;
            report(&store, &scene.id)?;
            info!("{} items in memory", store.len());
        }
    }
    Ok(())
}
