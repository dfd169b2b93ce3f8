use assert_matches::assert_matches;
use rigscene_annotate::AttributeMap;
use rigscene_app::{ParserConfig, PipelineError, RecordingParser};
use rigscene_data::Scene;
use rigscene_ingest::{AssemblerConfig, CameraIdentity, ItemStore, LocalStore, MemoryStore};
use serde_json::{Value as JsonValue, json};
use std::fs;
use std::path::Path;

const CAMERAS: [&str; 3] = ["rgb_highres_center", "rgb_highres_left", "rgb_highres_right"];

fn camera(uri: String) -> JsonValue {
    json!({
        "uri": uri,
        "timestamp": 0.5,
        "extrinsics": {"pos": {"x": 0.1, "z": 1.5}, "quat": {"w": 1.0}},
        "intrinsics": {
            "camera_matrix": [1000.0, 0.0, 640.0, 0.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            "distortion": [0.01, 0.0, 0.0, 0.0, 0.0]
        }
    })
}

/// Write a two-frame recording with its media files into `dir`.
fn write_recording(dir: &Path) {
    write_recording_with_keys(dir, ["0", "1"]);
}

fn write_recording_with_keys(dir: &Path, keys: [&str; 2]) {
    fs::create_dir_all(dir.join("lidar")).unwrap();
    fs::create_dir_all(dir.join("camera")).unwrap();

    let mut frames = serde_json::Map::new();
    for (frame, key) in keys.into_iter().enumerate() {
        let mut sensors = serde_json::Map::new();
        let pcd = format!("/lidar/{frame:03}.pcd");
        fs::write(dir.join(&pcd[1..]), b"VERSION .7").unwrap();
        sensors.insert(
            "lidar".to_string(),
            json!({"uri": pcd, "extrinsics": {"pos": {"x": frame as f64}, "quat": {"w": 1.0}}}),
        );
        for name in CAMERAS {
            let uri = format!("/camera/{name}_{frame}.png");
            fs::write(dir.join(&uri[1..]), b"PNG").unwrap();
            sensors.insert(name.to_string(), camera(uri));
        }

        frames.insert(
            key.to_string(),
            json!({
                "timestamp": frame as f64,
                "sensors": sensors,
                "annotations": {
                    "c": {"uid": format!("cube-{frame}"), "type": "cuboid", "sensor": "lidar",
                          "object": {"uid": "car-1", "type": "road_vehicle"},
                          "pos": {"x": 5.0 + frame as f64}, "size": {"x": 4.0, "y": 2.0, "z": 1.5},
                          "quat": {"w": 1.0}, "attributes": {"Occlusion": "50 %"}},
                    "s": {"uid": "lane-1", "type": "seg3d", "sensor": "lidar",
                          "object": {"uid": "lane", "type": "lane_marking"},
                          "point_ids": [frame, frame + 10]},
                    "b": {"uid": format!("box-{frame}"), "type": "bbox",
                          "sensor": "rgb_highres_right",
                          "object": {"uid": "car-1", "type": "road_vehicle"},
                          "pos": {"x": 10.0, "y": 10.0}, "size": {"x": 4.0, "y": 2.0}}
                }
            }),
        );
    }
    fs::write(
        dir.join("recording.json"),
        serde_json::to_vec(&json!({ "frames": frames })).unwrap(),
    )
    .unwrap();
}

fn attributes() -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert("Occlusion", "occlusion-key");
    map
}

#[test]
fn converts_recording_end_to_end() {
    let data = tempfile::tempdir().unwrap();
    write_recording(data.path());
    let mut store = MemoryStore::new();

    let config = ParserConfig {
        assembler: AssemblerConfig {
            camera_identity: CameraIdentity::PerSlot,
            fps: 10,
        },
        ..Default::default()
    };
    let scene_item = RecordingParser::new(config, attributes())
        .run(data.path(), &mut store)
        .unwrap();

    assert_eq!(scene_item.filename(), "/frames.json");
    assert_eq!(scene_item.metadata["fps"], 10);
    assert!(store.find("/mapping.json").is_ok());
    assert!(store.find("/frames/1/2.png").is_ok());

    let scene = Scene::from_slice(&store.download(&scene_item.id).unwrap()).unwrap();
    assert_eq!(scene.frame_count(), 2);
    assert_eq!(scene.camera_count(), 3);
    assert_eq!(scene.frame(1).unwrap().pcd.remote_path, "/lidar/1.pcd");
    assert_eq!(scene.frame(1).unwrap().source_frame(), Some(1));

    let annotations = store.annotations(&scene_item.id).unwrap();
    let kinds: Vec<&str> = annotations
        .iter()
        .filter_map(|a| a["type"].as_str())
        .collect();
    assert_eq!(kinds, ["ref_semantic_3d", "cube_3d"]);
    let track = &annotations[1];
    assert_eq!(track["metadata"]["system"]["endFrame"], 1);
    assert_eq!(track["frames"][0]["attributes"]["occlusion-key"], "50%");

    let reference = store.find("/.refs/semantic/lane-1.json").unwrap();
    assert_eq!(annotations[0]["coordinates"]["ref"], reference.id.as_str());

    let right = store.find("/frames/0/2.png").unwrap();
    let boxes = store.annotations(&right.id).unwrap();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0]["coordinates"]["left"], 8.0);
    let center = store.find("/frames/0/0.png").unwrap();
    assert!(store.annotations(&center.id).unwrap().is_empty());
}

#[test]
fn zero_padded_frame_keys_keep_annotations() {
    let data = tempfile::tempdir().unwrap();
    write_recording_with_keys(data.path(), ["007", "008"]);
    let mut store = MemoryStore::new();

    let scene_item = RecordingParser::new(ParserConfig::default(), attributes())
        .run(data.path(), &mut store)
        .unwrap();

    let scene = Scene::from_slice(&store.download(&scene_item.id).unwrap()).unwrap();
    assert_eq!(scene.frame(1).unwrap().source_frame(), Some(8));

    let annotations = store.annotations(&scene_item.id).unwrap();
    let tracks: Vec<&JsonValue> = annotations
        .iter()
        .filter(|a| a["type"] == "cube_3d")
        .collect();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0]["frames"].as_array().unwrap().len(), 2);
    assert_eq!(tracks[0]["metadata"]["system"]["endFrame"], 1);

    let right = store.find("/frames/1/2.png").unwrap();
    assert_eq!(store.annotations(&right.id).unwrap().len(), 1);
}

#[test]
fn rerun_replaces_image_annotations() {
    let data = tempfile::tempdir().unwrap();
    write_recording(data.path());
    let root = tempfile::tempdir().unwrap();

    let parser = RecordingParser::new(ParserConfig::default(), attributes());
    let mut store = LocalStore::open(root.path()).unwrap();
    parser.run(data.path(), &mut store).unwrap();
    // second run picks the recording again, not the mapping left behind
    let scene_item = parser.run(data.path(), &mut store).unwrap();

    let scene = Scene::from_slice(&store.download(&scene_item.id).unwrap()).unwrap();
    assert_eq!(scene.frame_count(), 2);
    let right = store.find("/frames/1/2.png").unwrap();
    assert_eq!(store.annotations(&right.id).unwrap().len(), 1);
}

#[test]
fn missing_camera_fails_before_publishing() {
    let data = tempfile::tempdir().unwrap();
    write_recording(data.path());
    let config = ParserConfig::default().with_group_flags(Some("True"), None, None);

    let mut store = MemoryStore::new();
    let result = RecordingParser::new(config, attributes()).run(data.path(), &mut store);
    assert_matches!(result, Err(PipelineError::Media(_)));
    assert!(store.find("/frames.json").is_err());
}

#[test]
fn empty_data_dir_is_rejected() {
    let data = tempfile::tempdir().unwrap();
    let mut store = MemoryStore::new();
    let result = RecordingParser::new(ParserConfig::default(), AttributeMap::new())
        .run(data.path(), &mut store);
    assert_matches!(result, Err(PipelineError::Recording(_)));
    assert!(store.is_empty());
}
