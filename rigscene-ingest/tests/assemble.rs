use assert_matches::assert_matches;
use indexmap::IndexMap;
use rigscene_data::Scene;
use rigscene_ingest::{
    AssembleError, AssemblerConfig, CameraIdentity, ItemRef, ItemStore, MemoryStore,
    SceneAssembler,
};
use serde_json::{Value as JsonValue, json};

/// Upload a mapping document to `dir` whose frames use the given keys, each
/// with one point cloud and one image, plus the referenced media items.
/// Frames are written in the order of `frame_keys`.
fn seed(store: &mut MemoryStore, dir: &str, frame_keys: &[&str]) -> ItemRef {
    let mut frames: IndexMap<String, JsonValue> = IndexMap::new();
    for (i, key) in frame_keys.iter().enumerate() {
        store
            .upload_bytes(&format!("{dir}/lidar"), &format!("{i}.pcd"), b"pcd", None)
            .unwrap();
        store
            .upload_bytes(&format!("{dir}/frames/{i}"), "0.png", b"png", None)
            .unwrap();
        frames.insert(
            key.to_string(),
            json!({
                "metadata": {"frame": 100 + i},
                "path": format!("lidar/{i}.pcd"),
                "timestamp": i as f64,
                "position": {"x": 1.0, "y": 2.0, "z": 3.0},
                "heading": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
                "images": {
                    "0": {
                        "image_path": format!("frames/{i}/0.png"),
                        "timestamp": i as f64 + 0.01,
                        "intrinsics": {"fx": 1000.0, "fy": 1000.0, "cx": 640.0, "cy": 360.0},
                        "extrinsics": {
                            "translation": {"x": 0.1, "y": 0.0, "z": 1.5},
                            "rotation": {"x": -0.5, "y": 0.5, "z": -0.5, "w": 0.5}
                        },
                        "distortion": {"k1": 0.01}
                    }
                }
            }),
        );
    }
    let body = serde_json::to_vec(&IndexMap::from([("frames", frames)])).unwrap();
    store.upload_bytes(dir, "mapping.json", &body, None).unwrap()
}

fn published_scene(store: &MemoryStore, item: &ItemRef) -> Scene {
    Scene::from_slice(&store.download(&item.id).unwrap()).unwrap()
}

#[test]
fn relative_layout_is_used_for_every_lookup_after_first_miss() {
    let mut store = MemoryStore::new();
    let mapping = seed(&mut store, "/scene", &["0", "1"]);
    // A root-level decoy that the absolute layout would find for the second
    // frame's image. It must not be picked up once the resolver switched.
    let decoy = store
        .upload_bytes("/frames/1", "0.png", b"decoy", None)
        .unwrap();

    let assembler = SceneAssembler::new(AssemblerConfig {
        camera_identity: CameraIdentity::PerSlot,
        ..Default::default()
    });
    let published = assembler.run(&mut store, &mapping).unwrap();
    assert_eq!(published.filename(), "/scene/frames.json");

    let scene = published_scene(&store, &published);
    assert_eq!(scene.frame_count(), 2);
    assert_eq!(scene.camera_count(), 1);

    let expected_image = store.find("/scene/frames/1/0.png").unwrap();
    let image = &scene.frame(1).unwrap().images[0];
    assert_eq!(image.item_id, expected_image.id);
    assert_ne!(image.item_id, decoy.id);
    assert_eq!(scene.frame(0).unwrap().pcd.remote_path, "/scene/lidar/0.pcd");
    assert_eq!(scene.frame(1).unwrap().pcd.remote_path, "/scene/lidar/1.pcd");
}

#[test]
fn per_frame_identity_registers_camera_per_frame() {
    let mut store = MemoryStore::new();
    let mapping = seed(&mut store, "/", &["0", "1"]);
    let published = SceneAssembler::default().run(&mut store, &mapping).unwrap();

    let scene = published_scene(&store, &published);
    let ids: Vec<&str> = scene.cameras().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["0_frame_0", "0_frame_1"]);
    assert_eq!(scene.frame(1).unwrap().images[0].camera_id, "0_frame_1");
}

#[test]
fn frame_indices_ignore_source_keys() {
    let mut store = MemoryStore::new();
    let mapping = seed(&mut store, "/", &["17", "a", "3"]);
    let body = String::from_utf8(store.download(&mapping.id).unwrap()).unwrap();
    let positions: Vec<usize> = ["\"17\"", "\"a\"", "\"3\""]
        .iter()
        .map(|key| body.find(key).unwrap())
        .collect();
    assert!(positions.is_sorted());
    let published = SceneAssembler::default().run(&mut store, &mapping).unwrap();

    let scene = published_scene(&store, &published);
    assert_eq!(scene.frame_count(), 3);
    // document order, not numeric order
    let sources: Vec<Option<i64>> = scene.frames().iter().map(|f| f.source_frame()).collect();
    assert_eq!(sources, [Some(100), Some(101), Some(102)]);
    assert_eq!(scene.frame(2).unwrap().pcd.remote_path, "/lidar/2.pcd");
}

#[test]
fn calibration_is_copied_without_correction() {
    let mut store = MemoryStore::new();
    let mapping = seed(&mut store, "/", &["0"]);
    let published = SceneAssembler::default().run(&mut store, &mapping).unwrap();

    let scene = published_scene(&store, &published);
    let camera = scene.camera("0_frame_0").unwrap();
    assert_eq!(camera.calibration.extrinsic.rotation.w, 0.5);
    assert_eq!(camera.calibration.extrinsic.translation.z, 1.5);
    assert_eq!(camera.calibration.intrinsic.cx, 640.0);
    assert_eq!(camera.calibration.distortion.k1, 0.01);
    assert_eq!(camera.channel, "frames/0/0.png");

    let pcd = &scene.frame(0).unwrap().pcd;
    assert_eq!(pcd.extrinsic.translation.y, 2.0);
    assert_eq!(pcd.timestamp, Some(0.0));
}

#[test]
fn ground_reference_is_optional() {
    let mut store = MemoryStore::new();
    let mapping = seed(&mut store, "/", &["0", "1"]);
    let pcd = store.find("/lidar/1.pcd").unwrap();
    store
        .set_metadata(
            &pcd.id,
            json!({"user": {"lidar_ground_detection": {"groundMapId": "ground-1"}}}),
        )
        .unwrap();

    let published = SceneAssembler::default().run(&mut store, &mapping).unwrap();
    let scene = published_scene(&store, &published);
    assert_eq!(scene.frame(0).unwrap().pcd.ground_id, None);
    assert_eq!(scene.frame(1).unwrap().pcd.ground_id.as_deref(), Some("ground-1"));
}

#[test]
fn missing_detail_aborts_without_publishing() {
    let mut store = MemoryStore::new();
    let mapping = seed(&mut store, "/scene", &["0", "1"]);
    let image = store.find("/scene/frames/1/0.png").unwrap();
    let mut survivors = MemoryStore::new();
    for item in store.items() {
        if item.id != image.id {
            let body = store.download(&item.id).unwrap();
            survivors
                .upload_bytes(&item.dir, &item.name, &body, Some(item.metadata.clone()))
                .unwrap();
        }
    }
    let before = survivors.len();

    let result = SceneAssembler::default().run(&mut survivors, &mapping);
    assert_matches!(result, Err(AssembleError::Resolve { ref frame, .. }) if frame == "1");
    assert_eq!(survivors.len(), before);
    assert!(survivors.find("/scene/frames.json").is_err());
}

#[test]
fn scene_document_round_trips() {
    let mut store = MemoryStore::new();
    let mapping = seed(&mut store, "/", &["0", "1"]);
    let published = SceneAssembler::default().run(&mut store, &mapping).unwrap();

    let body = store.download(&published.id).unwrap();
    let scene = Scene::from_slice(&body).unwrap();
    let reparsed = Scene::from_slice(&scene.to_json_bytes().unwrap()).unwrap();
    assert_eq!(reparsed, scene);
}
