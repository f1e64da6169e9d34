//! Miniature record graphs for unit tests.

use std::collections::HashMap;
use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;

use crate::resolver::{JsonTableStore, Record, RecordKind};

pub(crate) const BASE_TIMESTAMP: i64 = 1_532_402_927_647_951;

pub(crate) fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture record must be an object, got {other}"),
    }
}

/// One scene of `samples` key frames with a lidar and a camera reading each,
/// one annotated car per sample, and sensor files on disk.
pub(crate) struct MiniDataset {
    pub dir: TempDir,
    pub tables: HashMap<RecordKind, Vec<Record>>,
}

impl MiniDataset {
    pub fn new(samples: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut tables: HashMap<RecordKind, Vec<Record>> = HashMap::new();
        let mut push = |kind: RecordKind, value: Value| {
            tables.entry(kind).or_default().push(record(value));
        };

        let token = |i: usize| format!("s{i}");
        let link = |i: Option<usize>| i.map(token).unwrap_or_default();

        push(
            RecordKind::Scene,
            json!({
                "token": "scene-0",
                "log_token": "log-0",
                "nbr_samples": samples,
                "first_sample_token": if samples > 0 { token(0) } else { String::new() },
                "last_sample_token": if samples > 0 { token(samples - 1) } else { String::new() },
                "name": "scene-0061",
                "description": "Parked truck, construction"
            }),
        );

        push(
            RecordKind::Sensor,
            json!({"token": "sensor-lidar", "channel": "LIDAR_TOP", "modality": "lidar"}),
        );
        push(
            RecordKind::Sensor,
            json!({"token": "sensor-cam", "channel": "CAM_FRONT", "modality": "camera"}),
        );
        push(
            RecordKind::CalibratedSensor,
            json!({
                "token": "cs-lidar",
                "sensor_token": "sensor-lidar",
                "translation": [0.943713, 0.0, 1.84023],
                "rotation": [0.7077955, -0.0064815, 0.0101671, -0.7063073],
                "camera_intrinsic": []
            }),
        );
        push(
            RecordKind::CalibratedSensor,
            json!({
                "token": "cs-cam",
                "sensor_token": "sensor-cam",
                "translation": [1.70079, 0.0159614, 1.51095],
                "rotation": [0.4998015, -0.5030316, 0.4997798, -0.4973752],
                "camera_intrinsic": [
                    [1266.4172, 0.0, 816.2670],
                    [0.0, 1266.4172, 491.5070],
                    [0.0, 0.0, 1.0]
                ]
            }),
        );
        push(
            RecordKind::Category,
            json!({
                "token": "cat-car",
                "name": "vehicle.car",
                "description": "Vehicle designed primarily for personal use."
            }),
        );
        push(
            RecordKind::Attribute,
            json!({
                "token": "attr-moving",
                "name": "vehicle.moving",
                "description": "Vehicle is moving."
            }),
        );
        push(
            RecordKind::Instance,
            json!({
                "token": "inst-0",
                "category_token": "cat-car",
                "nbr_annotations": samples,
                "first_annotation_token": "ann-0",
                "last_annotation_token": format!("ann-{}", samples.saturating_sub(1))
            }),
        );

        for i in 0..samples {
            let timestamp = BASE_TIMESTAMP + 500_000 * i as i64;
            push(
                RecordKind::Sample,
                json!({
                    "token": token(i),
                    "timestamp": timestamp,
                    "prev": link(i.checked_sub(1)),
                    "next": link(Some(i + 1).filter(|n| *n < samples)),
                    "scene_token": "scene-0"
                }),
            );

            for (sensor, format, size) in [("lidar", "pcd", (0, 0)), ("cam", "jpg", (900, 1600))] {
                let channel = if sensor == "lidar" { "LIDAR_TOP" } else { "CAM_FRONT" };
                let extension = if sensor == "lidar" { "pcd.bin" } else { "jpg" };
                let filename = format!("samples/{channel}/s{i}.{extension}");
                push(
                    RecordKind::SampleData,
                    json!({
                        "token": format!("sd-{i}-{sensor}"),
                        "sample_token": token(i),
                        "ego_pose_token": format!("ep-{i}-{sensor}"),
                        "calibrated_sensor_token": format!("cs-{sensor}"),
                        "timestamp": timestamp,
                        "fileformat": format,
                        "is_key_frame": true,
                        "height": size.0,
                        "width": size.1,
                        "filename": filename,
                        "prev": "",
                        "next": ""
                    }),
                );
                push(
                    RecordKind::EgoPose,
                    json!({
                        "token": format!("ep-{i}-{sensor}"),
                        "timestamp": timestamp,
                        "rotation": [0.5720, -0.0016, 0.0117, -0.8201],
                        "translation": [411.3039, 1180.8903, 0.0]
                    }),
                );

                let path = dir.path().join(&filename);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, vec![i as u8; if sensor == "lidar" { 32 } else { 16 }]).unwrap();
            }

            // Sweep between key frames: indexed but never flattened
            push(
                RecordKind::SampleData,
                json!({
                    "token": format!("sweep-{i}-lidar"),
                    "sample_token": token(i),
                    "ego_pose_token": format!("ep-{i}-lidar"),
                    "calibrated_sensor_token": "cs-lidar",
                    "timestamp": timestamp + 50_000,
                    "fileformat": "pcd",
                    "is_key_frame": false,
                    "height": 0,
                    "width": 0,
                    "filename": format!("sweeps/LIDAR_TOP/s{i}.pcd.bin"),
                    "prev": "",
                    "next": ""
                }),
            );

            push(
                RecordKind::SampleAnnotation,
                json!({
                    "token": format!("ann-{i}"),
                    "sample_token": token(i),
                    "instance_token": "inst-0",
                    "visibility_token": "4",
                    "attribute_tokens": ["attr-moving"],
                    "translation": [373.214, 1130.48, 1.25],
                    "size": [1.961, 4.712, 1.469],
                    "rotation": [0.1658, 0.0, 0.0, 0.9861],
                    "prev": "",
                    "next": "",
                    "num_lidar_pts": 12 + i,
                    "num_radar_pts": 0
                }),
            );
        }

        Self { dir, tables }
    }

    /// Overwrite one field of one record
    pub fn set_field(&mut self, kind: RecordKind, token: &str, field: &str, value: Value) {
        let record = self
            .tables
            .get_mut(&kind)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| r.get("token").and_then(Value::as_str) == Some(token))
            })
            .unwrap_or_else(|| panic!("no {kind} record {token}"));
        record.insert(field.to_string(), value);
    }

    pub fn store(&self) -> JsonTableStore {
        JsonTableStore::from_tables(self.tables.clone()).unwrap()
    }

    /// Write the tables as `<dir>/<version>/<table>.json`
    pub fn write_tables(&self, version: &str) {
        let table_dir = self.dir.path().join(version);
        fs::create_dir_all(&table_dir).unwrap();
        for kind in RecordKind::ALL {
            let records = self.tables.get(&kind).cloned().unwrap_or_default();
            fs::write(
                table_dir.join(format!("{}.json", kind.table_name())),
                serde_json::to_string_pretty(&records).unwrap(),
            )
            .unwrap();
        }
    }
}
