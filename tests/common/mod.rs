//! On-disk miniature nuScenes dataset for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

pub const VERSION: &str = "v1.0-test";

const TABLES: [&str; 10] = [
    "scene",
    "sample",
    "sample_data",
    "ego_pose",
    "calibrated_sensor",
    "sensor",
    "sample_annotation",
    "instance",
    "category",
    "attribute",
];

/// Sensor channels of the fixture: (channel, modality, file extension, bytes)
const SENSORS: [(&str, &str, &str, usize); 3] = [
    ("LIDAR_TOP", "lidar", "pcd.bin", 64),
    ("RADAR_FRONT", "radar", "pcd", 24),
    ("CAM_FRONT", "camera", "jpg", 40),
];

/// Dataset with `scenes` scenes of `samples_per_scene` samples each
pub struct Fixture {
    pub root: TempDir,
    tables: Vec<(&'static str, Vec<Value>)>,
}

impl Fixture {
    pub fn new(scenes: usize, samples_per_scene: usize) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut fixture = Self {
            root,
            tables: TABLES.iter().map(|t| (*t, Vec::new())).collect(),
        };

        for (channel, modality, _, _) in SENSORS {
            fixture.push(
                "sensor",
                json!({
                    "token": format!("sensor-{channel}"),
                    "channel": channel,
                    "modality": modality
                }),
            );
            fixture.push(
                "calibrated_sensor",
                json!({
                    "token": format!("cs-{channel}"),
                    "sensor_token": format!("sensor-{channel}"),
                    "translation": [1.0, 0.0, 1.5],
                    "rotation": [0.5, -0.5, 0.5, -0.5],
                    "camera_intrinsic": []
                }),
            );
        }
        fixture.push(
            "category",
            json!({
                "token": "cat-ped",
                "name": "human.pedestrian.adult",
                "description": "Adult subcategory."
            }),
        );
        fixture.push(
            "attribute",
            json!({
                "token": "attr-standing",
                "name": "pedestrian.standing",
                "description": "The human is standing."
            }),
        );
        fixture.push(
            "instance",
            json!({
                "token": "inst-ped",
                "category_token": "cat-ped",
                "nbr_annotations": scenes * samples_per_scene,
                "first_annotation_token": "",
                "last_annotation_token": ""
            }),
        );

        for scene in 0..scenes {
            let sample_token = |i: usize| format!("scene{scene}-s{i}");
            let first_sample = if samples_per_scene > 0 {
                sample_token(0)
            } else {
                String::new()
            };
            fixture.push(
                "scene",
                json!({
                    "token": format!("scene-{scene}"),
                    "log_token": "log-0",
                    "nbr_samples": samples_per_scene,
                    "first_sample_token": first_sample,
                    "last_sample_token": "",
                    "name": format!("scene-{:04}", scene + 1),
                    "description": "Night, rain"
                }),
            );

            for i in 0..samples_per_scene {
                let token = sample_token(i);
                let timestamp = 1_533_151_603_547_590_i64 + (scene * 100 + i) as i64 * 500_000;
                let next = if i + 1 < samples_per_scene {
                    sample_token(i + 1)
                } else {
                    String::new()
                };
                fixture.push(
                    "sample",
                    json!({
                        "token": token,
                        "timestamp": timestamp,
                        "prev": "",
                        "next": next,
                        "scene_token": format!("scene-{scene}")
                    }),
                );

                for (channel, _, extension, size) in SENSORS {
                    let data_token = format!("{token}-{channel}");
                    let filename = format!("samples/{channel}/{token}.{extension}");
                    fixture.push(
                        "sample_data",
                        json!({
                            "token": data_token,
                            "sample_token": token,
                            "ego_pose_token": format!("ep-{data_token}"),
                            "calibrated_sensor_token": format!("cs-{channel}"),
                            "timestamp": timestamp,
                            "fileformat": extension,
                            "is_key_frame": true,
                            "height": 0,
                            "width": 0,
                            "filename": filename,
                            "prev": "",
                            "next": ""
                        }),
                    );
                    fixture.push(
                        "ego_pose",
                        json!({
                            "token": format!("ep-{data_token}"),
                            "timestamp": timestamp,
                            "rotation": [1.0, 0.0, 0.0, 0.0],
                            "translation": [600.1, 1647.5, 0.0]
                        }),
                    );
                    fixture.write_file(&filename, &vec![(i % 251) as u8; size]);
                }

                fixture.push(
                    "sample_annotation",
                    json!({
                        "token": format!("{token}-ann"),
                        "sample_token": token,
                        "instance_token": "inst-ped",
                        "visibility_token": "3",
                        "attribute_tokens": ["attr-standing"],
                        "translation": [637.1, 1636.4, 1.1],
                        "size": [0.6, 0.7, 1.8],
                        "rotation": [0.9, 0.0, 0.0, 0.4],
                        "prev": "",
                        "next": "",
                        "num_lidar_pts": 4,
                        "num_radar_pts": 0
                    }),
                );
            }
        }

        fixture.write_tables();
        fixture
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn output(&self) -> PathBuf {
        self.root.path().join("columnar")
    }

    pub fn sensor_file(&self, token: &str, channel: &str) -> PathBuf {
        let extension = SENSORS
            .iter()
            .find(|(c, ..)| *c == channel)
            .map(|(_, _, ext, _)| *ext)
            .unwrap();
        self.path().join(format!("samples/{channel}/{token}.{extension}"))
    }

    /// Overwrite one field of one record and rewrite the tables
    pub fn set_field(&mut self, table: &str, token: &str, field: &str, value: Value) {
        let record = self
            .records_mut(table)
            .iter_mut()
            .find(|r| r["token"] == token)
            .unwrap();
        record[field] = value;
        self.write_tables();
    }

    /// Remove a record and rewrite the tables
    pub fn remove(&mut self, table: &str, token: &str) {
        self.records_mut(table).retain(|r| r["token"] != token);
        self.write_tables();
    }

    /// Drop every record of a table and rewrite the tables
    pub fn clear(&mut self, table: &str) {
        self.records_mut(table).clear();
        self.write_tables();
    }

    fn push(&mut self, table: &str, value: Value) {
        self.records_mut(table).push(value);
    }

    fn records_mut(&mut self, table: &str) -> &mut Vec<Value> {
        self.tables
            .iter_mut()
            .find(|(name, _)| *name == table)
            .map(|(_, records)| records)
            .unwrap()
    }

    fn write_file(&self, relative: &str, bytes: &[u8]) {
        let path = self.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn write_tables(&self) {
        let dir = self.path().join(VERSION);
        fs::create_dir_all(&dir).unwrap();
        for (name, records) in &self.tables {
            fs::write(
                dir.join(format!("{name}.json")),
                serde_json::to_vec(records).unwrap(),
            )
            .unwrap();
        }
    }
}
