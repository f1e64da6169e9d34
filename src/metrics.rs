//! Dataset statistics gathered during a conversion pass.
//!
//! Counters are additive and start at zero on first touch. The flattener
//! updates file counters as it reads sensor files; the pipeline counts scenes
//! and samples.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Scenes traversed
pub const SCENE: &str = "scene";
/// Samples flattened
pub const SAMPLE: &str = "sample";
/// Sensor files read
pub const FILE_COUNT: &str = "filecount";
/// Bytes of sensor files read
pub const FILE_SIZE: &str = "filesize";

/// Named additive counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
}

impl Metrics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the counter `key`
    pub fn add(&mut self, key: &str, delta: u64) {
        match self.counters.get_mut(key) {
            Some(value) => *value += delta,
            None => {
                self.counters.insert(key.to_string(), delta);
            }
        }
    }

    /// Add every counter of `other` into this collector
    pub fn merge(&mut self, other: &Metrics) {
        for (key, value) in other.iter() {
            self.add(key, value);
        }
    }

    /// Current value of `key` (zero if never touched)
    pub fn get(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Record one sensor file read of `len` bytes.
    ///
    /// Point clouds (`.pcd`, `.pcd.bin`) and images (`.jpg`) also feed the
    /// `filecount-<ext>` / `filesize-<ext>` pair for their extension.
    pub fn record_file(&mut self, path: &Path, len: u64) {
        self.add(FILE_COUNT, 1);
        self.add(FILE_SIZE, len);
        if let Some(ext) = recognized_extension(path) {
            self.add(&format!("{}-{}", FILE_COUNT, ext), 1);
            self.add(&format!("{}-{}", FILE_SIZE, ext), len);
        }
    }

    /// Counters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns true if no counter was ever touched
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

fn recognized_extension(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".pcd") || name.ends_with(".pcd.bin") {
        Some("pcd")
    } else if name.ends_with(".jpg") {
        Some("jpg")
    } else {
        None
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics:")?;
        for (key, value) in self.iter() {
            writeln!(f, "  {}: {}", key, value)?;
        }
        Ok(())
    }
}
