use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde_json::Value;

use super::{required_token_field, Record, RecordKind, RecordResolver, ResolveError, Token};

/// In-memory resolver over the dataset's JSON tables.
///
/// Besides indexing each table by `token`, loading derives the reverse links
/// the record graph does not store on disk:
///
/// - every `sample` gets `data` (sensor channel to key-frame `sample_data`
///   token) and `anns` (its `sample_annotation` tokens);
/// - every `sample_data` gets `channel` and `sensor_modality` from its sensor;
/// - every `sample_annotation` gets `category_name` from its instance's category.
///
/// Derived entries follow the order of the source tables.
#[derive(Debug, Default)]
pub struct JsonTableStore {
    tables: HashMap<RecordKind, HashMap<Token, Record>>,
    scenes: Vec<Token>,
}

impl JsonTableStore {
    /// Load every table from `<data_root>/<version>/<table>.json`
    pub fn open<P: AsRef<Path>>(data_root: P, version: &str) -> Result<Self, ResolveError> {
        let table_dir = data_root.as_ref().join(version);
        info!("Loading {} tables from {}", version, table_dir.display());

        let mut tables = HashMap::with_capacity(RecordKind::ALL.len());
        for kind in RecordKind::ALL {
            let path = table_dir.join(format!("{}.json", kind.table_name()));
            let records = load_table(&path)?;
            debug!("Loaded {} {} records", records.len(), kind);
            tables.insert(kind, records);
        }

        let store = Self::from_tables(tables)?;
        info!(
            "Loaded {} scenes, {} samples, {} annotations",
            store.len(RecordKind::Scene),
            store.len(RecordKind::Sample),
            store.len(RecordKind::SampleAnnotation)
        );
        Ok(store)
    }

    /// Build a store from already-parsed tables. Missing kinds are empty.
    pub fn from_tables(mut tables: HashMap<RecordKind, Vec<Record>>) -> Result<Self, ResolveError> {
        let mut indexed = HashMap::with_capacity(RecordKind::ALL.len());
        let mut order: HashMap<RecordKind, Vec<Token>> =
            HashMap::with_capacity(RecordKind::ALL.len());

        for kind in RecordKind::ALL {
            let records = tables.remove(&kind).unwrap_or_default();
            let mut by_token = HashMap::with_capacity(records.len());
            let mut tokens = Vec::with_capacity(records.len());
            for record in records {
                let token = required_token_field(kind, &record, "token")?;
                tokens.push(token.clone());
                by_token.insert(token, record);
            }
            indexed.insert(kind, by_token);
            order.insert(kind, tokens);
        }

        let mut store = Self {
            tables: indexed,
            scenes: order.remove(&RecordKind::Scene).unwrap_or_default(),
        };

        if let Some(samples) = store.tables.get_mut(&RecordKind::Sample) {
            for sample in samples.values_mut() {
                sample.insert("data".to_string(), Value::Object(Record::new()));
                sample.insert("anns".to_string(), Value::Array(Vec::new()));
            }
        }

        let sample_data = order.remove(&RecordKind::SampleData).unwrap_or_default();
        store.index_sample_data(&sample_data)?;
        let annotations = order.remove(&RecordKind::SampleAnnotation).unwrap_or_default();
        store.index_annotations(&annotations)?;

        Ok(store)
    }

    /// Number of records of `kind`
    pub fn len(&self, kind: RecordKind) -> usize {
        self.tables.get(&kind).map_or(0, HashMap::len)
    }

    /// Returns true if no scenes were loaded
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    fn record_mut(&mut self, kind: RecordKind, token: &Token) -> Result<&mut Record, ResolveError> {
        self.tables
            .get_mut(&kind)
            .and_then(|table| table.get_mut(token))
            .ok_or_else(|| ResolveError::NotFound {
                kind,
                token: token.to_string(),
            })
    }

    fn index_sample_data(&mut self, tokens: &[Token]) -> Result<(), ResolveError> {
        for token in tokens {
            let record = self.resolve(RecordKind::SampleData, token)?;
            let sample_token =
                required_token_field(RecordKind::SampleData, record, "sample_token")?;
            let calibrated_token =
                required_token_field(RecordKind::SampleData, record, "calibrated_sensor_token")?;
            let key_frame = record
                .get("is_key_frame")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            let calibrated = self.resolve(RecordKind::CalibratedSensor, &calibrated_token)?;
            let sensor_token =
                required_token_field(RecordKind::CalibratedSensor, calibrated, "sensor_token")?;
            let sensor = self.resolve(RecordKind::Sensor, &sensor_token)?;
            let channel = sensor_field(sensor, "channel")?;
            let modality = sensor_field(sensor, "modality")?;
            let channel_name = channel
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ResolveError::InvalidField {
                    kind: RecordKind::Sensor,
                    field: "channel".to_string(),
                    expected: "a string",
                })?;

            let record = self.record_mut(RecordKind::SampleData, token)?;
            record.insert("sensor_modality".to_string(), modality);
            record.insert("channel".to_string(), channel);

            if key_frame {
                let sample = self.record_mut(RecordKind::Sample, &sample_token)?;
                if let Some(Value::Object(data)) = sample.get_mut("data") {
                    data.insert(channel_name, Value::String(token.as_str().to_string()));
                }
            }
        }
        Ok(())
    }

    fn index_annotations(&mut self, tokens: &[Token]) -> Result<(), ResolveError> {
        for token in tokens {
            let record = self.resolve(RecordKind::SampleAnnotation, token)?;
            let sample_token =
                required_token_field(RecordKind::SampleAnnotation, record, "sample_token")?;
            let instance_token =
                required_token_field(RecordKind::SampleAnnotation, record, "instance_token")?;

            let instance = self.resolve(RecordKind::Instance, &instance_token)?;
            let category_token =
                required_token_field(RecordKind::Instance, instance, "category_token")?;
            let category = self.resolve(RecordKind::Category, &category_token)?;
            let category_name = category.get("name").cloned().unwrap_or(Value::Null);

            self.record_mut(RecordKind::SampleAnnotation, token)?
                .insert("category_name".to_string(), category_name);

            let sample = self.record_mut(RecordKind::Sample, &sample_token)?;
            if let Some(Value::Array(anns)) = sample.get_mut("anns") {
                anns.push(Value::String(token.as_str().to_string()));
            }
        }
        Ok(())
    }
}

impl RecordResolver for JsonTableStore {
    fn resolve(&self, kind: RecordKind, token: &Token) -> Result<&Record, ResolveError> {
        self.tables
            .get(&kind)
            .and_then(|table| table.get(token))
            .ok_or_else(|| ResolveError::NotFound {
                kind,
                token: token.to_string(),
            })
    }

    fn scene_tokens(&self) -> Vec<Token> {
        self.scenes.clone()
    }
}

fn sensor_field(sensor: &Record, field: &str) -> Result<Value, ResolveError> {
    sensor.get(field).cloned().ok_or_else(|| ResolveError::MissingField {
        kind: RecordKind::Sensor,
        field: field.to_string(),
    })
}

fn load_table(path: &Path) -> Result<Vec<Record>, ResolveError> {
    let content = fs::read_to_string(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ResolveError::Json {
        path: path.to_path_buf(),
        source,
    })
}
