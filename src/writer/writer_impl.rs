use std::fs;
use std::path::{Path, PathBuf};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use log::debug;
use parquet::arrow::ArrowWriter;
use parquet::format::KeyValue;
use tempfile::NamedTempFile;

use crate::schema::binary_compression;

use super::config::{CompressionType, WriterConfig};
use super::error::WriterError;
use super::stats::WriterStats;
use super::DatasetSink;

/// Subdirectory of the dataset root holding the fragments
pub const DATA_DIR: &str = "data";

/// Footer metadata key: converter version
pub const KEY_CONVERTER_VERSION: &str = "nuscenes-columnar:converter_version";
/// Footer metadata key: index of the fragment within the dataset
pub const KEY_FRAGMENT_INDEX: &str = "nuscenes-columnar:fragment_index";
/// Footer metadata key: time the fragment was written (RFC 3339)
pub const KEY_CREATED_AT: &str = "nuscenes-columnar:created_at";
/// Footer metadata key: version of the source dataset (e.g. `v1.0-mini`)
pub const KEY_DATASET_VERSION: &str = "nuscenes-columnar:dataset_version";

/// Append-mode Parquet dataset.
///
/// The dataset is a directory whose `data/` subdirectory holds one
/// `part-NNNNN.parquet` fragment per appended batch. Opening an existing
/// dataset continues the fragment numbering, so repeated runs append.
pub struct ParquetDatasetWriter {
    data_dir: PathBuf,
    schema: SchemaRef,
    config: WriterConfig,
    binary_columns: Vec<(String, CompressionType)>,
    metadata: Vec<KeyValue>,
    next_fragment: usize,
    stats: WriterStats,
}

impl ParquetDatasetWriter {
    /// Open (or create) the dataset at `root` for appending batches of `schema`.
    ///
    /// Fails if a binary column's compression directive names a codec the
    /// Parquet writer does not support.
    pub fn open<P: AsRef<Path>>(
        root: P,
        schema: SchemaRef,
        config: WriterConfig,
    ) -> Result<Self, WriterError> {
        let data_dir = root.as_ref().join(DATA_DIR);
        fs::create_dir_all(&data_dir)?;

        let binary_columns = schema
            .fields()
            .iter()
            .filter_map(|field| binary_compression(field).map(|d| (field.name().clone(), d)))
            .map(|(name, directive)| -> Result<_, WriterError> {
                Ok((name, CompressionType::from_directive(&directive)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let next_fragment = next_fragment_index(&data_dir)?;
        debug!(
            "Opened dataset {} at fragment {} ({} binary columns)",
            data_dir.display(),
            next_fragment,
            binary_columns.len()
        );

        Ok(Self {
            data_dir,
            schema,
            config,
            binary_columns,
            metadata: vec![KeyValue::new(
                KEY_CONVERTER_VERSION.to_string(),
                env!("CARGO_PKG_VERSION").to_string(),
            )],
            next_fragment,
            stats: WriterStats::default(),
        })
    }

    /// Add a footer metadata entry written into every fragment
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(KeyValue::new(key.into(), value.into()));
        self
    }

    /// Directory holding the fragments
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Statistics so far
    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    fn fragment_metadata(&self, index: usize) -> Vec<KeyValue> {
        let mut metadata = self.metadata.clone();
        metadata.push(KeyValue::new(KEY_FRAGMENT_INDEX.to_string(), index.to_string()));
        metadata.push(KeyValue::new(
            KEY_CREATED_AT.to_string(),
            chrono::Utc::now().to_rfc3339(),
        ));
        metadata
    }
}

impl DatasetSink for ParquetDatasetWriter {
    fn append(&mut self, batch: &RecordBatch) -> Result<(), WriterError> {
        if batch.schema().as_ref() != self.schema.as_ref() {
            return Err(WriterError::SchemaMismatch(format!(
                "batch has {} columns, dataset schema has {}",
                batch.num_columns(),
                self.schema.fields().len()
            )));
        }

        let index = self.next_fragment;
        let path = self.data_dir.join(fragment_file_name(index));
        let props = self
            .config
            .to_writer_properties(&self.binary_columns, self.fragment_metadata(index));

        // Written beside the target and renamed into place, so a failed
        // append never leaves a truncated fragment behind
        let mut tmp = NamedTempFile::new_in(&self.data_dir)?;
        let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), self.schema.clone(), Some(props))?;
        writer.write(batch)?;
        writer.close()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        let bytes = fs::metadata(&path)?.len();
        self.next_fragment += 1;
        self.stats.fragments_written += 1;
        self.stats.rows_written += batch.num_rows();
        self.stats.bytes_written += bytes;

        debug!(
            "Appended {} rows to {} ({} bytes)",
            batch.num_rows(),
            path.display(),
            bytes
        );
        Ok(())
    }

    fn finish(self) -> Result<WriterStats, WriterError> {
        Ok(self.stats)
    }
}

/// File name of fragment `index`
pub fn fragment_file_name(index: usize) -> String {
    format!("part-{:05}.parquet", index)
}

fn parse_fragment_index(name: &str) -> Option<usize> {
    name.strip_prefix("part-")?
        .strip_suffix(".parquet")?
        .parse()
        .ok()
}

fn next_fragment_index(data_dir: &Path) -> Result<usize, WriterError> {
    let mut next = 0;
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if let Some(index) = entry.file_name().to_str().and_then(parse_fragment_index) {
            next = next.max(index + 1);
        }
    }
    Ok(next)
}
