//! # nuscenes-columnar
//!
//! Converts a nuScenes-style driving dataset into a columnar dataset with one
//! row per sample.
//!
//! The source is a graph of JSON tables linked by opaque tokens: scenes point
//! at their first sample, samples form a `next` chain and reference one
//! reading per sensor channel plus their annotations. Each sample is
//! denormalized into a single wide row that carries every sensor's metadata,
//! ego pose, calibration and the raw bytes of the sensor file, together with
//! a nested list of annotations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nuscenes_columnar::config::ConvertConfig;
//! use nuscenes_columnar::pipeline::Converter;
//! use nuscenes_columnar::resolver::JsonTableStore;
//!
//! let store = JsonTableStore::open("/data/sets/nuscenes", "v1.0-mini")?;
//! let converter = Converter::new(&store, "/data/sets/nuscenes", ConvertConfig::default());
//!
//! let stats = converter.run_to_parquet("/data/nuscenes-columnar", "v1.0-mini")?;
//! print!("{}", stats.metrics);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! This creates an append-mode dataset:
//! ```text
//! nuscenes-columnar/
//! └── data/
//!     ├── part-00000.parquet    # first 100 samples
//!     ├── part-00001.parquet    # next 100 samples
//!     └── ...
//! ```
//!
//! ## Reading the Output
//!
//! Fragments are plain Parquet files sharing one schema:
//!
//! ```python
//! # Python
//! import pyarrow.dataset as ds
//! table = ds.dataset("nuscenes-columnar/data", format="parquet").to_table()
//! ```
//!
//! ```sql
//! -- DuckDB
//! SELECT "LIDAR_TOP-timestamp", len(sample_annotations)
//! FROM read_parquet('nuscenes-columnar/data/*.parquet');
//! ```
//!
//! ## Architecture
//!
//! - [`resolver`]: token lookup over the record graph
//! - [`flatten`]: one sample to one row
//! - [`schema`]: Arrow schema inference from the first row
//! - [`batch`]: row buffering and periodic flushes
//! - [`writer`]: append-mode Parquet dataset
//! - [`metrics`]: scene, sample and file counters
//! - [`pipeline`]: the scene loop tying it together

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod batch;
pub mod config;
pub mod flatten;
pub mod metrics;
pub mod pipeline;
pub mod resolver;
pub mod schema;
pub mod value;
pub mod writer;

#[cfg(test)]
mod fixtures;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::batch::{BatchAccumulator, BatchError, BatchStats};
    pub use crate::config::{ConfigError, ConvertConfig};
    pub use crate::flatten::{FlattenError, FlattenedSample, RowFlattener};
    pub use crate::metrics::Metrics;
    pub use crate::pipeline::{ConversionStats, ConvertError, Converter};
    pub use crate::resolver::{
        JsonTableStore, Record, RecordKind, RecordResolver, ResolveError, Token,
    };
    pub use crate::schema::{infer_schema, CompressionDirective, SchemaError};
    pub use crate::value::{FieldValue, Row};
    pub use crate::writer::{
        CompressionType, DatasetSink, MemorySink, ParquetDatasetWriter, WriterConfig, WriterError,
        WriterStats,
    };
}
