//! # Dataset Writer Module
//!
//! The output of a conversion is an append-mode columnar dataset: every flush
//! of the batch accumulator becomes one distinct write to the same logical
//! destination.
//!
//! ## Design Principles
//!
//! 1. **Streaming Architecture**: each batch is written and dropped; nothing
//!    is held beyond the batch being appended.
//!
//! 2. **Append Semantics**: the destination is created on first write and
//!    later writes (including later runs) add fragments next to earlier ones.
//!
//! 3. **Per-Column Compression**: binary columns use the codec named in their
//!    schema metadata; every other column uses [`WriterConfig::compression`].

mod config;
mod error;
mod stats;
mod writer_impl;


use arrow::record_batch::RecordBatch;

pub use config::{CompressionType, WriterConfig};
pub use error::WriterError;
pub use stats::WriterStats;
pub use writer_impl::{
    fragment_file_name, ParquetDatasetWriter, DATA_DIR, KEY_CONVERTER_VERSION, KEY_CREATED_AT,
    KEY_DATASET_VERSION, KEY_FRAGMENT_INDEX,
};

/// Destination of flushed batches
pub trait DatasetSink {
    /// Append one batch as a distinct write
    fn append(&mut self, batch: &RecordBatch) -> Result<(), WriterError>;

    /// Finish writing and return statistics
    fn finish(self) -> Result<WriterStats, WriterError>
    where
        Self: Sized;
}

/// Sink that keeps appended batches in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<RecordBatch>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches appended so far, in order
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Consume the sink and return its batches
    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }
}

impl DatasetSink for MemorySink {
    fn append(&mut self, batch: &RecordBatch) -> Result<(), WriterError> {
        self.batches.push(batch.clone());
        Ok(())
    }

    fn finish(self) -> Result<WriterStats, WriterError> {
        Ok(WriterStats {
            fragments_written: self.batches.len(),
            rows_written: self.batches.iter().map(RecordBatch::num_rows).sum(),
            bytes_written: self
                .batches
                .iter()
                .map(|b| b.get_array_memory_size() as u64)
                .sum(),
        })
    }
}
