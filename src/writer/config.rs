use std::fmt;

use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;

use crate::schema::CompressionDirective;

use super::error::WriterError;

/// Parquet codec for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// ZSTD compression at the given level (1-22)
    Zstd(i32),
    /// Snappy compression (faster, larger files)
    Snappy,
    /// No compression
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        // Metadata columns are small; binary columns carry their own codec
        Self::Zstd(3)
    }
}

impl CompressionType {
    /// Parse a codec name and level as given on the command line.
    ///
    /// The level is ignored for codecs without levels.
    pub fn from_name(algorithm: &str, level: &str) -> Result<Self, WriterError> {
        match algorithm.trim().to_ascii_lowercase().as_str() {
            "zstd" => {
                let parsed: i32 = level
                    .trim()
                    .parse()
                    .map_err(|_| WriterError::InvalidCompressionLevel(level.to_string()))?;
                ZstdLevel::try_new(parsed)
                    .map_err(|_| WriterError::InvalidCompressionLevel(level.to_string()))?;
                Ok(Self::Zstd(parsed))
            }
            "snappy" => Ok(Self::Snappy),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(WriterError::UnsupportedCompression(other.to_string())),
        }
    }

    /// Parse the compression directive of a binary column
    pub fn from_directive(directive: &CompressionDirective) -> Result<Self, WriterError> {
        Self::from_name(&directive.algorithm, &directive.level)
    }

    fn to_parquet(self) -> Compression {
        match self {
            Self::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or(ZstdLevel::default()))
            }
            Self::Snappy => Compression::SNAPPY,
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zstd(level) => write!(f, "zstd({})", level),
            Self::Snappy => write!(f, "snappy"),
            Self::Uncompressed => write!(f, "uncompressed"),
        }
    }
}

/// Configuration for the Parquet dataset writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Codec for every column without its own compression directive
    pub compression: CompressionType,

    /// Maximum rows per Parquet row group
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write column chunk statistics
    pub write_statistics: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::default(),
            // Rows embed whole sensor files, so keep groups short
            row_group_size: 1_024,
            // 1MB data pages
            data_page_size: 1024 * 1024,
            write_statistics: true,
        }
    }
}

impl WriterConfig {
    /// Create writer properties for one fragment.
    ///
    /// `binary_columns` overrides the codec of each named column and turns off
    /// dictionary encoding and statistics for it: file blobs never repeat and
    /// min/max values would copy whole files into the footer.
    pub(super) fn to_writer_properties(
        &self,
        binary_columns: &[(String, CompressionType)],
        metadata: Vec<KeyValue>,
    ) -> WriterProperties {
        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(self.compression.to_parquet())
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        for (column, compression) in binary_columns {
            let path = ColumnPath::new(vec![column.clone()]);
            builder = builder
                .set_column_compression(path.clone(), compression.to_parquet())
                .set_column_dictionary_enabled(path.clone(), false)
                .set_column_statistics_enabled(path, EnabledStatistics::None);
        }

        builder.set_key_value_metadata(Some(metadata)).build()
    }
}
