//! Conversion settings.
//!
//! Defaults can be overridden from a TOML file; command-line values are
//! applied on top of the file:
//!
//! ```toml
//! # nuscenes-convert.toml
//! [conversion]
//! flush_interval = 250
//! compression_algo = "zstd"
//! compression_level = 19
//! row_group_size = 512
//! write_statistics = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::schema::{CompressionDirective, DEFAULT_COMPRESSION_ALGO, DEFAULT_COMPRESSION_LEVEL};
use crate::writer::{CompressionType, WriterConfig, WriterError};

/// Rows buffered before each write to the output dataset
pub const DEFAULT_FLUSH_INTERVAL: usize = 100;

/// Errors from loading or validating settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Flush interval must be positive
    #[error("flush_interval must be at least 1")]
    InvalidFlushInterval,

    /// Compression algorithm/level pair is not usable
    #[error(transparent)]
    Compression(#[from] WriterError),
}

/// Settings for one conversion run
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Rows per flushed batch
    pub flush_interval: usize,
    /// Codec recorded on binary columns
    pub compression_algo: String,
    /// Codec level recorded on binary columns
    pub compression_level: String,
    /// Parquet writer settings
    pub writer: WriterConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            compression_algo: DEFAULT_COMPRESSION_ALGO.to_string(),
            compression_level: DEFAULT_COMPRESSION_LEVEL.to_string(),
            writer: WriterConfig::default(),
        }
    }
}

impl ConvertConfig {
    /// Defaults overlaid with a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content)?;
        let mut config = Self::default();
        config.apply(file.conversion);
        Ok(config)
    }

    /// Defaults overlaid with a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Replace the binary column codec
    pub fn with_compression(mut self, algo: impl Into<String>, level: impl Into<String>) -> Self {
        self.compression_algo = algo.into();
        self.compression_level = level.into();
        self
    }

    /// Replace the flush interval
    pub fn with_flush_interval(mut self, flush_interval: usize) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    /// Check the settings before any output is written
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval == 0 {
            return Err(ConfigError::InvalidFlushInterval);
        }
        CompressionType::from_name(&self.compression_algo, &self.compression_level)?;
        Ok(())
    }

    /// Directive attached to binary columns of the inferred schema
    pub fn compression_directive(&self) -> CompressionDirective {
        CompressionDirective::new(&self.compression_algo, &self.compression_level)
    }

    fn apply(&mut self, section: ConversionSection) {
        if let Some(n) = section.flush_interval {
            self.flush_interval = n;
        }
        if let Some(algo) = section.compression_algo {
            self.compression_algo = algo;
        }
        if let Some(level) = section.compression_level {
            self.compression_level = level.into_string();
        }
        if let Some(n) = section.row_group_size {
            self.writer.row_group_size = n;
        }
        if let Some(n) = section.data_page_size {
            self.writer.data_page_size = n;
        }
        if let Some(enabled) = section.write_statistics {
            self.writer.write_statistics = enabled;
        }
    }
}

/// Root of the TOML configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    conversion: ConversionSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConversionSection {
    flush_interval: Option<usize>,
    compression_algo: Option<String>,
    compression_level: Option<Level>,
    row_group_size: Option<usize>,
    data_page_size: Option<usize>,
    write_statistics: Option<bool>,
}

/// Codec level written either as `19` or `"19"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Level {
    Int(i64),
    Str(String),
}

impl Level {
    fn into_string(self) -> String {
        match self {
            Level::Int(n) => n.to_string(),
            Level::Str(s) => s,
        }
    }
}
