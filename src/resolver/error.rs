use std::path::PathBuf;

use super::RecordKind;

/// Errors raised while loading or resolving dataset records
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No record of this kind has the requested token
    #[error("{kind} record not found: {token}")]
    NotFound {
        /// Record kind that was queried
        kind: RecordKind,
        /// Token that did not resolve
        token: String,
    },

    /// A record lacks a field the record graph depends on
    #[error("{kind} record is missing field '{field}'")]
    MissingField {
        /// Record kind that was inspected
        kind: RecordKind,
        /// Name of the absent field
        field: String,
    },

    /// A linkage field has the wrong JSON shape
    #[error("{kind} field '{field}' is not {expected}")]
    InvalidField {
        /// Record kind that was inspected
        kind: RecordKind,
        /// Name of the malformed field
        field: String,
        /// Human-readable description of the expected shape
        expected: &'static str,
    },

    /// A table file could not be read
    #[error("failed to read table {}: {source}", path.display())]
    Io {
        /// Path of the table file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A table file is not a JSON array of objects
    #[error("failed to parse table {}: {source}", path.display())]
    Json {
        /// Path of the table file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}
