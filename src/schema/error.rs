use arrow::datatypes::DataType;

/// Errors from schema inference and schema-conforming batch conversion
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The representative row has no columns
    #[error("cannot infer a schema from an empty row")]
    EmptyRow,

    /// Elements of one list have incompatible shapes
    #[error("column '{column}' mixes incompatible types {left} and {right}")]
    ConflictingTypes {
        /// Column path (`a.b[]` style for nested values)
        column: String,
        /// Type inferred first
        left: DataType,
        /// Type that could not be merged into it
        right: DataType,
    },

    /// A row value does not fit the column type fixed by the schema
    #[error("column '{column}' expects {expected}, found {found} value")]
    SchemaMismatch {
        /// Column path (`a.b[]` style for nested values)
        column: String,
        /// Type from the schema
        expected: DataType,
        /// Shape of the offending value
        found: &'static str,
    },

    /// A list column holds more elements than 32-bit offsets can address
    #[error("column '{column}' exceeds the list offset range")]
    OffsetOverflow {
        /// Column path
        column: String,
    },

    /// Error from the Arrow library while assembling arrays
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
}
