//! # Schema Inference
//!
//! The output schema is derived once, from the first flattened row of the
//! dataset, before any batch is written. Column types follow the value shapes
//! of that row:
//!
//! | Value | Arrow type |
//! |-------|------------|
//! | bool | Boolean |
//! | integer | Int64 |
//! | float | Float64 |
//! | string | Utf8 |
//! | file contents | Binary |
//! | list | List (element types merged) |
//! | object | Struct |
//! | null / empty | Null |
//!
//! A column whose type still has a `Null` position (an empty annotation list,
//! say) can be refined with values from later rows through
//! [`refine_column`] while the schema is being inferred.
//!
//! Every top-level Binary column carries two field metadata entries,
//! [`KEY_COMPRESSION`] and [`KEY_COMPRESSION_LEVEL`], which the dataset writer
//! turns into per-column codec settings.

mod constants;
mod error;
mod infer;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaBuilder, SchemaRef};

use crate::value::{FieldValue, Row};

pub use constants::*;
pub use error::SchemaError;
pub(crate) use infer::list_item;

/// Compression directive attached to binary columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionDirective {
    /// Codec name (e.g. `zstd`)
    pub algorithm: String,
    /// Codec level, kept as given on the command line
    pub level: String,
}

impl CompressionDirective {
    /// Create a directive from a codec name and level
    pub fn new(algorithm: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            level: level.into(),
        }
    }

    fn field_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::with_capacity(2);
        metadata.insert(KEY_COMPRESSION.to_string(), self.algorithm.clone());
        metadata.insert(KEY_COMPRESSION_LEVEL.to_string(), self.level.clone());
        metadata
    }
}

impl Default for CompressionDirective {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_ALGO, DEFAULT_COMPRESSION_LEVEL)
    }
}

/// Derive the dataset schema from one representative row.
///
/// Columns keep the row's insertion order and are all nullable.
///
/// # Example
///
/// ```
/// use nuscenes_columnar::schema::{infer_schema, CompressionDirective, KEY_COMPRESSION};
/// use nuscenes_columnar::value::{FieldValue, Row};
///
/// let mut row = Row::new();
/// row.insert("LIDAR_TOP-timestamp", FieldValue::Int(1532402927647951));
/// row.insert("LIDAR_TOP-file", FieldValue::Bytes(vec![0, 1, 2]));
///
/// let schema = infer_schema(&row, &CompressionDirective::default()).unwrap();
/// assert_eq!(schema.fields().len(), 2);
/// assert_eq!(
///     schema.field(1).metadata().get(KEY_COMPRESSION).map(String::as_str),
///     Some("zstd")
/// );
/// ```
pub fn infer_schema(
    row: &Row,
    compression: &CompressionDirective,
) -> Result<SchemaRef, SchemaError> {
    if row.is_empty() {
        return Err(SchemaError::EmptyRow);
    }

    let mut builder = SchemaBuilder::with_capacity(row.len());
    for (name, value) in row.iter() {
        let data_type = infer::infer_data_type(name, value)?;
        let field = Field::new(name, data_type, true);
        let field = if field.data_type() == &DataType::Binary {
            field.with_metadata(compression.field_metadata())
        } else {
            field
        };
        builder.push(field);
    }

    Ok(Arc::new(builder.finish()))
}

/// Compression directive of a binary column, if it carries one
pub fn binary_compression(field: &Field) -> Option<CompressionDirective> {
    if field.data_type() != &DataType::Binary {
        return None;
    }
    let metadata = field.metadata();
    let algorithm = metadata.get(KEY_COMPRESSION)?;
    let level = metadata.get(KEY_COMPRESSION_LEVEL)?;
    Some(CompressionDirective::new(algorithm.as_str(), level.as_str()))
}

/// Returns true if `data_type` has a position inferred from no value at all
pub fn has_unresolved_type(data_type: &DataType) -> bool {
    match data_type {
        DataType::Null => true,
        DataType::List(item) => has_unresolved_type(item.data_type()),
        DataType::Struct(fields) => fields.iter().any(|f| has_unresolved_type(f.data_type())),
        _ => false,
    }
}

/// Merge the shape of `value` into the type of `column`.
///
/// Types merge the way list elements do: `Null` positions take the other
/// side's type, integers widen to floats and struct fields are unioned. Field
/// metadata is kept. A schema without `column` is returned unchanged.
pub fn refine_column(
    schema: &SchemaRef,
    column: &str,
    value: &FieldValue,
) -> Result<SchemaRef, SchemaError> {
    let Some((index, field)) = schema.column_with_name(column) else {
        return Ok(schema.clone());
    };

    let observed = infer::infer_data_type(column, value)?;
    let merged = infer::merge_types(column, field.data_type().clone(), observed)?;
    if &merged == field.data_type() {
        return Ok(schema.clone());
    }

    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    fields[index] = Arc::new(field.clone().with_data_type(merged));
    Ok(Arc::new(Schema::new_with_metadata(
        fields,
        schema.metadata().clone(),
    )))
}
