use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Float64Array, Int64Array, ListArray, NullArray,
    StringArray, StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{DataType, FieldRef, Fields, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::schema::SchemaError;
use crate::value::{FieldValue, Row};

/// Cell of one column: `None` when the row has no such key
type Cell<'a> = Option<&'a FieldValue>;

/// Assemble rows into a batch of `schema`.
///
/// Columns missing from a row become null; keys outside the schema are
/// ignored. Integers widen into `Float64` columns. Any other value that does
/// not fit its column type fails with [`SchemaError::SchemaMismatch`].
pub fn rows_to_record_batch(schema: &SchemaRef, rows: &[Row]) -> Result<RecordBatch, SchemaError> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let cells: Vec<Cell<'_>> = rows.iter().map(|row| row.get(field.name())).collect();
            build_array(field.name(), field.data_type(), &cells)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(schema.clone(), columns, &options)?)
}

fn is_absent(cell: Cell<'_>) -> bool {
    cell.map_or(true, FieldValue::is_null)
}

fn mismatch(path: &str, expected: &DataType, found: &FieldValue) -> SchemaError {
    SchemaError::SchemaMismatch {
        column: path.to_string(),
        expected: expected.clone(),
        found: found.kind_name(),
    }
}

/// Validity mask, or `None` when every cell is present
fn null_buffer(cells: &[Cell<'_>]) -> Option<NullBuffer> {
    if cells.iter().any(|c| is_absent(*c)) {
        Some(NullBuffer::from(
            cells.iter().map(|c| !is_absent(*c)).collect::<Vec<bool>>(),
        ))
    } else {
        None
    }
}

/// Map every present cell through `extract`; absent cells stay `None`
fn scalars<'a, T>(
    path: &str,
    data_type: &DataType,
    cells: &[Cell<'a>],
    extract: impl Fn(&'a FieldValue) -> Option<T>,
) -> Result<Vec<Option<T>>, SchemaError> {
    cells
        .iter()
        .map(|cell| match *cell {
            None | Some(FieldValue::Null) => Ok(None),
            Some(value) => extract(value)
                .map(Some)
                .ok_or_else(|| mismatch(path, data_type, value)),
        })
        .collect()
}

fn build_array(
    path: &str,
    data_type: &DataType,
    cells: &[Cell<'_>],
) -> Result<ArrayRef, SchemaError> {
    let array: ArrayRef = match data_type {
        DataType::Null => {
            for cell in cells.iter().flatten() {
                match cell {
                    FieldValue::Null => {}
                    FieldValue::Struct(row) if row.is_empty() => {}
                    other => return Err(mismatch(path, data_type, other)),
                }
            }
            Arc::new(NullArray::new(cells.len()))
        }
        DataType::Boolean => Arc::new(BooleanArray::from(scalars(path, data_type, cells, |v| {
            match v {
                FieldValue::Bool(b) => Some(*b),
                _ => None,
            }
        })?)),
        DataType::Int64 => Arc::new(Int64Array::from(scalars(path, data_type, cells, |v| {
            match v {
                FieldValue::Int(i) => Some(*i),
                _ => None,
            }
        })?)),
        DataType::Float64 => Arc::new(Float64Array::from(scalars(path, data_type, cells, |v| {
            match v {
                FieldValue::Float(f) => Some(*f),
                FieldValue::Int(i) => Some(*i as f64),
                _ => None,
            }
        })?)),
        DataType::Utf8 => Arc::new(StringArray::from(scalars(path, data_type, cells, |v| {
            match v {
                FieldValue::Str(s) => Some(s.as_str()),
                _ => None,
            }
        })?)),
        DataType::Binary => Arc::new(BinaryArray::from(scalars(path, data_type, cells, |v| {
            match v {
                FieldValue::Bytes(b) => Some(b.as_slice()),
                _ => None,
            }
        })?)),
        DataType::List(item) => build_list(path, data_type, item, cells)?,
        DataType::Struct(fields) => build_struct(path, data_type, fields, cells)?,
        other => {
            return Err(ArrowError::NotYetImplemented(format!(
                "column '{path}' has unsupported type {other}"
            ))
            .into())
        }
    };
    Ok(array)
}

fn build_list(
    path: &str,
    data_type: &DataType,
    item: &FieldRef,
    cells: &[Cell<'_>],
) -> Result<ArrayRef, SchemaError> {
    let mut offsets: Vec<i32> = Vec::with_capacity(cells.len() + 1);
    offsets.push(0);
    let mut children: Vec<Cell<'_>> = Vec::new();

    for cell in cells {
        match *cell {
            None | Some(FieldValue::Null) => {}
            Some(FieldValue::List(items)) => children.extend(items.iter().map(Some)),
            Some(other) => return Err(mismatch(path, data_type, other)),
        }
        let end = i32::try_from(children.len()).map_err(|_| SchemaError::OffsetOverflow {
            column: path.to_string(),
        })?;
        offsets.push(end);
    }

    let values = build_array(&format!("{path}[]"), item.data_type(), &children)?;
    let offsets = OffsetBuffer::new(ScalarBuffer::from(offsets));
    Ok(Arc::new(ListArray::try_new(
        item.clone(),
        offsets,
        values,
        null_buffer(cells),
    )?))
}

fn build_struct(
    path: &str,
    data_type: &DataType,
    fields: &Fields,
    cells: &[Cell<'_>],
) -> Result<ArrayRef, SchemaError> {
    let mut rows: Vec<Option<&Row>> = Vec::with_capacity(cells.len());
    for cell in cells {
        match *cell {
            None | Some(FieldValue::Null) => rows.push(None),
            Some(FieldValue::Struct(row)) => rows.push(Some(row)),
            Some(other) => return Err(mismatch(path, data_type, other)),
        }
    }

    let children = fields
        .iter()
        .map(|field| {
            let child_cells: Vec<Cell<'_>> = rows
                .iter()
                .map(|row| row.and_then(|r| r.get(field.name())))
                .collect();
            build_array(
                &format!("{path}.{}", field.name()),
                field.data_type(),
                &child_cells,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let nulls = if rows.iter().any(Option::is_none) {
        Some(NullBuffer::from(
            rows.iter().map(Option::is_some).collect::<Vec<bool>>(),
        ))
    } else {
        None
    };

    Ok(Arc::new(StructArray::try_new(fields.clone(), children, nulls)?))
}
