use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Fields};

use super::constants::LIST_ITEM_NAME;
use super::error::SchemaError;
use crate::value::FieldValue;

/// Element field of an inferred list type
pub(crate) fn list_item(data_type: DataType) -> FieldRef {
    Arc::new(Field::new(LIST_ITEM_NAME, data_type, true))
}

/// Infer the Arrow type of one value.
///
/// Lists take the merge of all their element types, so a list of annotation
/// structs with differing optional fields still gets a single struct type.
/// Nulls, empty lists and empty structs infer as (lists of) `Null`.
pub(crate) fn infer_data_type(path: &str, value: &FieldValue) -> Result<DataType, SchemaError> {
    let data_type = match value {
        FieldValue::Null => DataType::Null,
        FieldValue::Bool(_) => DataType::Boolean,
        FieldValue::Int(_) => DataType::Int64,
        FieldValue::Float(_) => DataType::Float64,
        FieldValue::Str(_) => DataType::Utf8,
        FieldValue::Bytes(_) => DataType::Binary,
        FieldValue::List(items) => {
            let item_path = format!("{path}[]");
            let mut item_type = DataType::Null;
            for item in items {
                let next = infer_data_type(&item_path, item)?;
                item_type = merge_types(&item_path, item_type, next)?;
            }
            DataType::List(list_item(item_type))
        }
        FieldValue::Struct(row) if row.is_empty() => DataType::Null,
        FieldValue::Struct(row) => {
            let fields = row
                .iter()
                .map(|(name, v)| -> Result<Field, SchemaError> {
                    let child = infer_data_type(&format!("{path}.{name}"), v)?;
                    Ok(Field::new(name, child, true))
                })
                .collect::<Result<Vec<_>, _>>()?;
            DataType::Struct(Fields::from(fields))
        }
    };
    Ok(data_type)
}

/// Unify two inferred types.
///
/// `Null` unifies with anything, `Int64` widens to `Float64`, lists merge
/// element-wise and structs take the union of their fields (first-seen order).
pub(crate) fn merge_types(
    path: &str,
    left: DataType,
    right: DataType,
) -> Result<DataType, SchemaError> {
    match (left, right) {
        (left, right) if left == right => Ok(left),
        (DataType::Null, other) | (other, DataType::Null) => Ok(other),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            Ok(DataType::Float64)
        }
        (DataType::List(left), DataType::List(right)) => {
            let merged = merge_types(
                path,
                left.data_type().clone(),
                right.data_type().clone(),
            )?;
            Ok(DataType::List(list_item(merged)))
        }
        (DataType::Struct(left), DataType::Struct(right)) => {
            let mut fields: Vec<Field> = left.iter().map(|f| f.as_ref().clone()).collect();
            for field in right.iter() {
                match fields.iter().position(|f| f.name() == field.name()) {
                    Some(pos) => {
                        let merged = merge_types(
                            &format!("{path}.{}", field.name()),
                            fields[pos].data_type().clone(),
                            field.data_type().clone(),
                        )?;
                        fields[pos] = Field::new(field.name(), merged, true);
                    }
                    None => fields.push(field.as_ref().clone()),
                }
            }
            Ok(DataType::Struct(Fields::from(fields)))
        }
        (left, right) => Err(SchemaError::ConflictingTypes {
            column: path.to_string(),
            left,
            right,
        }),
    }
}
