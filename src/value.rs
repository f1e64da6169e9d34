//! Cell values and flattened rows.
//!
//! A [`Row`] is the unit the flattener produces for one sample: an
//! insertion-ordered map from namespaced column name to [`FieldValue`].
//! Nested annotation structures reuse [`Row`] as their struct payload, so the
//! same ordering rules hold at every level.

use std::collections::HashMap;

use serde_json::Value;

/// A single cell of a flattened row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Missing or JSON `null`
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar (JSON integers that fit in `i64`)
    Int(i64),
    /// Floating-point scalar
    Float(f64),
    /// UTF-8 string scalar
    Str(String),
    /// Raw file contents
    Bytes(Vec<u8>),
    /// Ordered sequence of values
    List(Vec<FieldValue>),
    /// Nested structure with named fields
    Struct(Row),
}

impl FieldValue {
    /// Returns true for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short name of the value's shape, used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Bytes(_) => "binary",
            FieldValue::List(_) => "list",
            FieldValue::Struct(_) => "struct",
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            // u64 values beyond i64::MAX degrade to float rather than wrapping
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Str(s.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from).collect()),
            Value::Object(map) => {
                let mut row = Row::with_capacity(map.len());
                for (k, v) in map {
                    row.insert(k.clone(), FieldValue::from(v));
                }
                FieldValue::Struct(row)
            }
        }
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(bytes: Vec<u8>) -> Self {
        FieldValue::Bytes(bytes)
    }
}

/// Insertion-ordered mapping from column name to value.
///
/// Re-inserting an existing key replaces its value but keeps its original
/// position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, FieldValue)>,
    index: HashMap<String, usize>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` columns
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or replace a column value
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => self.columns[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.columns.len());
                self.columns.push((key, value));
            }
        }
    }

    /// Look up a column value by name
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.index.get(key).map(|&pos| &self.columns[pos].1)
    }

    /// Returns true if the row has a column named `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}
