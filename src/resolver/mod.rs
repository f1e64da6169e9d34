//! # Record Resolution
//!
//! The nuScenes record graph is a set of tables whose rows reference each other
//! through opaque `token` strings. Everything downstream of this module talks
//! to the graph through [`RecordResolver`]: it hands out [`Token`] values and
//! resolves them to [`Record`]s, so the flattener never parses identifier
//! strings itself.
//!
//! [`JsonTableStore`] is the resolver for the on-disk layout
//! (`<root>/<version>/<table>.json`).

mod error;
mod json_store;


use std::fmt;

use serde_json::Value;

pub use error::ResolveError;
pub use json_store::JsonTableStore;

/// One dataset record: field name to JSON value, in source order.
pub type Record = serde_json::Map<String, Value>;

/// Tables of the record graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    /// Top-level capture sequence
    Scene,
    /// Synchronized multi-sensor capture
    Sample,
    /// One sensor reading
    SampleData,
    /// Vehicle pose at a reading
    EgoPose,
    /// Sensor extrinsics/intrinsics
    CalibratedSensor,
    /// Sensor channel and modality
    Sensor,
    /// Labeled object in a sample
    SampleAnnotation,
    /// Object identity across samples
    Instance,
    /// Object taxonomy entry
    Category,
    /// Annotation tag
    Attribute,
}

impl RecordKind {
    /// Every kind, in load order
    pub const ALL: [RecordKind; 10] = [
        RecordKind::Scene,
        RecordKind::Sample,
        RecordKind::SampleData,
        RecordKind::EgoPose,
        RecordKind::CalibratedSensor,
        RecordKind::Sensor,
        RecordKind::SampleAnnotation,
        RecordKind::Instance,
        RecordKind::Category,
        RecordKind::Attribute,
    ];

    /// Table name, which is also the JSON file stem
    pub fn table_name(&self) -> &'static str {
        match self {
            RecordKind::Scene => "scene",
            RecordKind::Sample => "sample",
            RecordKind::SampleData => "sample_data",
            RecordKind::EgoPose => "ego_pose",
            RecordKind::CalibratedSensor => "calibrated_sensor",
            RecordKind::Sensor => "sensor",
            RecordKind::SampleAnnotation => "sample_annotation",
            RecordKind::Instance => "instance",
            RecordKind::Category => "category",
            RecordKind::Attribute => "attribute",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Opaque record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Wrap a raw identifier
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw identifier, for resolver backends
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key-value lookup over the record graph.
///
/// Implementations must be deterministic: resolving the same `(kind, token)`
/// twice yields identical records.
pub trait RecordResolver {
    /// Resolve `token` in the `kind` table
    fn resolve(&self, kind: RecordKind, token: &Token) -> Result<&Record, ResolveError>;

    /// Scene tokens in dataset order
    fn scene_tokens(&self) -> Vec<Token>;
}

/// Read a single-token linkage field.
///
/// An empty string or `null` means "no link" and yields `None`; this is how
/// the last sample of a scene terminates its chain.
pub fn token_field(
    kind: RecordKind,
    record: &Record,
    field: &str,
) -> Result<Option<Token>, ResolveError> {
    match record.get(field) {
        None => Err(ResolveError::MissingField {
            kind,
            field: field.to_string(),
        }),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(Token::new(s.as_str()))),
        Some(_) => Err(ResolveError::InvalidField {
            kind,
            field: field.to_string(),
            expected: "a token string",
        }),
    }
}

/// Read a linkage field that must be present and non-empty
pub fn required_token_field(
    kind: RecordKind,
    record: &Record,
    field: &str,
) -> Result<Token, ResolveError> {
    token_field(kind, record, field)?.ok_or_else(|| ResolveError::InvalidField {
        kind,
        field: field.to_string(),
        expected: "a non-empty token",
    })
}

/// Read a list-of-tokens linkage field
pub fn token_list_field(
    kind: RecordKind,
    record: &Record,
    field: &str,
) -> Result<Vec<Token>, ResolveError> {
    let invalid = || ResolveError::InvalidField {
        kind,
        field: field.to_string(),
        expected: "a list of token strings",
    };
    match record.get(field) {
        None => Err(ResolveError::MissingField {
            kind,
            field: field.to_string(),
        }),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(Token::new).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// Read a `name -> token` linkage field, preserving source order
pub fn token_map_field(
    kind: RecordKind,
    record: &Record,
    field: &str,
) -> Result<Vec<(String, Token)>, ResolveError> {
    let invalid = || ResolveError::InvalidField {
        kind,
        field: field.to_string(),
        expected: "a map of token strings",
    };
    match record.get(field) {
        None => Err(ResolveError::MissingField {
            kind,
            field: field.to_string(),
        }),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, v)| {
                v.as_str()
                    .map(|t| (name.clone(), Token::new(t)))
                    .ok_or_else(invalid)
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// Read a string field that must be present
pub fn string_field<'r>(
    kind: RecordKind,
    record: &'r Record,
    field: &str,
) -> Result<&'r str, ResolveError> {
    match record.get(field) {
        None => Err(ResolveError::MissingField {
            kind,
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ResolveError::InvalidField {
            kind,
            field: field.to_string(),
            expected: "a string",
        }),
    }
}
