//! # Sample Flattening
//!
//! Walks one sample's slice of the record graph and denormalizes it into a
//! single [`Row`]:
//!
//! | Column | Source |
//! |--------|--------|
//! | `<sensor>-<field>` | `sample_data` scalar fields |
//! | `<sensor>-ego_pose-<field>` | `ego_pose` of the reading |
//! | `<sensor>-calibrated_sensor-<field>` | `calibrated_sensor` of the reading |
//! | `<sensor>-file` | raw bytes of the sensor file |
//! | `sample_annotations` | list of annotation structs |
//!
//! Each annotation struct holds the `ann-` prefixed annotation fields, the
//! instance fields, a nested `category` struct and an `attributes` list.
//! Linkage fields (anything containing `token`, plus `prev`/`next` and the
//! like) are dropped at every level: they are either resolved into the
//! structures above or carry no analytic value.

mod error;


use std::fs;
use std::path::PathBuf;

use log::trace;

use crate::metrics::Metrics;
use crate::resolver::{
    required_token_field, string_field, token_field, token_list_field, token_map_field, Record,
    RecordKind, RecordResolver, Token,
};
use crate::value::{FieldValue, Row};

pub use error::FlattenError;

/// Column holding the sample's annotation list
pub const ANNOTATIONS_COLUMN: &str = "sample_annotations";

const SAMPLE_DATA_LINKS: &[&str] = &[
    "ego_pose_token",
    "calibrated_sensor_token",
    "filename",
    "prev",
    "next",
];
const ANNOTATION_LINKS: &[&str] = &["instance_token", "attribute_tokens", "prev", "next"];
const INSTANCE_LINKS: &[&str] = &["category_token"];

/// Output of flattening one sample
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedSample {
    /// Next sample in the scene, `None` at the end of the chain
    pub next: Option<Token>,
    /// The denormalized row
    pub row: Row,
}

/// Denormalizes samples into rows.
pub struct RowFlattener<'a, R: RecordResolver + ?Sized> {
    resolver: &'a R,
    data_root: PathBuf,
}

impl<'a, R: RecordResolver + ?Sized> RowFlattener<'a, R> {
    /// Create a flattener; sensor filenames are resolved against `data_root`
    pub fn new(resolver: &'a R, data_root: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            data_root: data_root.into(),
        }
    }

    /// Flatten the sample `token`, reading every sensor file it references.
    ///
    /// File counters are added to `metrics`.
    pub fn flatten_sample(
        &self,
        token: &Token,
        metrics: &mut Metrics,
    ) -> Result<FlattenedSample, FlattenError> {
        let sample = self.resolver.resolve(RecordKind::Sample, token)?;
        let next = token_field(RecordKind::Sample, sample, "next")?;

        let mut row = Row::new();
        for (sensor, data_token) in token_map_field(RecordKind::Sample, sample, "data")? {
            self.extend_sample_data(&sensor, &data_token, &mut row, metrics)?;
        }

        row.insert(ANNOTATIONS_COLUMN, self.annotations_of(sample)?);

        trace!("Flattened sample {} into {} columns", token, row.len());
        Ok(FlattenedSample { next, row })
    }

    /// Flatten only the annotation list of the sample `token`.
    ///
    /// Yields the value [`flatten_sample`](Self::flatten_sample) stores under
    /// [`ANNOTATIONS_COLUMN`] without reading any sensor file.
    pub fn flatten_annotations(&self, token: &Token) -> Result<FieldValue, FlattenError> {
        let sample = self.resolver.resolve(RecordKind::Sample, token)?;
        self.annotations_of(sample)
    }

    fn annotations_of(&self, sample: &Record) -> Result<FieldValue, FlattenError> {
        let annotations = token_list_field(RecordKind::Sample, sample, "anns")?
            .iter()
            .map(|ann| self.flatten_annotation(ann))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldValue::List(annotations))
    }

    fn extend_sample_data(
        &self,
        sensor: &str,
        token: &Token,
        row: &mut Row,
        metrics: &mut Metrics,
    ) -> Result<(), FlattenError> {
        let data = self.resolver.resolve(RecordKind::SampleData, token)?;
        copy_fields(data, SAMPLE_DATA_LINKS, &format!("{sensor}-"), row);

        let ego_token = required_token_field(RecordKind::SampleData, data, "ego_pose_token")?;
        let ego_pose = self.resolver.resolve(RecordKind::EgoPose, &ego_token)?;
        copy_fields(ego_pose, &[], &format!("{sensor}-ego_pose-"), row);

        let calibrated_token =
            required_token_field(RecordKind::SampleData, data, "calibrated_sensor_token")?;
        let calibrated = self
            .resolver
            .resolve(RecordKind::CalibratedSensor, &calibrated_token)?;
        copy_fields(calibrated, &[], &format!("{sensor}-calibrated_sensor-"), row);

        let filename = string_field(RecordKind::SampleData, data, "filename")?;
        self.extend_file(filename, sensor, row, metrics)
    }

    fn extend_file(
        &self,
        filename: &str,
        sensor: &str,
        row: &mut Row,
        metrics: &mut Metrics,
    ) -> Result<(), FlattenError> {
        let path = self.data_root.join(filename);
        let bytes = fs::read(&path).map_err(|source| FlattenError::FileRead {
            path: path.clone(),
            source,
        })?;
        metrics.record_file(&path, bytes.len() as u64);
        row.insert(format!("{sensor}-file"), FieldValue::Bytes(bytes));
        Ok(())
    }

    fn flatten_annotation(&self, token: &Token) -> Result<FieldValue, FlattenError> {
        let annotation = self.resolver.resolve(RecordKind::SampleAnnotation, token)?;
        let mut out = Row::new();
        copy_fields(annotation, ANNOTATION_LINKS, "ann-", &mut out);

        let instance_token =
            required_token_field(RecordKind::SampleAnnotation, annotation, "instance_token")?;
        self.extend_instance(&instance_token, &mut out)?;

        let attribute_tokens =
            token_list_field(RecordKind::SampleAnnotation, annotation, "attribute_tokens")?;
        let attributes = attribute_tokens
            .iter()
            .map(|attr| -> Result<FieldValue, FlattenError> {
                let attribute = self.resolver.resolve(RecordKind::Attribute, attr)?;
                Ok(FieldValue::Struct(scalar_struct(attribute)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        out.insert("attributes", FieldValue::List(attributes));

        Ok(FieldValue::Struct(out))
    }

    fn extend_instance(&self, token: &Token, out: &mut Row) -> Result<(), FlattenError> {
        let instance = self.resolver.resolve(RecordKind::Instance, token)?;
        copy_fields(instance, INSTANCE_LINKS, "", out);

        let category_token =
            required_token_field(RecordKind::Instance, instance, "category_token")?;
        let category = self.resolver.resolve(RecordKind::Category, &category_token)?;
        out.insert("category", FieldValue::Struct(scalar_struct(category)));
        Ok(())
    }
}

fn is_link(field: &str, links: &[&str]) -> bool {
    links.contains(&field) || field.contains("token")
}

fn copy_fields(record: &Record, links: &[&str], prefix: &str, out: &mut Row) {
    for (field, value) in record {
        if !is_link(field, links) {
            out.insert(format!("{prefix}{field}"), FieldValue::from(value));
        }
    }
}

fn scalar_struct(record: &Record) -> Row {
    let mut out = Row::with_capacity(record.len());
    copy_fields(record, &[], "", &mut out);
    out
}
