//! End-to-end conversion
//!
//! [`Converter`] drives the scene loop: for every scene it follows the sample
//! chain from `first_sample_token` along `next`, flattens each sample into a
//! row and feeds the rows to a [`BatchAccumulator`]. The output schema is
//! inferred up front from the first sample of the dataset; that row is then
//! reused as the first row of the main pass.
//!
//! When the first sample has no annotations (or none with attributes) the
//! annotation column type is still partly `Null`. Inference then walks the
//! annotations of later samples, without touching sensor files, until the
//! type is complete or the dataset is exhausted.

mod error;


use std::collections::HashSet;
use std::path::{Path, PathBuf};

use arrow::datatypes::SchemaRef;
use log::{debug, info};

use crate::batch::BatchAccumulator;
use crate::config::ConvertConfig;
use crate::flatten::{FlattenedSample, RowFlattener, ANNOTATIONS_COLUMN};
use crate::metrics::{Metrics, SAMPLE, SCENE};
use crate::resolver::{token_field, RecordKind, RecordResolver, Token};
use crate::schema::{has_unresolved_type, infer_schema, refine_column};
use crate::writer::{
    DatasetSink, ParquetDatasetWriter, WriterError, WriterStats, KEY_DATASET_VERSION,
};

pub use error::ConvertError;

/// Statistics from a conversion
#[derive(Debug, Clone, Default)]
pub struct ConversionStats {
    /// Scene, sample and file counters
    pub metrics: Metrics,
    /// Batches appended to the output
    pub batches_flushed: usize,
    /// Rows appended to the output
    pub rows_written: usize,
    /// Writer statistics; `None` when nothing was opened
    pub writer: Option<WriterStats>,
}

/// Schema inferred from the first sample, with that sample kept for reuse
struct Inferred {
    schema: SchemaRef,
    first: SeedSample,
}

struct SeedSample {
    token: Token,
    sample: FlattenedSample,
    metrics: Metrics,
}

/// Converts a record graph into a columnar dataset
pub struct Converter<'a, R: RecordResolver + ?Sized> {
    resolver: &'a R,
    flattener: RowFlattener<'a, R>,
    config: ConvertConfig,
}

impl<'a, R: RecordResolver + ?Sized> Converter<'a, R> {
    /// Create a converter; sensor filenames are resolved against `data_root`
    pub fn new(resolver: &'a R, data_root: impl Into<PathBuf>, config: ConvertConfig) -> Self {
        Self {
            resolver,
            flattener: RowFlattener::new(resolver, data_root),
            config,
        }
    }

    /// Settings of this converter
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Infer the output schema from the first sample of the dataset.
    ///
    /// Returns `None` when no scene has a sample. Inference reads the first
    /// sample's sensor files; [`run`](Self::run) reuses that row instead of
    /// reading them again.
    pub fn infer_schema(&self) -> Result<Option<SchemaRef>, ConvertError> {
        Ok(self.inspect_first_sample()?.map(|inferred| inferred.schema))
    }

    /// Convert every scene, appending batches to the sink built by `open_sink`.
    ///
    /// `open_sink` is called once with the inferred schema, and not at all
    /// for a dataset without samples.
    pub fn run<S, F>(&self, open_sink: F) -> Result<ConversionStats, ConvertError>
    where
        S: DatasetSink,
        F: FnOnce(SchemaRef) -> Result<S, WriterError>,
    {
        self.config.validate()?;
        let scenes = self.resolver.scene_tokens();

        let Some(Inferred { schema, first }) = self.inspect_first_sample()? else {
            info!("Dataset has no samples; nothing to write");
            let mut metrics = Metrics::new();
            metrics.add(SCENE, scenes.len() as u64);
            return Ok(ConversionStats {
                metrics,
                ..ConversionStats::default()
            });
        };

        let sink = open_sink(schema.clone())?;
        let mut accumulator = BatchAccumulator::new(schema, sink, self.config.flush_interval);
        let mut metrics = Metrics::new();
        let mut seed = Some(first);

        for (index, scene_token) in scenes.iter().enumerate() {
            metrics.add(SCENE, 1);
            let samples = self.convert_scene(
                scene_token,
                &mut accumulator,
                &mut metrics,
                &mut seed,
            )?;
            info!(
                "Scene {}/{} ({}): {} samples",
                index + 1,
                scenes.len(),
                self.scene_name(scene_token),
                samples
            );
        }

        let (sink, batch_stats) = accumulator.finish()?;
        let writer = sink.finish()?;
        info!("{}", writer);

        Ok(ConversionStats {
            metrics,
            batches_flushed: batch_stats.batches_flushed,
            rows_written: batch_stats.rows_flushed,
            writer: Some(writer),
        })
    }

    /// Convert into an append-mode Parquet dataset at `output_root`
    pub fn run_to_parquet<P: AsRef<Path>>(
        &self,
        output_root: P,
        dataset_version: &str,
    ) -> Result<ConversionStats, ConvertError> {
        let output_root = output_root.as_ref();
        info!("Writing dataset to {}", output_root.display());
        self.run(|schema| {
            Ok(
                ParquetDatasetWriter::open(output_root, schema, self.config.writer.clone())?
                    .with_metadata(KEY_DATASET_VERSION, dataset_version),
            )
        })
    }

    fn convert_scene<S: DatasetSink>(
        &self,
        scene_token: &Token,
        accumulator: &mut BatchAccumulator<S>,
        metrics: &mut Metrics,
        seed: &mut Option<SeedSample>,
    ) -> Result<usize, ConvertError> {
        let scene = self.resolver.resolve(RecordKind::Scene, scene_token)?;
        let mut current = token_field(RecordKind::Scene, scene, "first_sample_token")?;
        let mut visited: HashSet<Token> = HashSet::new();

        while let Some(token) = current {
            if !visited.insert(token.clone()) {
                return Err(ConvertError::CycleDetected {
                    scene: scene_token.to_string(),
                    sample: token.to_string(),
                });
            }

            metrics.add(SAMPLE, 1);
            let FlattenedSample { next, row } = match seed.take_if(|s| s.token == token) {
                Some(first) => {
                    metrics.merge(&first.metrics);
                    first.sample
                }
                None => self.flattener.flatten_sample(&token, metrics)?,
            };
            accumulator.push(row)?;
            current = next;
        }

        debug!("Scene {} done at {} pending rows", scene_token, accumulator.pending());
        Ok(visited.len())
    }

    fn inspect_first_sample(&self) -> Result<Option<Inferred>, ConvertError> {
        let Some(token) = self.first_sample()? else {
            return Ok(None);
        };

        let mut metrics = Metrics::new();
        let sample = self.flattener.flatten_sample(&token, &mut metrics)?;
        let mut schema = infer_schema(&sample.row, &self.config.compression_directive())?;
        if annotations_unresolved(&schema) {
            schema = self.refine_annotations(schema)?;
        }
        info!("Inferred schema with {} columns", schema.fields().len());

        Ok(Some(Inferred {
            schema,
            first: SeedSample {
                token,
                sample,
                metrics,
            },
        }))
    }

    /// Merge annotation shapes of later samples into the annotation column
    /// until it has no `Null` position left
    fn refine_annotations(&self, mut schema: SchemaRef) -> Result<SchemaRef, ConvertError> {
        let mut scanned = 0usize;
        for scene_token in self.resolver.scene_tokens() {
            let scene = self.resolver.resolve(RecordKind::Scene, &scene_token)?;
            let mut current = token_field(RecordKind::Scene, scene, "first_sample_token")?;
            let mut visited: HashSet<Token> = HashSet::new();

            // A looping chain is reported by the main pass
            while let Some(token) = current.filter(|t| visited.insert(t.clone())) {
                let annotations = self.flattener.flatten_annotations(&token)?;
                schema = refine_column(&schema, ANNOTATIONS_COLUMN, &annotations)?;
                scanned += 1;
                if !annotations_unresolved(&schema) {
                    debug!("Annotation type complete after {} samples", scanned);
                    return Ok(schema);
                }
                let sample = self.resolver.resolve(RecordKind::Sample, &token)?;
                current = token_field(RecordKind::Sample, sample, "next")?;
            }
        }

        debug!(
            "Annotation type still has null positions after all {} samples",
            scanned
        );
        Ok(schema)
    }

    fn first_sample(&self) -> Result<Option<Token>, ConvertError> {
        for scene_token in self.resolver.scene_tokens() {
            let scene = self.resolver.resolve(RecordKind::Scene, &scene_token)?;
            if let Some(first) = token_field(RecordKind::Scene, scene, "first_sample_token")? {
                return Ok(Some(first));
            }
        }
        Ok(None)
    }

    fn scene_name(&self, token: &Token) -> String {
        self.resolver
            .resolve(RecordKind::Scene, token)
            .ok()
            .and_then(|scene| scene.get("name"))
            .and_then(|name| name.as_str())
            .map_or_else(|| token.to_string(), str::to_string)
    }
}

fn annotations_unresolved(schema: &SchemaRef) -> bool {
    schema
        .field_with_name(ANNOTATIONS_COLUMN)
        .is_ok_and(|field| has_unresolved_type(field.data_type()))
}
