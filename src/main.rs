//! # nuscenes-convert
//!
//! Converts a nuScenes dataset into an append-mode columnar dataset with one
//! row per sample.
//!
//! ## Usage
//!
//! ```bash
//! nuscenes-convert /data/sets/nuscenes v1.0-mini /data/nuscenes-columnar
//! nuscenes-convert /data/sets/nuscenes v1.0-trainval out --compression-level 19
//! ```
//!
//! Settings beyond the command line are read from the TOML file named by
//! `NUSCENES_CONVERT_CONFIG`, if set. Log output is controlled by `RUST_LOG`
//! (default `info`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use nuscenes_columnar::config::ConvertConfig;
use nuscenes_columnar::pipeline::Converter;
use nuscenes_columnar::resolver::JsonTableStore;

/// Environment variable naming an optional TOML settings file
const CONFIG_ENV: &str = "NUSCENES_CONVERT_CONFIG";

/// Convert a nuScenes dataset into a columnar dataset
#[derive(Parser)]
#[command(name = "nuscenes-convert")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The root path of the nuScenes dataset
    #[arg(value_name = "NUSCENES_ROOT")]
    nuscenes_root: PathBuf,

    /// The nuScenes dataset version (e.g. v1.0-mini)
    #[arg(value_name = "VERSION")]
    version: String,

    /// The root path of the output dataset
    #[arg(value_name = "OUTPUT_ROOT")]
    output_root: PathBuf,

    /// Compression algorithm for sensor file columns [default: zstd]
    #[arg(long, alias = "compression_algo")]
    compression_algo: Option<String>,

    /// Compression level for sensor file columns [default: 22]
    #[arg(long, alias = "compression_level")]
    compression_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config(&cli)?;
    config.validate().context("Invalid conversion settings")?;

    let store = JsonTableStore::open(&cli.nuscenes_root, &cli.version).with_context(|| {
        format!(
            "Failed to load {} tables from {}",
            cli.version,
            cli.nuscenes_root.display()
        )
    })?;

    info!(
        "Converting {} ({}) to {}",
        cli.nuscenes_root.display(),
        cli.version,
        cli.output_root.display()
    );
    info!(
        "Sensor file compression: {} level {}",
        config.compression_algo, config.compression_level
    );

    let converter = Converter::new(&store, &cli.nuscenes_root, config);
    let stats = converter
        .run_to_parquet(&cli.output_root, &cli.version)
        .context("Conversion failed")?;

    info!(
        "Wrote {} rows in {} batches",
        stats.rows_written, stats.batches_flushed
    );
    print!("{}", stats.metrics);

    Ok(())
}

/// Defaults, then the settings file, then command-line values
fn load_config(cli: &Cli) -> Result<ConvertConfig> {
    let mut config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            info!("Loading settings from {}", path.display());
            ConvertConfig::from_file(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
        }
        None => ConvertConfig::default(),
    };

    if let Some(algo) = &cli.compression_algo {
        config.compression_algo = algo.clone();
    }
    if let Some(level) = &cli.compression_level {
        config.compression_level = level.clone();
    }
    Ok(config)
}
