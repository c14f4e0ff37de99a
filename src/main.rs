//! cytoprep CLI
//!
//! Diagnostic entry point: builds the data pipeline and reports split
//! sizes, per-class counts, and realized class exposure under weighted
//! sampling, for manual verification.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cytoprep::utils::logging::{init_logging, LogConfig};
use cytoprep::{DataPipeline, PipelineConfig, SplitFractions, CLASS_NAMES};

/// Blood cell corpus preparation: filtering, stratified splits, and
/// class-balanced sampling
#[derive(Parser, Debug)]
#[command(name = "cytoprep")]
#[command(version)]
#[command(about = "Prepare an imbalanced blood cell image corpus for training", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the pipeline and report split sizes and per-class counts
    Inspect {
        /// Path to the corpus root directory
        #[arg(short, long, default_value = "data/pbc")]
        data_dir: PathBuf,

        /// Validation fraction
        #[arg(long, default_value = "0.1")]
        val_fraction: f64,

        /// Test fraction
        #[arg(long, default_value = "0.1")]
        test_fraction: f64,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Write the split assignment to a JSON manifest
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Draw one weighted training epoch and report class exposure
    Sample {
        /// Path to the corpus root directory
        #[arg(short, long, default_value = "data/pbc")]
        data_dir: PathBuf,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Inspect {
            data_dir,
            val_fraction,
            test_fraction,
            seed,
            manifest,
        } => inspect(data_dir, val_fraction, test_fraction, seed, manifest),
        Commands::Sample { data_dir, seed } => sample(data_dir, seed),
    }
}

fn build_pipeline(data_dir: PathBuf, fractions: SplitFractions, seed: u64) -> Result<DataPipeline> {
    let config = PipelineConfig {
        fractions,
        seed,
        ..PipelineConfig::for_root(data_dir)
    };
    Ok(DataPipeline::build(config)?)
}

fn inspect(
    data_dir: PathBuf,
    val_fraction: f64,
    test_fraction: f64,
    seed: u64,
    manifest: Option<PathBuf>,
) -> Result<()> {
    let fractions = SplitFractions::new(val_fraction, test_fraction)?;
    let pipeline = build_pipeline(data_dir, fractions, seed)?;

    println!("{}", "Corpus splits".bold().green());
    println!(
        "  train: {}  val: {}  test: {}",
        pipeline.train.len().to_string().cyan(),
        pipeline.val.len().to_string().cyan(),
        pipeline.test.len().to_string().cyan()
    );
    println!();
    println!("{}", pipeline.stats());

    if let Some(path) = manifest {
        pipeline.assignment.save(&path)?;
        println!("Split manifest written to {}", path.display());
    }

    Ok(())
}

fn sample(data_dir: PathBuf, seed: u64) -> Result<()> {
    let pipeline = build_pipeline(data_dir, SplitFractions::default(), seed)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let epoch = pipeline.train_sampler.draw_epoch(&mut rng);
    let labels = pipeline.train.labels();

    let mut draws = vec![0usize; pipeline.catalog.len()];
    for &position in &epoch {
        draws[labels[position]] += 1;
    }

    println!(
        "{}",
        format!("Weighted epoch of {} draws", epoch.len()).bold().green()
    );
    for (label, count) in draws.iter().enumerate() {
        let name = pipeline
            .catalog
            .name(label)
            .unwrap_or(CLASS_NAMES.get(label).copied().unwrap_or("?"));
        let share = 100.0 * *count as f64 / epoch.len() as f64;
        println!("  {:16} {:6} draws ({:5.1}%)", name, count, share);
    }

    Ok(())
}
