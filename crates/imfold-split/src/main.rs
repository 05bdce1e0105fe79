use clap::Parser;
use imfold::data::split::{
    DEFAULT_SPLIT_SEED, DEFAULT_TRAIN_RATIO, DEFAULT_VAL_RATIO, SplitDirs, SplitRatios,
    split_dataset,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Split a class-folder image dataset into train / val / test trees.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base directory; holds the source folder and receives the splits.
    #[arg(long, default_value = "natural_images")]
    base_dir: PathBuf,

    /// Source folder name under the base directory.
    #[arg(long, default_value = "raw")]
    source: String,

    /// Fraction of each class copied to "train/".
    #[arg(long, default_value_t = DEFAULT_TRAIN_RATIO)]
    train_ratio: f64,

    /// Fraction of each class copied to "val/"; the rest goes to "test/".
    #[arg(long, default_value_t = DEFAULT_VAL_RATIO)]
    val_ratio: f64,

    /// Random seed for the per-class shuffle.
    #[arg(short, long, default_value_t = DEFAULT_SPLIT_SEED)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let source = args.base_dir.join(&args.source);
    let dirs = SplitDirs::under(&args.base_dir);
    let ratios = SplitRatios::new(args.train_ratio, args.val_ratio)?;

    let report = split_dataset(&source, &dirs, &ratios, args.seed)?;

    let (train, val, test) = report.totals();
    tracing::info!("Dataset split complete: train={train}, val={val}, test={test}");
    tracing::info!("Train: {}", dirs.train.display());
    tracing::info!("Validation: {}", dirs.val.display());
    tracing::info!("Test: {}", dirs.test.display());

    Ok(())
}
