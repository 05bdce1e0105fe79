#![recursion_limit = "256"]

use burn::backend::Autodiff;
use burn::tensor::backend::AutodiffBackend;
use clap::Parser;
use imfold::data::transform::DEFAULT_IMAGE_SIZE;
use imfold::models::resnet::pretrained::describe_pretrained;
use imfold::training::{TrainingConfig, run_training};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fine-tune a pretrained ResNet on a class-folder dataset", long_about = None)]
pub struct Args {
    /// Random seed for reproducibility.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Dataset root holding "train/", "val/" and "test/" class folders.
    #[arg(long, default_value = "natural_images")]
    dataset_root: String,

    /// Directory under which the timestamped output directory is created.
    #[arg(long, default_value = ".")]
    artifact_dir: String,

    /// Batch size for processing.
    #[arg(short, long, default_value_t = 16)]
    batch_size: usize,

    /// Number of workers for data loading; 0 loads in-process.
    #[arg(long, default_value_t = 0)]
    num_workers: usize,

    /// Number of epochs to train the model.
    #[arg(long, default_value_t = 10)]
    num_epochs: usize,

    /// Learning rate.
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Square side of the model input images.
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    image_size: u32,

    /// Pretrained ResNet model.
    /// Use "list" to list all available pretrained models, "none" to train from scratch.
    #[arg(long, default_value = "resnet18.tv_in1k")]
    pretrained: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.pretrained == "list" {
        println!("Available pretrained models:");
        for line in describe_pretrained() {
            println!("{line}");
        }
        return Ok(());
    }

    #[cfg(feature = "wgpu")]
    return train::<Autodiff<burn::backend::Wgpu>>(&args);

    #[cfg(feature = "cuda")]
    return train::<Autodiff<burn::backend::Cuda>>(&args);

    #[cfg(feature = "metal")]
    return train::<Autodiff<burn::backend::Metal>>(&args);

    #[cfg(not(any(feature = "wgpu", feature = "cuda", feature = "metal")))]
    return train::<Autodiff<burn::backend::NdArray>>(&args);
}

pub fn train<B: AutodiffBackend>(args: &Args) -> anyhow::Result<()> {
    let device: B::Device = Default::default();

    let config = TrainingConfig::new()
        .with_dataset_root(args.dataset_root.clone())
        .with_seed(args.seed)
        .with_batch_size(args.batch_size)
        .with_num_workers(args.num_workers)
        .with_num_epochs(args.num_epochs)
        .with_learning_rate(args.learning_rate)
        .with_image_size(args.image_size)
        .with_pretrained(args.pretrained.clone());

    let summary = run_training::<B>(&config, Path::new(&args.artifact_dir), &device)?;

    println!("\nClassification Report:");
    println!("{}", summary.report);
    println!(
        "Best validation accuracy: {:.2}%",
        summary.best_val_accuracy
    );
    println!("Outputs: {}", summary.output_dir.display());

    Ok(())
}
