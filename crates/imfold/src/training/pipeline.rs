//! # Fine-Tuning Pipeline
//!
//! [`run_training`] drives a full run over a ``train/ val/ test/``
//! dataset tree and writes every artifact into a fresh
//! ``output_<YYYYmmdd_HHMMSS>`` directory:
//!
//! * ``config.json`` - the [`TrainingConfig`].
//! * ``best_model.mpk`` - the model with the best validation accuracy.
//! * ``model.mpk`` - the model after the last epoch.
//! * ``history.json`` - per-epoch metrics.
//! * ``training_curves.svg`` and ``confusion_matrix.svg``.
//! * ``classification_report.txt`` - test-set report of the final model.

use crate::cache::disk::DiskCacheConfig;
use crate::data::batcher::{ClassificationBatch, ClassificationBatcher};
use crate::data::dataset::ClassFolderDataset;
use crate::data::index::ImageFolderIndex;
use crate::data::transform::ImageTransformConfig;
use crate::models::resnet::{ResNet, ResNetConfig, lookup_pretrained};
use crate::report::classification::ClassificationReport;
use crate::report::confusion::ConfusionMatrix;
use crate::report::plots::{plot_confusion_matrix, plot_training_curves};
use crate::training::config::TrainingConfig;
use crate::training::epoch::{TrainEpochOptions, predict, train_epoch, validate};
use crate::training::history::{EpochRecord, TrainingHistory};
use anyhow::{Context, bail};
use burn::config::Config;
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::module::{AutodiffModule, Module};
use burn::optim::AdamConfig;
use burn::prelude::Backend;
use burn::record::CompactRecorder;
use burn::tensor::backend::AutodiffBackend;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// File stem of the best-validation checkpoint.
pub const BEST_MODEL_NAME: &str = "best_model";

/// File stem of the final model.
pub const FINAL_MODEL_NAME: &str = "model";

/// Name of the classification report file.
pub const REPORT_FILE_NAME: &str = "classification_report.txt";

/// Name of the history file.
pub const HISTORY_FILE_NAME: &str = "history.json";

/// Name of the saved run config.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// The ``output_<YYYYmmdd_HHMMSS>`` directory name for a start time.
pub fn output_dir_name(now: &DateTime<Local>) -> String {
    format!("output_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Create a timestamped output directory under `artifact_root`.
pub fn create_output_dir(artifact_root: &Path) -> anyhow::Result<PathBuf> {
    let dir = artifact_root.join(output_dir_name(&Local::now()));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    Ok(dir)
}

/// Save `config` as ``config.json`` under `dir`.
pub fn save_config(
    config: &TrainingConfig,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    config
        .save(&path)
        .with_context(|| format!("Failed to save config to {}", path.display()))?;
    Ok(path)
}

/// Tracks the best validation accuracy seen so far.
///
/// Starts at 0; only a strictly greater accuracy counts as an improvement,
/// so ties keep the earlier checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BestAccuracy {
    best: f64,
}

impl BestAccuracy {
    /// The best accuracy so far.
    pub fn get(&self) -> f64 {
        self.best
    }

    /// Record `accuracy`; returns true if it beats the best so far.
    pub fn improve(
        &mut self,
        accuracy: f64,
    ) -> bool {
        if accuracy > self.best {
            self.best = accuracy;
            true
        } else {
            false
        }
    }
}

/// The three split indexes of a dataset tree.
#[derive(Debug, Clone)]
pub struct SplitIndexes {
    /// ``<root>/train``.
    pub train: ImageFolderIndex,

    /// ``<root>/val``.
    pub val: ImageFolderIndex,

    /// ``<root>/test``.
    pub test: ImageFolderIndex,
}

impl SplitIndexes {
    /// Scan ``<root>/train``, ``<root>/val`` and ``<root>/test``.
    ///
    /// # Errors
    ///
    /// If a split is missing or holds no images, or the val / test
    /// classes differ from the train classes.
    pub fn scan(root: &Path) -> anyhow::Result<Self> {
        let scan = |name: &str| -> anyhow::Result<ImageFolderIndex> {
            let index = ImageFolderIndex::scan(root.join(name))?;
            if index.is_empty() {
                bail!("The {name} split at {} holds no images", index.root().display());
            }
            Ok(index)
        };

        let indexes = Self {
            train: scan("train")?,
            val: scan("val")?,
            test: scan("test")?,
        };

        for (name, index) in [("val", &indexes.val), ("test", &indexes.test)] {
            if index.classes() != indexes.train.classes() {
                bail!(
                    "The {name} classes {:?} differ from the train classes {:?}",
                    index.classes(),
                    indexes.train.classes()
                );
            }
        }

        Ok(indexes)
    }

    /// Class names, taken from the train split.
    pub fn classes(&self) -> &[String] {
        self.train.classes()
    }
}

fn build_loader<B: Backend>(
    dataset: ClassFolderDataset,
    config: &TrainingConfig,
    shuffle: bool,
    device: &B::Device,
) -> Arc<dyn DataLoader<B, ClassificationBatch<B>>> {
    let mut builder = DataLoaderBuilder::new(ClassificationBatcher::new())
        .batch_size(config.batch_size)
        .set_device(device.clone());
    if shuffle {
        builder = builder.shuffle(config.seed);
    }
    if config.num_workers > 0 {
        builder = builder.num_workers(config.num_workers);
    }
    builder.build(dataset)
}

/// Build the model: pretrained backbone when configured, fresh head.
pub fn init_model<B: Backend>(
    config: &TrainingConfig,
    num_classes: usize,
    device: &B::Device,
) -> anyhow::Result<ResNet<B>> {
    let Some(name) = config.pretrained_name() else {
        tracing::info!("Training ResNet-18 from scratch");
        return Ok(ResNetConfig::resnet18(num_classes)
            .with_head_hidden(config.head_hidden)
            .with_head_dropout(config.head_dropout)
            .init(device));
    };

    let selection = lookup_pretrained(name)?;
    let model_config = selection
        .model
        .to_config(num_classes)
        .with_head_hidden(config.head_hidden)
        .with_head_dropout(config.head_dropout);

    selection.load_model(&model_config, &DiskCacheConfig::default(), device)
}

fn save_model<B: Backend>(
    model: &ResNet<B>,
    path: PathBuf,
) -> anyhow::Result<()> {
    model
        .clone()
        .save_file(path.clone(), &CompactRecorder::new())
        .map_err(|err| anyhow::anyhow!("Failed to save model to {}: {err:?}", path.display()))
}

/// The results of a [`run_training`] call.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Directory holding the run artifacts.
    pub output_dir: PathBuf,

    /// Class names.
    pub classes: Vec<String>,

    /// Per-epoch metrics.
    pub history: TrainingHistory,

    /// Best validation accuracy, in percent.
    pub best_val_accuracy: f64,

    /// Test-set confusion matrix of the final model.
    pub confusion: ConfusionMatrix,

    /// Test-set report of the final model.
    pub report: ClassificationReport,
}

/// Run a full fine-tuning job.
///
/// # Arguments
///
/// - `config`: the run config.
/// - `artifact_root`: parent of the timestamped output directory.
/// - `device`: the training device.
pub fn run_training<B: AutodiffBackend>(
    config: &TrainingConfig,
    artifact_root: &Path,
    device: &B::Device,
) -> anyhow::Result<TrainingSummary> {
    B::seed(config.seed);

    let output_dir = create_output_dir(artifact_root)?;
    tracing::info!("Output directory: {}", output_dir.display());

    save_config(config, &output_dir)?;

    let indexes = SplitIndexes::scan(Path::new(&config.dataset_root))?;
    let classes = indexes.classes().to_vec();
    tracing::info!("Classes: {:?}", classes);
    tracing::info!("Found {} training images", indexes.train.len());
    tracing::info!("Found {} validation images", indexes.val.len());
    tracing::info!("Found {} test images", indexes.test.len());
    for (class, count) in classes.iter().zip(indexes.train.class_counts()) {
        tracing::debug!("train/{class}: {count} images");
    }

    let train_dataset = ClassFolderDataset::new(
        indexes.train,
        ImageTransformConfig::training(config.image_size),
        config.seed,
    );
    let eval_transform = ImageTransformConfig::evaluation(config.image_size);
    let val_dataset = ClassFolderDataset::new(indexes.val, eval_transform.clone(), config.seed);
    let test_dataset = ClassFolderDataset::new(indexes.test, eval_transform, config.seed);

    let train_loader = build_loader::<B>(train_dataset, config, true, device);
    let val_loader = build_loader::<B::InnerBackend>(val_dataset, config, false, device);
    let test_loader = build_loader::<B::InnerBackend>(test_dataset, config, false, device);

    let mut model: ResNet<B> = init_model(config, classes.len(), device)?;
    let mut optimizer = AdamConfig::new().init();

    let options = TrainEpochOptions {
        log_interval: config.log_interval,
        ..TrainEpochOptions::new(config.learning_rate, config.batch_size)
    };

    let mut history = TrainingHistory::default();
    let mut best = BestAccuracy::default();
    let run_start = Instant::now();

    for epoch in 1..=config.num_epochs {
        tracing::info!("Epoch {epoch}/{}", config.num_epochs);
        let start = Instant::now();

        let (trained, train) = train_epoch(model, train_loader.as_ref(), &mut optimizer, &options);
        model = trained;

        let valid = validate(&model.valid(), val_loader.as_ref());
        let seconds = start.elapsed().as_secs_f64();

        tracing::info!("Epoch {epoch} Summary:");
        tracing::info!(
            "Train Loss: {:.4}, Train Acc: {:.2}%",
            train.loss,
            train.accuracy
        );
        tracing::info!(
            "Val Loss: {:.4}, Val Acc: {:.2}%",
            valid.loss,
            valid.accuracy
        );
        tracing::info!("Time: {seconds:.2}s");

        history.push(EpochRecord {
            epoch,
            train,
            valid,
            seconds,
        });

        if best.improve(valid.accuracy) {
            save_model(&model, output_dir.join(BEST_MODEL_NAME))?;
            tracing::info!(
                "New best model ({:.2}%) saved to {}",
                best.get(),
                output_dir.join(BEST_MODEL_NAME).display()
            );
        }
    }

    let elapsed = run_start.elapsed().as_secs();
    tracing::info!("Training completed in {}m{}s", elapsed / 60, elapsed % 60);

    save_model(&model, output_dir.join(FINAL_MODEL_NAME))?;
    history.save_json(&output_dir.join(HISTORY_FILE_NAME))?;
    plot_training_curves(&history, &output_dir)?;

    tracing::info!("Evaluating on the test set");
    let predictions = predict(&model.valid(), test_loader.as_ref());
    let confusion =
        ConfusionMatrix::from_predictions(&predictions.labels, &predictions.predictions, classes.len());
    plot_confusion_matrix(&confusion, &classes, &output_dir)?;

    let report = ClassificationReport::from_confusion(&confusion, &classes);
    std::fs::write(output_dir.join(REPORT_FILE_NAME), report.to_string())
        .context("Failed to write classification report")?;
    tracing::info!("Classification report:\n{report}");

    tracing::info!("Training completed! All outputs saved to {}", output_dir.display());

    Ok(TrainingSummary {
        output_dir,
        classes,
        history,
        best_val_accuracy: best.get(),
        confusion,
        report,
    })
}
