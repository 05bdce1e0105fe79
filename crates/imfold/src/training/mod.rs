//! # Training
//!
//! * [`config`] - the run config.
//! * [`epoch`] - per-epoch train / validation / prediction runners.
//! * [`history`] - per-epoch metrics.
//! * [`pipeline`] - the end-to-end fine-tuning job.

pub mod config;
pub mod epoch;
pub mod history;
pub mod pipeline;

pub use config::{NO_PRETRAINED, TrainingConfig};
pub use epoch::{Predictions, TrainEpochOptions, predict, train_epoch, validate};
pub use history::{EpochRecord, EpochStats, TrainingHistory};
pub use pipeline::{TrainingSummary, run_training};
