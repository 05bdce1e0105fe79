#![warn(missing_docs)]
//!# imfold - Fine-tune Image Models on Folder Datasets
//!
//! ## Notable Components
//!
//! * [`cache`] - pretrained weight download cache.
//! * [`data`] - class-folder datasets.
//!   * [`data::index`] - image/label index of a class-folder tree.
//!   * [`data::split`] - stratified train/val/test splitting.
//!   * [`data::transform`] - resize / augmentation / normalization.
//!   * [`data::dataset`] - `burn` dataset over an index.
//!   * [`data::batcher`] - `burn` batcher for classification batches.
//! * [`models`] - model families.
//!   * [`models::resnet`] - `ResNet` with a replaceable classifier head.
//! * [`training`] - epoch runners and the fine-tuning pipeline.
//! * [`report`] - confusion matrix, classification report, plots.

/// Test-only macro import.
#[cfg(test)]
#[allow(unused_imports)]
#[macro_use]
extern crate hamcrest;

pub mod cache;
pub mod data;
pub mod errors;
pub mod models;
pub mod report;
pub mod training;
