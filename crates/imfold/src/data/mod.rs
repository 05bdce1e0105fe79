//! # Class-Folder Datasets

pub mod batcher;
pub mod dataset;
pub mod index;
pub mod split;
pub mod transform;
