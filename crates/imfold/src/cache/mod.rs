//! # Weight Caches
//!
//! Pretrained weights are downloaded once, then read from
//! ``~/.cache/imfold/weights/``.

pub mod disk;
pub mod weights;
