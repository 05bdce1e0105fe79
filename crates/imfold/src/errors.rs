//! # Dataset Errors

use std::path::PathBuf;

/// Errors raised while indexing or splitting class-folder datasets.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// A dataset directory does not exist.
    #[error("dataset directory '{}' does not exist", .0.display())]
    MissingRoot(PathBuf),

    /// The raw dataset to split does not exist.
    #[error("Source directory '{}' does not exist! Please create the directory and add your dataset.", .0.display())]
    MissingSource(PathBuf),

    /// The dataset root exists, but is not a directory.
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Split ratios are outside `[0, 1]` or sum past 1.
    #[error("invalid split ratios: train={train}, val={val}")]
    InvalidRatios {
        /// Training fraction.
        train: f64,
        /// Validation fraction.
        val: f64,
    },

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A directory walk failed.
    #[error("failed to walk '{}': {source}", path.display())]
    Walk {
        /// The directory being walked.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DatasetError {
    /// Wrap an [`std::io::Error`] with a context message.
    pub fn io<S: Into<String>>(
        context: S,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
