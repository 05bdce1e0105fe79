//! # Evaluation Reports
//!
//! * [`confusion`] - multi-class confusion matrix.
//! * [`classification`] - precision / recall / F1 text report.
//! * [`plots`] - training curve and confusion matrix SVGs.

pub mod classification;
pub mod confusion;
pub mod plots;

pub use classification::ClassificationReport;
pub use confusion::ConfusionMatrix;
pub use plots::{plot_confusion_matrix, plot_training_curves};
