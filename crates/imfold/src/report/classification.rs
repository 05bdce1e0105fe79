//! # Classification Report
//!
//! Per-class precision / recall / F1 and their averages, rendered as a
//! fixed-width text table:
//!
//! ```text
//!               precision    recall  f1-score   support
//!
//!          cat       0.50      0.50      0.50         2
//!          dog       0.67      0.67      0.67         3
//!
//!     accuracy                           0.60         5
//!    macro avg       0.58      0.58      0.58         5
//! weighted avg       0.60      0.60      0.60         5
//! ```
//!
//! Ratios with a zero denominator are reported as 0.

use crate::report::confusion::ConfusionMatrix;
use std::fmt;

const MACRO_AVG: &str = "macro avg";
const WEIGHTED_AVG: &str = "weighted avg";
const ACCURACY: &str = "accuracy";

fn ratio(
    num: usize,
    den: usize,
) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1_score(
    precision: f64,
    recall: f64,
) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Scores of a single class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    /// Class name.
    pub name: String,

    /// ``tp / (tp + fp)``.
    pub precision: f64,

    /// ``tp / (tp + fn)``.
    pub recall: f64,

    /// Harmonic mean of precision and recall.
    pub f1: f64,

    /// Number of true samples of the class.
    pub support: usize,
}

/// Averaged precision / recall / F1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AverageMetrics {
    /// Averaged precision.
    pub precision: f64,

    /// Averaged recall.
    pub recall: f64,

    /// Averaged F1.
    pub f1: f64,
}

/// Per-class and averaged classification scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Per-class scores, in class order.
    pub classes: Vec<ClassMetrics>,

    /// Fraction of correct predictions.
    pub accuracy: f64,

    /// Unweighted mean over classes.
    pub macro_avg: AverageMetrics,

    /// Support-weighted mean over classes.
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Score a confusion matrix.
    ///
    /// Classes without a name in `class_names` are named by index.
    pub fn from_confusion(
        cm: &ConfusionMatrix,
        class_names: &[String],
    ) -> Self {
        let classes: Vec<ClassMetrics> = (0..cm.num_classes())
            .map(|c| {
                let tp = cm.get(c, c);
                let precision = ratio(tp, cm.predicted_count(c));
                let recall = ratio(tp, cm.true_count(c));
                ClassMetrics {
                    name: class_names
                        .get(c)
                        .cloned()
                        .unwrap_or_else(|| c.to_string()),
                    precision,
                    recall,
                    f1: f1_score(precision, recall),
                    support: cm.true_count(c),
                }
            })
            .collect();

        let n = classes.len();
        let total = cm.total();

        let mut macro_avg = AverageMetrics::default();
        let mut weighted_avg = AverageMetrics::default();
        for m in &classes {
            macro_avg.precision += m.precision;
            macro_avg.recall += m.recall;
            macro_avg.f1 += m.f1;

            let w = m.support as f64;
            weighted_avg.precision += w * m.precision;
            weighted_avg.recall += w * m.recall;
            weighted_avg.f1 += w * m.f1;
        }
        if n > 0 {
            macro_avg.precision /= n as f64;
            macro_avg.recall /= n as f64;
            macro_avg.f1 /= n as f64;
        }
        if total > 0 {
            weighted_avg.precision /= total as f64;
            weighted_avg.recall /= total as f64;
            weighted_avg.f1 /= total as f64;
        }

        Self {
            classes,
            accuracy: cm.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }

    /// Total support over all classes.
    pub fn total_support(&self) -> usize {
        self.classes.iter().map(|m| m.support).sum()
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let w = self
            .classes
            .iter()
            .map(|m| m.name.len())
            .max()
            .unwrap_or(0)
            .max(WEIGHTED_AVG.len());

        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        let row = |f: &mut fmt::Formatter<'_>, name: &str, p: f64, r: f64, f1: f64, s: usize| {
            writeln!(f, "{name:>w$}  {p:>9.2} {r:>9.2} {f1:>9.2} {s:>9}")
        };

        for m in &self.classes {
            row(f, &m.name, m.precision, m.recall, m.f1, m.support)?;
        }
        writeln!(f)?;

        let total = self.total_support();
        writeln!(
            f,
            "{ACCURACY:>w$}  {:>9} {:>9} {:>9.2} {total:>9}",
            "", "", self.accuracy
        )?;
        for (name, avg) in [(MACRO_AVG, self.macro_avg), (WEIGHTED_AVG, self.weighted_avg)] {
            row(f, name, avg.precision, avg.recall, avg.f1, total)?;
        }
        Ok(())
    }
}
