//! # Confusion Matrix

/// Multi-class confusion matrix.
///
/// ``counts[t][p]`` is the number of samples with true class ``t``
/// predicted as class ``p``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// An all-zero matrix.
    pub fn zeros(num_classes: usize) -> Self {
        Self {
            counts: vec![vec![0; num_classes]; num_classes],
        }
    }

    /// Count paired true / predicted labels.
    ///
    /// # Panics
    ///
    /// If the slices differ in length, or a label is ``>= num_classes``.
    pub fn from_predictions(
        labels: &[usize],
        predictions: &[usize],
        num_classes: usize,
    ) -> Self {
        assert_eq!(
            labels.len(),
            predictions.len(),
            "labels and predictions differ in length"
        );

        let mut cm = Self::zeros(num_classes);
        for (&t, &p) in labels.iter().zip(predictions) {
            assert!(
                t < num_classes && p < num_classes,
                "label out of range: true={t}, predicted={p}, num_classes={num_classes}"
            );
            cm.counts[t][p] += 1;
        }
        cm
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    /// The ``[true][predicted]`` counts.
    pub fn counts(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// Count of true class `t` predicted as `p`.
    pub fn get(
        &self,
        t: usize,
        p: usize,
    ) -> usize {
        self.counts[t][p]
    }

    /// Total samples.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Correctly classified samples.
    pub fn correct(&self) -> usize {
        (0..self.num_classes()).map(|i| self.counts[i][i]).sum()
    }

    /// Samples of true class `class` (the support).
    pub fn true_count(
        &self,
        class: usize,
    ) -> usize {
        self.counts[class].iter().sum()
    }

    /// Samples predicted as `class`.
    pub fn predicted_count(
        &self,
        class: usize,
    ) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    /// Largest cell.
    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Fraction of correct predictions; 0 when empty.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct() as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_predictions() {
        let labels = [0, 0, 1, 1, 2, 2, 2];
        let preds = [0, 1, 1, 1, 2, 0, 2];
        let cm = ConfusionMatrix::from_predictions(&labels, &preds, 3);

        assert_eq!(cm.num_classes(), 3);
        assert_eq!(
            cm.counts(),
            &[vec![1, 1, 0], vec![0, 2, 0], vec![1, 0, 2]]
        );
        assert_eq!(cm.get(2, 0), 1);
        assert_eq!(cm.total(), 7);
        assert_eq!(cm.correct(), 5);
        assert_eq!(cm.true_count(2), 3);
        assert_eq!(cm.predicted_count(0), 2);
        assert_eq!(cm.max_count(), 2);
        assert_eq!(cm.accuracy(), 5.0 / 7.0);
    }

    #[test]
    fn test_empty() {
        let cm = ConfusionMatrix::from_predictions(&[], &[], 2);
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.accuracy(), 0.0);
        assert_eq!(cm.max_count(), 0);
    }

    #[test]
    #[should_panic(expected = "label out of range")]
    fn test_out_of_range() {
        ConfusionMatrix::from_predictions(&[0, 3], &[0, 1], 2);
    }
}
