//! # Training History

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Loss and accuracy of one pass over a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Mean per-batch loss.
    pub loss: f64,

    /// Accuracy, in percent.
    pub accuracy: f64,
}

/// One row of per-epoch metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Epoch number, starting at 1.
    pub epoch: usize,

    /// Training stats.
    pub train: EpochStats,

    /// Validation stats.
    pub valid: EpochStats,

    /// Wall-clock seconds spent on the epoch.
    pub seconds: f64,
}

/// Per-epoch training history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Epoch records, in order.
    pub epochs: Vec<EpochRecord>,
}

impl TrainingHistory {
    /// Append an epoch.
    pub fn push(
        &mut self,
        record: EpochRecord,
    ) {
        self.epochs.push(record);
    }

    /// Number of recorded epochs.
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Is the history empty?
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Training losses, per epoch.
    pub fn train_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.train.loss).collect()
    }

    /// Validation losses, per epoch.
    pub fn valid_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.valid.loss).collect()
    }

    /// Training accuracies, per epoch.
    pub fn train_accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.train.accuracy).collect()
    }

    /// Validation accuracies, per epoch.
    pub fn valid_accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.valid.accuracy).collect()
    }

    /// The epoch with the highest validation accuracy; earliest wins ties.
    pub fn best_valid_epoch(&self) -> Option<&EpochRecord> {
        self.epochs.iter().fold(None, |best: Option<&EpochRecord>, e| match best {
            Some(b) if b.valid.accuracy >= e.valid.accuracy => Some(b),
            _ => Some(e),
        })
    }

    /// Write the history as pretty JSON.
    pub fn save_json(
        &self,
        path: &Path,
    ) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        epoch: usize,
        train_acc: f64,
        valid_acc: f64,
    ) -> EpochRecord {
        EpochRecord {
            epoch,
            train: EpochStats {
                loss: 1.0 / epoch as f64,
                accuracy: train_acc,
            },
            valid: EpochStats {
                loss: 2.0 / epoch as f64,
                accuracy: valid_acc,
            },
            seconds: 1.5,
        }
    }

    #[test]
    fn test_history() {
        let mut history = TrainingHistory::default();
        assert!(history.is_empty());
        assert!(history.best_valid_epoch().is_none());

        history.push(record(1, 50.0, 40.0));
        history.push(record(2, 60.0, 70.0));
        history.push(record(3, 70.0, 70.0));

        assert_eq!(history.len(), 3);
        assert_eq!(history.train_losses(), vec![1.0, 0.5, 1.0 / 3.0]);
        assert_eq!(history.valid_accuracies(), vec![40.0, 70.0, 70.0]);
        assert_eq!(history.train_accuracies(), vec![50.0, 60.0, 70.0]);
        assert_eq!(history.valid_losses()[0], 2.0);
        assert_eq!(history.best_valid_epoch().unwrap().epoch, 2);
    }

    #[test]
    fn test_save_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");

        let mut history = TrainingHistory::default();
        history.push(record(1, 50.0, 40.0));
        history.save_json(&path).unwrap();

        let loaded: TrainingHistory =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, history);
    }
}
