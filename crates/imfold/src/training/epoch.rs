//! # Epoch Runners
//!
//! [`train_epoch`] runs one optimization pass over a loader on an
//! autodiff backend; [`validate`] and [`predict`] run inference passes,
//! typically on the inner backend of a [`AutodiffModule::valid`] model.
//!
//! [`AutodiffModule::valid`]: burn::module::AutodiffModule::valid

use crate::data::batcher::ClassificationBatch;
use crate::models::resnet::ResNet;
use crate::training::history::EpochStats;
use burn::data::dataloader::DataLoader;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::{Backend, Int, Tensor};
use burn::tensor::ElementConversion;
use burn::tensor::backend::AutodiffBackend;

/// Default number of batches between progress lines.
pub const DEFAULT_LOG_INTERVAL: usize = 20;

/// Options for [`train_epoch`].
#[derive(Debug, Clone, Copy)]
pub struct TrainEpochOptions {
    /// Optimizer learning rate.
    pub learning_rate: f64,

    /// Batch size of the loader; used for progress reporting.
    pub batch_size: usize,

    /// Batches between progress lines; 0 disables them.
    pub log_interval: usize,
}

impl TrainEpochOptions {
    /// Options with the default log interval.
    pub fn new(
        learning_rate: f64,
        batch_size: usize,
    ) -> Self {
        Self {
            learning_rate,
            batch_size,
            log_interval: DEFAULT_LOG_INTERVAL,
        }
    }
}

/// Running loss / accuracy sums over a pass.
#[derive(Debug, Default, Clone, Copy)]
struct EpochAccumulator {
    loss_sum: f64,
    batches: usize,
    correct: usize,
    total: usize,
}

impl EpochAccumulator {
    /// Add one batch; returns the batch loss.
    fn update<B: Backend>(
        &mut self,
        loss: Tensor<B, 1>,
        logits: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> f64 {
        let batch_loss = loss.into_scalar().elem::<f64>();

        self.loss_sum += batch_loss;
        self.batches += 1;
        self.total += targets.dims()[0];
        self.correct += count_correct(logits, targets);

        batch_loss
    }

    fn stats(&self) -> EpochStats {
        EpochStats {
            loss: if self.batches > 0 {
                self.loss_sum / self.batches as f64
            } else {
                f64::NAN
            },
            accuracy: if self.total > 0 {
                100.0 * self.correct as f64 / self.total as f64
            } else {
                0.0
            },
        }
    }
}

/// Class predictions for a ``[batch, classes]`` logits tensor.
pub fn argmax_predictions<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    // argmax(1) is [batch, 1].
    logits.argmax(1).flatten::<1>(0, 1)
}

/// Number of rows whose argmax matches the target.
pub fn count_correct<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> usize {
    let correct: i64 = argmax_predictions(logits)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

/// Cross-entropy loss and logits for a batch.
fn forward_loss<B: Backend>(
    model: &ResNet<B>,
    batch: ClassificationBatch<B>,
) -> (Tensor<B, 1>, Tensor<B, 2>, Tensor<B, 1, Int>) {
    let logits = model.forward(batch.images);
    let loss = CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits.clone(), batch.targets.clone());
    (loss, logits, batch.targets)
}

/// Run one training epoch.
///
/// Every batch is forwarded, scored with cross-entropy, and followed by
/// an optimizer step. Returns the updated model and the epoch stats.
pub fn train_epoch<B, O>(
    mut model: ResNet<B>,
    loader: &dyn DataLoader<B, ClassificationBatch<B>>,
    optimizer: &mut O,
    options: &TrainEpochOptions,
) -> (ResNet<B>, EpochStats)
where
    B: AutodiffBackend,
    O: Optimizer<ResNet<B>, B>,
{
    let num_batches = loader.num_items().div_ceil(options.batch_size.max(1));
    let mut acc = EpochAccumulator::default();

    for (idx, batch) in loader.iter().enumerate() {
        let (loss, logits, targets) = forward_loss(&model, batch);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);

        let batch_loss = acc.update(loss, logits.detach(), targets);

        model = optimizer.step(options.learning_rate, model, grads);

        let k = idx + 1;
        if options.log_interval > 0 && k % options.log_interval == 0 {
            tracing::info!("Batch: {k}/{num_batches}, Loss: {batch_loss:.4}");
        }
    }

    (model, acc.stats())
}

/// Run one evaluation pass.
///
/// Returns NaN loss and 0 accuracy for an empty loader.
pub fn validate<B: Backend>(
    model: &ResNet<B>,
    loader: &dyn DataLoader<B, ClassificationBatch<B>>,
) -> EpochStats {
    let mut acc = EpochAccumulator::default();
    for batch in loader.iter() {
        let (loss, logits, targets) = forward_loss(model, batch);
        acc.update(loss, logits, targets);
    }
    acc.stats()
}

/// True labels and predicted labels over a loader, in loader order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    /// True labels.
    pub labels: Vec<usize>,

    /// Predicted labels.
    pub predictions: Vec<usize>,
}

impl Predictions {
    /// Number of predictions.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Are there no predictions?
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn int_values<B: Backend>(tensor: Tensor<B, 1, Int>) -> Vec<usize> {
    tensor.into_data().iter::<i64>().map(|v| v as usize).collect()
}

/// Collect true and predicted labels over a loader.
pub fn predict<B: Backend>(
    model: &ResNet<B>,
    loader: &dyn DataLoader<B, ClassificationBatch<B>>,
) -> Predictions {
    let mut out = Predictions::default();
    for batch in loader.iter() {
        let logits = model.forward(batch.images);
        out.predictions.extend(int_values(argmax_predictions(logits)));
        out.labels.extend(int_values(batch.targets));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::ClassificationBatcher;
    use crate::data::dataset::ImageItem;
    use crate::models::resnet::ResNetConfig;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataloader::DataLoaderBuilder;
    use burn::data::dataset::InMemDataset;
    use burn::module::AutodiffModule;
    use burn::optim::AdamConfig;
    use burn::tensor::{Distribution, TensorData};
    use hamcrest::prelude::*;
    use std::sync::Arc;

    type B = NdArray<f32>;
    type TB = Autodiff<B>;

    fn solid_items(count: usize) -> Vec<ImageItem> {
        (0..count)
            .map(|i| {
                let label = i % 2;
                let value = if label == 0 { 30 } else { 220 };
                ImageItem {
                    pixels: vec![value; 32 * 32 * 3],
                    height: 32,
                    width: 32,
                    label,
                    placeholder: false,
                }
            })
            .collect()
    }

    fn loader<Q: Backend>(
        items: Vec<ImageItem>,
        batch_size: usize,
    ) -> Arc<dyn DataLoader<Q, ClassificationBatch<Q>>> {
        DataLoaderBuilder::new(ClassificationBatcher::new())
            .batch_size(batch_size)
            .build(InMemDataset::new(items))
    }

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let logits = Tensor::<B, 2>::from_data(
            TensorData::from([[0.1, 0.9], [0.8, 0.2], [0.3, 0.7]]),
            &device,
        );
        let targets = Tensor::<B, 1, Int>::from_data(TensorData::from([1, 1, 1]), &device);

        assert_eq!(count_correct(logits, targets), 2);
    }

    #[test]
    fn test_empty_accumulator() {
        let stats = EpochAccumulator::default().stats();
        assert!(stats.loss.is_nan());
        assert_eq!(stats.accuracy, 0.0);
    }

    #[test]
    fn test_train_validate_predict() {
        let device = Default::default();
        let model: ResNet<TB> = ResNetConfig::resnet18(2)
            .with_head_hidden(16)
            .init(&device);
        let mut optim = AdamConfig::new().init::<TB, ResNet<TB>>();

        let train = loader::<TB>(solid_items(6), 4);
        let options = TrainEpochOptions {
            log_interval: 1,
            ..TrainEpochOptions::new(1e-3, 4)
        };

        let (model, stats) = train_epoch(model, train.as_ref(), &mut optim, &options);
        assert!(stats.loss.is_finite());
        assert!((0.0..=100.0).contains(&stats.accuracy));

        let model = model.valid();
        let valid = loader::<B>(solid_items(5), 2);

        let stats = validate(&model, valid.as_ref());
        assert!(stats.loss.is_finite());
        assert!((0.0..=100.0).contains(&stats.accuracy));

        let predictions = predict(&model, valid.as_ref());
        assert_eq!(predictions.len(), 5);
        assert_eq!(predictions.labels, vec![0, 1, 0, 1, 0]);
        assert!(predictions.predictions.iter().all(|&p| p < 2));

        let agreement = predictions
            .labels
            .iter()
            .zip(&predictions.predictions)
            .filter(|(a, b)| a == b)
            .count();
        assert_that!(
            stats.accuracy,
            close_to(100.0 * agreement as f64 / 5.0, 1e-9)
        );
    }

    fn logits<Q: Backend>(
        model: &ResNet<Q>,
        input: Tensor<Q, 4>,
    ) -> Vec<f32> {
        model.forward(input).into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_dropout_only_in_training() {
        let device = Default::default();
        let model: ResNet<TB> = ResNetConfig::resnet18(3)
            .with_head_hidden(16)
            .init(&device);

        let input = Tensor::<B, 4>::random([2, 3, 32, 32], Distribution::Default, &device);

        // Evaluation mode is deterministic.
        let eval = model.valid();
        let first = logits(&eval, input.clone());
        assert_eq!(first, logits(&eval, input.clone()));

        // The autodiff model drops head activations.
        let input = Tensor::<TB, 4>::from_inner(input);
        let a = logits(&model, input.clone());
        let b = logits(&model, input);
        assert_eq!(a.len(), 6);
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_empty() {
        let device = Default::default();
        let model: ResNet<B> = ResNetConfig::resnet18(2)
            .with_head_hidden(8)
            .init(&device);

        let empty = loader::<B>(vec![], 2);
        let stats = validate(&model, empty.as_ref());
        assert!(stats.loss.is_nan());
        assert_eq!(stats.accuracy, 0.0);
        assert!(predict(&model, empty.as_ref()).is_empty());
    }
}
