//! # Classification Batcher

use crate::data::dataset::ImageItem;
use crate::data::transform::{IMAGENET_MEAN, IMAGENET_STD};
use burn::data::dataloader::batcher::Batcher;
use burn::prelude::{Backend, Int, Shape, Tensor, TensorData};

/// Per-channel normalizer.
///
/// Maps ``[0, 1]`` pixels to ``(x - mean) / std``.
#[derive(Clone, Debug)]
pub struct Normalizer<B: Backend> {
    mean: Tensor<B, 4>,
    std: Tensor<B, 4>,
}

impl<B: Backend> Normalizer<B> {
    /// Build a normalizer with the given channel statistics.
    pub fn new(
        mean: [f32; 3],
        std: [f32; 3],
        device: &B::Device,
    ) -> Self {
        let mean = Tensor::<B, 1>::from_floats(mean, device).reshape([1, 3, 1, 1]);
        let std = Tensor::<B, 1>::from_floats(std, device).reshape([1, 3, 1, 1]);
        Self { mean, std }
    }

    /// Normalize a ``[batch, 3, height, width]`` tensor.
    pub fn normalize(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        (input - self.mean.clone()) / self.std.clone()
    }
}

/// A batch of images and class targets.
#[derive(Clone, Debug)]
pub struct ClassificationBatch<B: Backend> {
    /// ``[batch, 3, height, width]`` normalized images.
    pub images: Tensor<B, 4>,

    /// ``[batch]`` class labels.
    pub targets: Tensor<B, 1, Int>,
}

/// Collates [`ImageItem`]s into [`ClassificationBatch`]es.
#[derive(Clone, Debug, Default)]
pub struct ClassificationBatcher {
    mean: Option<[f32; 3]>,
    std: Option<[f32; 3]>,
}

impl ClassificationBatcher {
    /// A batcher using the `ImageNet` statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the normalization statistics.
    pub fn with_stats(
        self,
        mean: [f32; 3],
        std: [f32; 3],
    ) -> Self {
        Self {
            mean: Some(mean),
            std: Some(std),
        }
    }

    fn normalizer<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Normalizer<B> {
        Normalizer::new(
            self.mean.unwrap_or(IMAGENET_MEAN),
            self.std.unwrap_or(IMAGENET_STD),
            device,
        )
    }
}

impl<B: Backend> Batcher<B, ImageItem, ClassificationBatch<B>> for ClassificationBatcher {
    fn batch(
        &self,
        items: Vec<ImageItem>,
        device: &B::Device,
    ) -> ClassificationBatch<B> {
        let batch_size = items.len();

        let targets: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets, [batch_size]).convert::<B::IntElem>(),
            device,
        );

        // Placeholders become zeros, the normalized dataset mean.
        let keep: Vec<f32> = items
            .iter()
            .map(|item| if item.placeholder { 0.0 } else { 1.0 })
            .collect();
        let keep = Tensor::<B, 1>::from_data(
            TensorData::new(keep, [batch_size]).convert::<B::FloatElem>(),
            device,
        )
        .reshape([batch_size, 1, 1, 1]);

        let images = items
            .into_iter()
            .map(|item| {
                let data = TensorData::new(item.pixels, Shape::new([item.height, item.width, 3]));
                // [H, W, C] -> [C, H, W]
                Tensor::<B, 3>::from_data(data.convert::<B::FloatElem>(), device).permute([2, 0, 1])
                    / 255.0
            })
            .collect::<Vec<_>>();

        let images = Tensor::stack(images, 0);
        let images = self.normalizer::<B>(device).normalize(images) * keep;

        ClassificationBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use hamcrest::prelude::*;

    #[test]
    fn test_batch() {
        type B = NdArray<f32>;
        let device = Default::default();

        let items = vec![
            ImageItem {
                pixels: vec![255; 2 * 2 * 3],
                height: 2,
                width: 2,
                label: 1,
                placeholder: false,
            },
            ImageItem {
                pixels: vec![0; 2 * 2 * 3],
                height: 2,
                width: 2,
                label: 0,
                placeholder: false,
            },
        ];

        let batch: ClassificationBatch<B> =
            Batcher::<B, _, _>::batch(&ClassificationBatcher::new(), items, &device);

        assert_eq!(batch.images.dims(), [2, 3, 2, 2]);
        assert_eq!(batch.targets.dims(), [2]);

        let targets: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        assert_eq!(targets, vec![1, 0]);

        let pixels: Vec<f32> = batch.images.into_data().iter::<f32>().collect();
        // item 0, channel 0: (1.0 - 0.485) / 0.229
        assert_that!(pixels[0] as f64, close_to(2.2489, 1e-3));
        // item 0, channel 2: (1.0 - 0.406) / 0.225
        assert_that!(pixels[8] as f64, close_to(2.64, 1e-3));
        // item 1, channel 0: (0.0 - 0.485) / 0.229
        assert_that!(pixels[12] as f64, close_to(-2.1179, 1e-3));
    }

    #[test]
    fn test_placeholder_batches_as_zeros() {
        type B = NdArray<f32>;
        let device = Default::default();

        let items = vec![
            ImageItem::from_rgb(image::RgbImage::new(2, 2), 0),
            ImageItem::placeholder(image::RgbImage::new(2, 2), 1),
        ];

        let batch: ClassificationBatch<B> =
            Batcher::<B, _, _>::batch(&ClassificationBatcher::new(), items, &device);
        assert_eq!(batch.images.dims(), [2, 3, 2, 2]);

        let pixels: Vec<f32> = batch.images.into_data().iter::<f32>().collect();
        // A loaded black image normalizes below zero.
        assert_that!(pixels[0] as f64, close_to(-2.1179, 1e-3));
        // The placeholder is exactly zero.
        assert!(pixels[12..].iter().all(|&p| p == 0.0));

        let targets: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        assert_eq!(targets, vec![0, 1]);
    }

    #[test]
    fn test_custom_stats() {
        type B = NdArray<f32>;
        let device = Default::default();

        let items = vec![ImageItem {
            pixels: vec![255; 3],
            height: 1,
            width: 1,
            label: 0,
            placeholder: false,
        }];

        let batcher = ClassificationBatcher::new().with_stats([0.0; 3], [1.0; 3]);
        let batch: ClassificationBatch<B> = Batcher::<B, _, _>::batch(&batcher, items, &device);

        let pixels: Vec<f32> = batch.images.into_data().iter::<f32>().collect();
        for p in pixels {
            assert_that!(p as f64, close_to(1.0, 1e-6));
        }
    }
}
