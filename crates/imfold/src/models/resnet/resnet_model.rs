//! # `ResNet` Core Model
//!
//! [`ResNetConfig`] implements [`Config`], and provides
//! [`ResNetConfig::init`] to initialize a [`ResNet`].
//!
//! [`ResNet`] implements [`Module`], and provides
//! [`ResNet::forward`]; the ``fc`` layer of the reference architecture
//! is replaced by a [`ClassifierHead`].

use crate::models::resnet::conv_norm::{ConvNorm2d, ConvNorm2dConfig};
use crate::models::resnet::head::{ClassifierHead, ClassifierHeadConfig};
use crate::models::resnet::layer_block::{LayerBlock, LayerBlockConfig};
use burn::module::Module;
use burn::nn::PaddingConfig2d;
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::prelude::{Backend, Config, Tensor};
use burn::tensor::activation::relu;

/// ResNet-18 block depths.
pub const RESNET18_BLOCKS: [usize; 4] = [2, 2, 2, 2];
/// ResNet-34 block depths.
pub const RESNET34_BLOCKS: [usize; 4] = [3, 4, 6, 3];

/// Stem output width; layer widths double from here.
const STEM_PLANES: usize = 64;

/// [`ResNet`] Config.
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Layer block depths.
    pub layers: [usize; 4],

    /// Number of classification classes.
    pub num_classes: usize,

    /// Hidden width of the classifier head.
    #[config(default = 512)]
    pub head_hidden: usize,

    /// Dropout probability of the classifier head.
    #[config(default = 0.5)]
    pub head_dropout: f64,
}

impl ResNetConfig {
    /// A ResNet-18 config.
    pub fn resnet18(num_classes: usize) -> Self {
        Self::new(RESNET18_BLOCKS, num_classes)
    }

    /// A ResNet-34 config.
    pub fn resnet34(num_classes: usize) -> Self {
        Self::new(RESNET34_BLOCKS, num_classes)
    }

    /// The layer configs.
    pub fn layer_configs(&self) -> Vec<LayerBlockConfig> {
        let mut in_planes = STEM_PLANES;
        self.layers
            .iter()
            .enumerate()
            .map(|(idx, &num_blocks)| {
                let out_planes = STEM_PLANES << idx;
                let stride = if idx == 0 { 1 } else { 2 };
                let layer = LayerBlockConfig::build(num_blocks, in_planes, out_planes, stride);
                in_planes = out_planes;
                layer
            })
            .collect()
    }

    /// Number of backbone output features.
    pub fn num_features(&self) -> usize {
        STEM_PLANES << (self.layers.len() - 1)
    }

    /// The head config.
    pub fn head_config(&self) -> ClassifierHeadConfig {
        ClassifierHeadConfig::new(self.num_features(), self.num_classes)
            .with_hidden(self.head_hidden)
            .with_dropout(self.head_dropout)
    }

    /// Initialize a [`ResNet`] model.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ResNet<B> {
        ResNet {
            // 7x7 conv, 64, /2
            stem: ConvNorm2dConfig::square([3, STEM_PLANES], 7, 2).init(device),
            // 3x3 maxpool, /2
            maxpool: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),

            layers: self
                .layer_configs()
                .into_iter()
                .map(|c| c.init(device))
                .collect(),

            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: self.head_config().init(device),
        }
    }
}

/// `ResNet` model.
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    /// Input conv/norm.
    pub stem: ConvNorm2d<B>,

    /// Input pool.
    pub maxpool: MaxPool2d,

    /// Residual layers.
    pub layers: Vec<LayerBlock<B>>,

    /// Head pooling.
    pub avgpool: AdaptiveAvgPool2d,

    /// Classifier head.
    pub head: ClassifierHead<B>,
}

impl<B: Backend> ResNet<B> {
    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.head.num_classes()
    }

    /// Backbone features.
    ///
    /// Maps ``[batch, 3, height, width]`` images to ``[batch, features]``.
    pub fn features(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        // Prep block
        let x = relu(self.stem.forward(input));
        let x = self.maxpool.forward(x);

        // Residual blocks
        let x = self.layers.iter().fold(x, |x, layer| layer.forward(x));

        // Reshape [B, C, 1, 1] -> [B, C]
        self.avgpool.forward(x).flatten(1, 3)
    }

    /// `ResNet` forward pass.
    ///
    /// Maps ``[batch, 3, height, width]`` images to ``[batch, num_classes]`` logits.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        self.head.forward(self.features(input))
    }

    /// Replace the classifier head.
    pub fn with_head(
        self,
        config: &ClassifierHeadConfig,
    ) -> Self {
        let device = self.head.fc1.weight.device();
        Self {
            head: config.init(&device),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_layer_configs() {
        let config = ResNetConfig::resnet34(10);
        let layers = config.layer_configs();
        assert_eq!(
            layers.iter().map(|l| l.len()).collect::<Vec<_>>(),
            vec![3, 4, 6, 3]
        );
        assert_eq!(
            layers.iter().map(|l| l.out_planes()).collect::<Vec<_>>(),
            vec![64, 128, 256, 512]
        );
        assert_eq!(layers[0].blocks[0].stride, 1);
        assert_eq!(layers[1].blocks[0].stride, 2);
        assert_eq!(layers[1].blocks[0].in_planes, 64);
        assert_eq!(config.num_features(), 512);

        let head = config.head_config();
        assert_eq!(head.in_features, 512);
        assert_eq!(head.num_classes, 10);
        assert_eq!(head.hidden, 512);
    }

    #[test]
    fn test_resnet18_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let model: ResNet<B> = ResNetConfig::resnet18(5).with_head_hidden(16).init(&device);
        assert_eq!(model.layers.len(), 4);
        assert_eq!(model.num_classes(), 5);

        let images = Tensor::ones([2, 3, 64, 64], &device);
        assert_eq!(model.features(images.clone()).dims(), [2, 512]);
        assert_eq!(model.forward(images).dims(), [2, 5]);
    }

    #[test]
    fn test_with_head() {
        type B = NdArray<f32>;
        let device = Default::default();

        let model: ResNet<B> = ResNetConfig::resnet18(1000).with_head_hidden(8).init(&device);
        let model = model.with_head(&ClassifierHeadConfig::new(512, 7).with_hidden(8));
        assert_eq!(model.num_classes(), 7);
    }
}
