//! # `ConvNorm` Module
//!
//! A [`ConvNorm2d`] module is a [`Conv2d`] layer followed by a [`BatchNorm`] layer.

use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::prelude::{Backend, Tensor};

/// [`ConvNorm2d`] Config.
#[derive(Config, Debug)]
pub struct ConvNorm2dConfig {
    /// The [`Conv2d`] config.
    pub conv: Conv2dConfig,
}

impl From<Conv2dConfig> for ConvNorm2dConfig {
    fn from(conv: Conv2dConfig) -> Self {
        Self { conv }
    }
}

impl ConvNorm2dConfig {
    /// A bias-free square convolution with "same"-style padding.
    ///
    /// # Arguments
    ///
    /// - `channels`: ``[in_channels, out_channels]``.
    /// - `kernel_size`: square kernel size; padding is ``kernel_size / 2``.
    /// - `stride`: square stride.
    pub fn square(
        channels: [usize; 2],
        kernel_size: usize,
        stride: usize,
    ) -> Self {
        let padding = kernel_size / 2;
        Conv2dConfig::new(channels, [kernel_size, kernel_size])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_bias(false)
            .into()
    }

    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.conv.channels[0]
    }

    /// Number of output channels.
    pub fn out_channels(&self) -> usize {
        self.conv.channels[1]
    }

    /// Initialize a [`ConvNorm2d`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> ConvNorm2d<B> {
        ConvNorm2d {
            norm: BatchNormConfig::new(self.out_channels()).init(device),
            conv: self.conv.init(device),
        }
    }
}

/// Grouped [`Conv2d`] and [`BatchNorm`] layer.
#[derive(Module, Debug)]
pub struct ConvNorm2d<B: Backend> {
    /// Internal Conv2d layer.
    pub conv: Conv2d<B>,

    /// Internal Norm Layer.
    pub norm: BatchNorm<B, 2>,
}

impl<B: Backend> ConvNorm2d<B> {
    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.conv.weight.dims()[1] * self.conv.groups
    }

    /// Number of output channels.
    pub fn out_channels(&self) -> usize {
        self.conv.weight.dims()[0]
    }

    /// The conv stride.
    pub fn stride(&self) -> usize {
        self.conv.stride[0]
    }

    /// Forward Pass.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let x = self.conv.forward(input);

        self.norm.forward(x)
    }
}
