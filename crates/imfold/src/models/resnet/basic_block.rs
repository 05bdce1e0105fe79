//! # Basic Block for `ResNet`
//!
//! [`BasicBlock`] is the core `ResNet-18/34` convolution unit:
//! two 3x3 conv/norm layers with a residual connection.
//!
//! [`BasicBlockConfig`] implements [`Config`], and provides
//! [`BasicBlockConfig::init`] to initialize a [`BasicBlock`].

use crate::models::resnet::conv_norm::{ConvNorm2d, ConvNorm2dConfig};
use burn::prelude::{Backend, Config, Module, Tensor};
use burn::tensor::activation::relu;

/// [`BasicBlock`] Config.
#[derive(Config, Debug)]
pub struct BasicBlockConfig {
    /// The size of the in channels dimension.
    pub in_planes: usize,

    /// The size of the out channels dimension.
    pub planes: usize,

    /// The stride of the first convolution.
    #[config(default = 1)]
    pub stride: usize,
}

impl BasicBlockConfig {
    /// Does this block need a projection on the residual path?
    pub fn needs_downsample(&self) -> bool {
        self.stride != 1 || self.in_planes != self.planes
    }

    /// Initialize a [`BasicBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> BasicBlock<B> {
        let downsample = if self.needs_downsample() {
            Some(ConvNorm2dConfig::square([self.in_planes, self.planes], 1, self.stride).init(device))
        } else {
            None
        };

        BasicBlock {
            cn1: ConvNorm2dConfig::square([self.in_planes, self.planes], 3, self.stride)
                .init(device),
            cn2: ConvNorm2dConfig::square([self.planes, self.planes], 3, 1).init(device),
            downsample,
        }
    }
}

/// Basic Block for `ResNet`.
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    /// First Conv/Norm Block.
    pub cn1: ConvNorm2d<B>,

    /// Second Conv/Norm Block.
    pub cn2: ConvNorm2d<B>,

    /// Optional 1x1 Conv/Norm projection for the residual connection.
    pub downsample: Option<ConvNorm2d<B>>,
}

impl<B: Backend> BasicBlock<B> {
    /// The size of the in channels dimension.
    pub fn in_planes(&self) -> usize {
        self.cn1.in_channels()
    }

    /// The size of the out channels dimension.
    pub fn out_planes(&self) -> usize {
        self.cn2.out_channels()
    }

    /// The block stride.
    pub fn stride(&self) -> usize {
        self.cn1.stride()
    }

    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_planes, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_planes, in_height / stride, in_width / stride]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(input.clone()),
            None => input.clone(),
        };

        let x = relu(self.cn1.forward(input));
        let x = self.cn2.forward(x);

        relu(x + identity)
    }
}
