//! # `ResNet` Layer Block
//!
//! A [`LayerBlock`] is a sequence of [`BasicBlock`]s.

use crate::models::resnet::basic_block::{BasicBlock, BasicBlockConfig};
use burn::config::Config;
use burn::prelude::{Backend, Module, Tensor};

/// [`LayerBlock`] Config.
#[derive(Config, Debug)]
pub struct LayerBlockConfig {
    /// The blocks.
    pub blocks: Vec<BasicBlockConfig>,
}

impl LayerBlockConfig {
    /// Build a config for a standard layer.
    ///
    /// The first block carries the stride and the channel change;
    /// the rest are ``out_planes -> out_planes``, stride 1.
    ///
    /// # Arguments
    ///
    /// - `num_blocks`: the number of blocks.
    /// - `in_planes`: the number of input feature planes.
    /// - `out_planes`: the number of output feature planes.
    /// - `stride`: the stride of the first block.
    pub fn build(
        num_blocks: usize,
        in_planes: usize,
        out_planes: usize,
        stride: usize,
    ) -> Self {
        let blocks = (0..num_blocks)
            .map(|b| {
                if b == 0 {
                    BasicBlockConfig::new(in_planes, out_planes).with_stride(stride)
                } else {
                    BasicBlockConfig::new(out_planes, out_planes)
                }
            })
            .collect();

        Self { blocks }
    }

    /// The number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the layer block is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The number of output feature planes.
    ///
    /// # Panics
    ///
    /// If the layer is empty.
    pub fn out_planes(&self) -> usize {
        self.blocks[self.blocks.len() - 1].planes
    }

    /// Initialize a [`LayerBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> LayerBlock<B> {
        LayerBlock {
            blocks: self.blocks.into_iter().map(|b| b.init(device)).collect(),
        }
    }
}

/// Sequence of [`BasicBlock`]s.
#[derive(Module, Debug)]
pub struct LayerBlock<B: Backend> {
    /// Internal blocks.
    pub blocks: Vec<BasicBlock<B>>,
}

impl<B: Backend> LayerBlock<B> {
    /// The number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the layer block is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Forward Pass.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        self.blocks
            .iter()
            .fold(input, |x, block| block.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_layer_block_config_build() {
        let config = LayerBlockConfig::build(3, 16, 32, 2);
        assert_eq!(config.len(), 3);
        assert!(!config.is_empty());
        assert_eq!(config.out_planes(), 32);

        assert_eq!(config.blocks[0].in_planes, 16);
        assert_eq!(config.blocks[0].stride, 2);
        for block in &config.blocks[1..] {
            assert_eq!(block.in_planes, 32);
            assert_eq!(block.planes, 32);
            assert_eq!(block.stride, 1);
        }
    }

    #[test]
    fn test_layer_block_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let layer: LayerBlock<B> = LayerBlockConfig::build(2, 2, 4, 2).init(&device);
        assert_eq!(layer.len(), 2);
        assert!(layer.blocks[0].downsample.is_some());
        assert!(layer.blocks[1].downsample.is_none());

        let output = layer.forward(Tensor::ones([1, 2, 8, 4], &device));
        assert_eq!(output.dims(), [1, 4, 4, 2]);
    }
}
