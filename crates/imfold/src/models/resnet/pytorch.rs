//! # ``torchvision`` `ResNet` Weight Loading
//!
//! Stub modules mirroring the ``torchvision`` `ResNet` parameter layout.
//! Weights are loaded into the stubs through `burn-import`, then copied
//! onto a [`ResNet`]. The stubs carry only parametrized layers; the
//! stateless layers of the target keep their own configuration.

use crate::models::resnet::basic_block::BasicBlock;
use crate::models::resnet::conv_norm::ConvNorm2d;
use crate::models::resnet::layer_block::LayerBlock;
use crate::models::resnet::resnet_model::ResNet;
use anyhow::ensure;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dRecord};
use burn::nn::{BatchNorm, BatchNormRecord, Linear};
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, Recorder};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::path::PathBuf;

/// ``torchvision`` `ResNet` stub.
#[derive(Module, Debug)]
pub struct ResNetStub<B: Backend> {
    /// Stem conv.
    pub conv1: Conv2d<B>,
    /// Stem norm.
    pub bn1: BatchNorm<B, 2>,
    /// Layer 1 blocks.
    pub layer1: Vec<BasicBlockStub<B>>,
    /// Layer 2 blocks.
    pub layer2: Vec<BasicBlockStub<B>>,
    /// Layer 3 blocks.
    pub layer3: Vec<BasicBlockStub<B>>,
    /// Layer 4 blocks.
    pub layer4: Vec<BasicBlockStub<B>>,
    /// The pretrained classifier; discarded on copy.
    pub fc: Linear<B>,
}

/// ``torchvision`` `BasicBlock` stub.
#[derive(Module, Debug)]
pub struct BasicBlockStub<B: Backend> {
    /// First conv.
    pub conv1: Conv2d<B>,
    /// First norm.
    pub bn1: BatchNorm<B, 2>,
    /// Second conv.
    pub conv2: Conv2d<B>,
    /// Second norm.
    pub bn2: BatchNorm<B, 2>,
    /// Residual projection.
    pub downsample: Option<DownsampleStub<B>>,
}

/// ``torchvision`` downsample stub; ``Sequential(conv, bn)`` remapped to names.
#[derive(Module, Debug)]
pub struct DownsampleStub<B: Backend> {
    /// Projection conv.
    pub conv: Conv2d<B>,
    /// Projection norm.
    pub bn: BatchNorm<B, 2>,
}

/// The ``burn-import`` load arguments for a ``torchvision`` `ResNet` file.
pub fn resnet_load_args(path: PathBuf) -> LoadArgs {
    LoadArgs::new(path)
        .with_key_remap(r"downsample\.0", "downsample.conv")
        .with_key_remap(r"downsample\.1", "downsample.bn")
}

/// Load a [`ResNetStubRecord`] from a ``torch`` weights path.
pub fn load_resnet_stub_record<B: Backend>(
    path: PathBuf,
    device: &B::Device,
) -> anyhow::Result<ResNetStubRecord<B>> {
    let record = PyTorchFileRecorder::<FullPrecisionSettings>::new()
        .load(resnet_load_args(path), device)?;

    Ok(record)
}

/// Load weights from a ``torch`` weights path onto a [`ResNet`] model.
///
/// The head of `resnet` is left untouched.
pub fn load_pytorch_weights<B: Backend>(
    resnet: ResNet<B>,
    path: PathBuf,
) -> anyhow::Result<ResNet<B>> {
    let device = resnet.head.fc1.weight.device();
    let record = load_resnet_stub_record::<B>(path, &device)?;
    record.copy_weights(resnet)
}

fn copy_conv_norm<B: Backend>(
    conv: Conv2dRecord<B>,
    bn: BatchNormRecord<B, 2>,
    target: ConvNorm2d<B>,
) -> ConvNorm2d<B> {
    ConvNorm2d {
        conv: target.conv.load_record(conv),
        norm: target.norm.load_record(bn),
    }
}

impl<B: Backend> ResNetStubRecord<B> {
    /// Copy the backbone weights onto `target`.
    ///
    /// # Errors
    ///
    /// If the layer or block counts differ.
    pub fn copy_weights(
        self,
        target: ResNet<B>,
    ) -> anyhow::Result<ResNet<B>> {
        let stub_layers = [self.layer1, self.layer2, self.layer3, self.layer4];
        ensure!(
            target.layers.len() == stub_layers.len(),
            "Expected {} layers, model has {}",
            stub_layers.len(),
            target.layers.len()
        );

        let layers = stub_layers
            .into_iter()
            .zip(target.layers)
            .map(|(stub, layer)| copy_layer_weights(stub, layer))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(ResNet {
            stem: copy_conv_norm(self.conv1, self.bn1, target.stem),
            layers,
            ..target
        })
    }
}

fn copy_layer_weights<B: Backend>(
    stub: Vec<BasicBlockStubRecord<B>>,
    target: LayerBlock<B>,
) -> anyhow::Result<LayerBlock<B>> {
    ensure!(
        stub.len() == target.blocks.len(),
        "Pretrained layer has {} blocks, model has {}",
        stub.len(),
        target.blocks.len()
    );

    let blocks = stub
        .into_iter()
        .zip(target.blocks)
        .map(|(s, t)| s.copy_weights(t))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(LayerBlock { blocks })
}

impl<B: Backend> BasicBlockStubRecord<B> {
    /// Copy the block weights onto `target`.
    ///
    /// # Errors
    ///
    /// If only one side has a downsample projection.
    pub fn copy_weights(
        self,
        target: BasicBlock<B>,
    ) -> anyhow::Result<BasicBlock<B>> {
        let downsample = match (self.downsample, target.downsample) {
            (Some(stub), Some(t)) => Some(copy_conv_norm(stub.conv, stub.bn, t)),
            (None, None) => None,
            (stub, t) => anyhow::bail!(
                "Downsample mismatch: pretrained={}, model={}",
                stub.is_some(),
                t.is_some()
            ),
        };

        Ok(BasicBlock {
            cn1: copy_conv_norm(self.conv1, self.bn1, target.cn1),
            cn2: copy_conv_norm(self.conv2, self.bn2, target.cn2),
            downsample,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resnet::resnet_model::ResNetConfig;
    use burn::backend::NdArray;
    use burn::nn::LinearConfig;
    use burn::tensor::Tensor;

    type B = NdArray<f32>;

    fn block_record(block: &BasicBlock<B>) -> BasicBlockStubRecord<B> {
        BasicBlockStubRecord {
            conv1: block.cn1.conv.clone().into_record(),
            bn1: block.cn1.norm.clone().into_record(),
            conv2: block.cn2.conv.clone().into_record(),
            bn2: block.cn2.norm.clone().into_record(),
            downsample: block.downsample.as_ref().map(|d| DownsampleStubRecord {
                conv: d.conv.clone().into_record(),
                bn: d.norm.clone().into_record(),
            }),
        }
    }

    fn stub_record(model: &ResNet<B>) -> ResNetStubRecord<B> {
        let device = Default::default();
        let layer = |i: usize| -> Vec<BasicBlockStubRecord<B>> {
            model.layers[i].blocks.iter().map(block_record).collect()
        };
        ResNetStubRecord {
            conv1: model.stem.conv.clone().into_record(),
            bn1: model.stem.norm.clone().into_record(),
            layer1: layer(0),
            layer2: layer(1),
            layer3: layer(2),
            layer4: layer(3),
            fc: LinearConfig::new(512, 1000).init::<B>(&device).into_record(),
        }
    }

    #[test]
    fn test_copy_weights() {
        let device = Default::default();
        let config = ResNetConfig::resnet18(3).with_head_hidden(8);

        let source: ResNet<B> = config.init(&device);
        let target: ResNet<B> = config.init(&device);
        let head_weights = target.head.fc1.weight.val();

        let copied = stub_record(&source).copy_weights(target).unwrap();

        copied
            .stem
            .conv
            .weight
            .val()
            .into_data()
            .assert_eq(&source.stem.conv.weight.val().into_data(), true);

        let src_ds = source.layers[1].blocks[0].downsample.as_ref().unwrap();
        let dst_ds = copied.layers[1].blocks[0].downsample.as_ref().unwrap();
        dst_ds
            .conv
            .weight
            .val()
            .into_data()
            .assert_eq(&src_ds.conv.weight.val().into_data(), true);

        // The head is not part of the pretrained weights.
        copied
            .head
            .fc1
            .weight
            .val()
            .into_data()
            .assert_eq(&head_weights.into_data(), true);

        let images = Tensor::<B, 4>::ones([1, 3, 32, 32], &device);
        assert_eq!(copied.forward(images).dims(), [1, 3]);
    }

    #[test]
    fn test_copy_weights_depth_mismatch() {
        let device = Default::default();

        let source: ResNet<B> = ResNetConfig::resnet18(3).with_head_hidden(8).init(&device);
        let target: ResNet<B> = ResNetConfig::resnet34(3).with_head_hidden(8).init(&device);

        let err = stub_record(&source).copy_weights(target).unwrap_err();
        assert!(err.to_string().contains("blocks"));
    }
}
