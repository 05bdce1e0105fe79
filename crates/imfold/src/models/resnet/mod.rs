//! # `ResNet`
//!
//! `ResNet-18/34` backbones with a replaceable classifier head,
//! loadable from ``torchvision`` pretrained weights.

pub mod basic_block;
pub mod conv_norm;
pub mod head;
pub mod layer_block;
pub mod pretrained;
pub mod pytorch;
pub mod resnet_model;

pub use head::{ClassifierHead, ClassifierHeadConfig};
pub use pretrained::{PRETRAINED_RESNETS, PretrainedSelection, lookup_pretrained};
pub use resnet_model::{RESNET18_BLOCKS, RESNET34_BLOCKS, ResNet, ResNetConfig};
