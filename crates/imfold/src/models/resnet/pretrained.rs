//! # Pretrained `ResNet` Weights
//!
//! Pretrained weights are named ``{model}.{weights}``, e.g. ``resnet18.tv_in1k``.

use crate::cache::disk::DiskCacheConfig;
use crate::cache::weights::{PretrainedWeightsDescriptor, StaticPretrainedWeightsDescriptor};
use crate::models::resnet::pytorch::load_pytorch_weights;
use crate::models::resnet::resnet_model::{
    RESNET18_BLOCKS, RESNET34_BLOCKS, ResNet, ResNetConfig,
};
use anyhow::{Context, bail};
use burn::prelude::Backend;

/// A model architecture with its known pretrained weights.
#[derive(Debug)]
pub struct StaticPretrainedResNet {
    /// Name of the architecture.
    pub name: &'static str,

    /// Description of the architecture.
    pub description: &'static str,

    /// Layer block depths.
    pub layers: [usize; 4],

    /// Available weights.
    pub weights: &'static [&'static StaticPretrainedWeightsDescriptor<'static>],
}

impl StaticPretrainedResNet {
    /// Build a config for this architecture with a fresh head.
    pub fn to_config(
        &self,
        num_classes: usize,
    ) -> ResNetConfig {
        ResNetConfig::new(self.layers, num_classes)
    }

    /// Lookup weights by name.
    pub fn lookup_weights(
        &self,
        name: &str,
    ) -> Option<PretrainedWeightsDescriptor> {
        self.weights
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.to_descriptor())
    }
}

/// Known pretrained [`ResNet`] weights.
pub static PRETRAINED_RESNETS: &[&StaticPretrainedResNet] = &[
    &StaticPretrainedResNet {
        name: "resnet18",
        description: "ResNet-18 [2, 2, 2, 2] BasicBlocks",
        layers: RESNET18_BLOCKS,
        weights: &[&StaticPretrainedWeightsDescriptor {
            name: "tv_in1k",
            description: "ResNet-18 pretrained on ImageNet",
            license: Some("bsd-3-clause"),
            origin: Some("https://github.com/pytorch/vision"),
            urls: &["https://download.pytorch.org/models/resnet18-f37072fd.pth"],
        }],
    },
    &StaticPretrainedResNet {
        name: "resnet34",
        description: "ResNet-34 [3, 4, 6, 3] BasicBlocks",
        layers: RESNET34_BLOCKS,
        weights: &[&StaticPretrainedWeightsDescriptor {
            name: "tv_in1k",
            description: "ResNet-34 pretrained on ImageNet",
            license: Some("bsd-3-clause"),
            origin: Some("https://github.com/pytorch/vision"),
            urls: &["https://download.pytorch.org/models/resnet34-b627a593.pth"],
        }],
    },
];

/// A resolved ``{model}.{weights}`` name.
#[derive(Debug, Clone)]
pub struct PretrainedSelection {
    /// The architecture.
    pub model: &'static StaticPretrainedResNet,

    /// The weights.
    pub weights: PretrainedWeightsDescriptor,
}

/// Resolve a ``{model}.{weights}`` name.
///
/// # Errors
///
/// If the name is malformed, or the model or weights are unknown.
pub fn lookup_pretrained(name: &str) -> anyhow::Result<PretrainedSelection> {
    let Some((model_name, weights_name)) = name.split_once('.') else {
        bail!("Expected \"{{model}}.{{weights}}\", got \"{name}\"");
    };

    let model = PRETRAINED_RESNETS
        .iter()
        .copied()
        .find(|m| m.name == model_name)
        .with_context(|| format!("Unknown pretrained model: \"{model_name}\""))?;

    let weights = model
        .lookup_weights(weights_name)
        .with_context(|| format!("Unknown weights for {model_name}: \"{weights_name}\""))?;

    Ok(PretrainedSelection { model, weights })
}

/// Lines describing every available pretrained model.
///
/// Each weights entry is followed by its license and origin, when known.
pub fn describe_pretrained() -> Vec<String> {
    let mut lines = vec![];
    for model in PRETRAINED_RESNETS {
        lines.push(format!("* \"{}\": {}", model.name, model.description));
        for w in model.weights {
            lines.push(format!(
                "  - \"{}.{}\": {}",
                model.name, w.name, w.description
            ));
            let provenance: Vec<String> = [("license", w.license), ("origin", w.origin)]
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| format!("{key}: {v}")))
                .collect();
            if !provenance.is_empty() {
                lines.push(format!("    {}", provenance.join(", ")));
            }
        }
    }
    lines
}

impl PretrainedSelection {
    /// The fully-qualified name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.model.name, self.weights.name)
    }

    /// Build a model: fetch (or read cached) weights, load the backbone,
    /// and attach a fresh head.
    pub fn load_model<B: Backend>(
        &self,
        config: &ResNetConfig,
        disk_cache: &DiskCacheConfig,
        device: &B::Device,
    ) -> anyhow::Result<ResNet<B>> {
        let path = self
            .weights
            .fetch_weights(disk_cache)
            .with_context(|| format!("Failed to fetch pretrained weights: {}", self.name()))?;

        tracing::info!(weights = %path.display(), "loading pretrained {}", self.name());

        load_pytorch_weights(config.init(device), path)
            .with_context(|| format!("Failed to load pretrained weights: {}", self.name()))
    }
}
