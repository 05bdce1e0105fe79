//! # Training Config

use crate::data::transform::DEFAULT_IMAGE_SIZE;
use burn::config::Config;

/// [`TrainingConfig::pretrained`] value selecting randomly initialized weights.
pub const NO_PRETRAINED: &str = "none";

/// Fine-tuning run config.
///
/// Saved as ``config.json`` in the run output directory.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Dataset root holding ``train/``, ``val/`` and ``test/`` class folders.
    #[config(default = "\"natural_images\".to_string()")]
    pub dataset_root: String,

    /// Number of training epochs.
    #[config(default = 10)]
    pub num_epochs: usize,

    /// Batch size for every split.
    #[config(default = 16)]
    pub batch_size: usize,

    /// Loader worker threads; 0 loads in-process.
    #[config(default = 0)]
    pub num_workers: usize,

    /// Seed for the backend, loader shuffling and augmentation.
    #[config(default = 42)]
    pub seed: u64,

    /// Adam learning rate.
    #[config(default = 1e-3)]
    pub learning_rate: f64,

    /// Square side of the model input images.
    #[config(default = "DEFAULT_IMAGE_SIZE")]
    pub image_size: u32,

    /// ``{model}.{weights}`` name, or [`NO_PRETRAINED`] to train ResNet-18 from scratch.
    #[config(default = "\"resnet18.tv_in1k\".to_string()")]
    pub pretrained: String,

    /// Hidden width of the classifier head.
    #[config(default = 512)]
    pub head_hidden: usize,

    /// Dropout probability of the classifier head.
    #[config(default = 0.5)]
    pub head_dropout: f64,

    /// Batches between training progress lines.
    #[config(default = 20)]
    pub log_interval: usize,
}

impl TrainingConfig {
    /// The pretrained weights name, unless training from scratch.
    pub fn pretrained_name(&self) -> Option<&str> {
        match self.pretrained.as_str() {
            "" | NO_PRETRAINED => None,
            name => Some(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::new();
        assert_eq!(config.dataset_root, "natural_images");
        assert_eq!(config.num_epochs, 10);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.num_workers, 0);
        assert_eq!(config.seed, 42);
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.image_size, 224);
        assert_eq!(config.pretrained_name(), Some("resnet18.tv_in1k"));
        assert_eq!(config.head_hidden, 512);
        assert_eq!(config.head_dropout, 0.5);
        assert_eq!(config.log_interval, 20);
    }

    #[test]
    fn test_save_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let config = TrainingConfig::new()
            .with_num_epochs(3)
            .with_pretrained(NO_PRETRAINED.to_string());
        config.save(&path).unwrap();

        let loaded = TrainingConfig::load(&path).unwrap();
        assert_eq!(loaded.num_epochs, 3);
        assert_eq!(loaded.pretrained_name(), None);
    }
}
