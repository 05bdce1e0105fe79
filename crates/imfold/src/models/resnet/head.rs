//! # Classifier Head
//!
//! The fine-tuning head replacing the pretrained ``fc`` layer:
//! ``Linear -> ReLU -> Dropout -> Linear``.

use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::prelude::{Backend, Tensor};
use burn::tensor::activation::relu;

/// [`ClassifierHead`] Config.
#[derive(Config, Debug)]
pub struct ClassifierHeadConfig {
    /// Size of the input features.
    pub in_features: usize,

    /// Number of output classes.
    pub num_classes: usize,

    /// Size of the hidden layer.
    #[config(default = 512)]
    pub hidden: usize,

    /// Dropout probability between the layers.
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl ClassifierHeadConfig {
    /// Initialize a [`ClassifierHead`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ClassifierHead<B> {
        ClassifierHead {
            fc1: LinearConfig::new(self.in_features, self.hidden).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc2: LinearConfig::new(self.hidden, self.num_classes).init(device),
        }
    }
}

/// Two-layer classifier head.
#[derive(Module, Debug)]
pub struct ClassifierHead<B: Backend> {
    /// Hidden projection.
    pub fc1: Linear<B>,

    /// Dropout; active only on autodiff backends.
    pub dropout: Dropout,

    /// Output projection.
    pub fc2: Linear<B>,
}

impl<B: Backend> ClassifierHead<B> {
    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.fc2.weight.dims()[1]
    }

    /// Forward Pass.
    ///
    /// Maps ``[batch, in_features]`` to ``[batch, num_classes]`` logits.
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(input));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_head() {
        type B = NdArray<f32>;
        let device = Default::default();

        let config = ClassifierHeadConfig::new(16, 3);
        assert_eq!(config.hidden, 512);
        assert_eq!(config.dropout, 0.5);

        let head: ClassifierHead<B> = config.with_hidden(8).init(&device);
        assert_eq!(head.fc1.weight.dims(), [16, 8]);
        assert_eq!(head.num_classes(), 3);

        let logits = head.forward(Tensor::ones([5, 16], &device));
        assert_eq!(logits.dims(), [5, 3]);
    }
}
