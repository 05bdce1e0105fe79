//! # Image Transforms
//!
//! Resize and augmentation applied to decoded images before batching.
//! Tensor conversion and normalization live in [`crate::data::batcher`].

use burn::config::Config;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use rand::Rng;

/// Per-channel `ImageNet` mean, on the ``[0, 1]`` pixel scale.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel `ImageNet` standard deviation, on the ``[0, 1]`` pixel scale.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Default square input resolution.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// The random choices of one augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Augmentation {
    /// Mirror left-to-right.
    pub flip: bool,

    /// Rotation angle in degrees; ``0.0`` skips rotation.
    pub rotation_degrees: f32,
}

/// [`ImageTransformConfig`] describes the pixel pipeline for one split.
#[derive(Config, Debug)]
pub struct ImageTransformConfig {
    /// Square output resolution; images are resized exactly, ignoring aspect.
    #[config(default = "DEFAULT_IMAGE_SIZE")]
    pub image_size: u32,

    /// Randomly mirror images left-to-right with probability 0.5.
    #[config(default = false)]
    pub horizontal_flip: bool,

    /// Randomly rotate by an angle drawn from ``[-max, max]`` degrees.
    ///
    /// ``0.0`` disables rotation.
    #[config(default = 0.0)]
    pub max_rotation_degrees: f32,
}

impl ImageTransformConfig {
    /// The training transform: resize, random flip, random rotation of up to 10 degrees.
    pub fn training(image_size: u32) -> Self {
        Self::new()
            .with_image_size(image_size)
            .with_horizontal_flip(true)
            .with_max_rotation_degrees(10.0)
    }

    /// The evaluation transform: resize only.
    pub fn evaluation(image_size: u32) -> Self {
        Self::new().with_image_size(image_size)
    }

    /// Does this transform draw random numbers?
    pub fn is_random(&self) -> bool {
        self.horizontal_flip || self.max_rotation_degrees > 0.0
    }

    /// Draw the random choices for one image.
    ///
    /// Draws nothing for a deterministic transform.
    pub fn sample<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Augmentation {
        let flip = self.horizontal_flip && rng.random_bool(0.5);

        let rotation_degrees = if self.max_rotation_degrees > 0.0 {
            let max = self.max_rotation_degrees;
            rng.random_range(-max..=max)
        } else {
            0.0
        };

        Augmentation {
            flip,
            rotation_degrees,
        }
    }

    /// Resize, then apply the drawn flip and rotation.
    ///
    /// # Returns
    ///
    /// An ``image_size x image_size`` RGB image.
    pub fn render(
        &self,
        image: DynamicImage,
        augmentation: &Augmentation,
    ) -> RgbImage {
        let size = self.image_size;
        let mut rgb = image::imageops::resize(&image.to_rgb8(), size, size, FilterType::Triangle);

        if augmentation.flip {
            image::imageops::flip_horizontal_in_place(&mut rgb);
        }

        if augmentation.rotation_degrees != 0.0 {
            rgb = rotate_about_center(
                &rgb,
                augmentation.rotation_degrees.to_radians(),
                Interpolation::Bilinear,
                Rgb([0, 0, 0]),
            );
        }

        rgb
    }

    /// Apply the transform: [`Self::sample`], then [`Self::render`].
    pub fn apply<R: Rng>(
        &self,
        image: DynamicImage,
        rng: &mut R,
    ) -> RgbImage {
        let augmentation = self.sample(rng);
        self.render(image, &augmentation)
    }

    /// A black image of the output size.
    ///
    /// Stands in for images which fail to load.
    pub fn blank(&self) -> RgbImage {
        RgbImage::new(self.image_size, self.image_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn gradient(
        width: u32,
        height: u32,
    ) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _y| {
            Rgb([(x * 255 / width.max(1)) as u8, 10, 20])
        }))
    }

    #[test]
    fn test_defaults() {
        let config = ImageTransformConfig::new();
        assert_eq!(config.image_size, 224);
        assert!(!config.is_random());

        let config = ImageTransformConfig::training(64);
        assert_eq!(config.image_size, 64);
        assert!(config.horizontal_flip);
        assert_eq!(config.max_rotation_degrees, 10.0);
        assert!(config.is_random());

        assert!(!ImageTransformConfig::evaluation(64).is_random());
    }

    #[test]
    fn test_evaluation_resizes_exactly() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = ImageTransformConfig::evaluation(32);

        let out = config.apply(gradient(100, 40), &mut rng);
        assert_eq!(out.dimensions(), (32, 32));

        // No flip: the left edge stays dark, the right edge bright.
        assert!(out.get_pixel(0, 16).0[0] < out.get_pixel(31, 16).0[0]);
    }

    #[test]
    fn test_training_keeps_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = ImageTransformConfig::training(48);

        for _ in 0..8 {
            let out = config.apply(gradient(80, 60), &mut rng);
            assert_eq!(out.dimensions(), (48, 48));
        }
    }

    #[test]
    fn test_flip_only() {
        let config = ImageTransformConfig::evaluation(16).with_horizontal_flip(true);
        let mut rng = StdRng::seed_from_u64(3);

        let mut flipped = 0;
        for _ in 0..64 {
            let out = config.apply(gradient(16, 16), &mut rng);
            if out.get_pixel(0, 8).0[0] > out.get_pixel(15, 8).0[0] {
                flipped += 1;
            }
        }
        assert!(flipped > 0 && flipped < 64);
    }

    #[test]
    fn test_sample_then_render_matches_apply() {
        let config = ImageTransformConfig::training(24);
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);

        for _ in 0..4 {
            let augmentation = config.sample(&mut a);
            assert!(augmentation.rotation_degrees.abs() <= 10.0);
            assert_eq!(
                config.render(gradient(40, 30), &augmentation),
                config.apply(gradient(40, 30), &mut b)
            );
        }
    }

    #[test]
    fn test_evaluation_samples_nothing() {
        let mut rng = StdRng::seed_from_u64(5);
        let augmentation = ImageTransformConfig::evaluation(16).sample(&mut rng);
        assert_eq!(augmentation, Augmentation::default());

        // The rng was left untouched.
        let mut fresh = StdRng::seed_from_u64(5);
        assert_eq!(rng.random::<u64>(), fresh.random::<u64>());
    }

    #[test]
    fn test_blank() {
        let blank = ImageTransformConfig::evaluation(8).blank();
        assert_eq!(blank.dimensions(), (8, 8));
        assert!(blank.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
