//! # Class-Folder Dataset
//!
//! [`ClassFolderDataset`] adapts an [`ImageFolderIndex`] to the
//! `burn` [`Dataset`] API, loading and transforming images on access.

use crate::data::index::ImageFolderIndex;
use crate::data::transform::ImageTransformConfig;
use burn::data::dataset::Dataset;
use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Mutex;

/// A decoded, transformed image and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    /// ``[height, width, 3]`` row-major RGB bytes.
    pub pixels: Vec<u8>,

    /// Image height.
    pub height: usize,

    /// Image width.
    pub width: usize,

    /// Class label.
    pub label: usize,

    /// Stands in for an image which failed to load.
    ///
    /// Batched as an all-zero tensor after normalization.
    pub placeholder: bool,
}

impl ImageItem {
    /// Build from an RGB image.
    pub fn from_rgb(
        image: RgbImage,
        label: usize,
    ) -> Self {
        let (width, height) = image.dimensions();
        Self {
            pixels: image.into_raw(),
            height: height as usize,
            width: width as usize,
            label,
            placeholder: false,
        }
    }

    /// A placeholder item for an image which failed to load.
    pub fn placeholder(
        image: RgbImage,
        label: usize,
    ) -> Self {
        Self {
            placeholder: true,
            ..Self::from_rgb(image, label)
        }
    }
}

/// A `burn` [`Dataset`] over a class-folder [`ImageFolderIndex`].
#[derive(Debug)]
pub struct ClassFolderDataset {
    index: ImageFolderIndex,
    transform: ImageTransformConfig,
    rng: Mutex<StdRng>,
}

impl ClassFolderDataset {
    /// Create a new dataset.
    ///
    /// # Arguments
    ///
    /// - `index`: the image index.
    /// - `transform`: the per-item transform.
    /// - `seed`: seed for the augmentation RNG.
    pub fn new(
        index: ImageFolderIndex,
        transform: ImageTransformConfig,
        seed: u64,
    ) -> Self {
        Self {
            index,
            transform,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// The underlying index.
    pub fn index(&self) -> &ImageFolderIndex {
        &self.index
    }

    /// Sorted class names.
    pub fn classes(&self) -> &[String] {
        self.index.classes()
    }

    /// The transform config.
    pub fn transform(&self) -> &ImageTransformConfig {
        &self.transform
    }

    fn load(
        &self,
        index: usize,
    ) -> Option<ImageItem> {
        let item = self.index.get(index)?;

        match image::open(&item.path) {
            Ok(image) => {
                // Hold the lock only for the draw; resize and rotation run unlocked.
                let augmentation = {
                    // Poisoning only means another loader panicked mid-draw; the RNG is still usable.
                    let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                    self.transform.sample(&mut *rng)
                };
                Some(ImageItem::from_rgb(
                    self.transform.render(image, &augmentation),
                    item.label,
                ))
            }
            Err(err) => {
                tracing::warn!(
                    path = %item.path.display(),
                    error = %err,
                    "Error loading image; substituting a blank image"
                );
                Some(ImageItem::placeholder(self.transform.blank(), item.label))
            }
        }
    }
}

impl Dataset<ImageItem> for ClassFolderDataset {
    fn get(
        &self,
        index: usize,
    ) -> Option<ImageItem> {
        self.load(index)
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::fs;

    #[test]
    fn test_dataset_get() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        fs::create_dir_all(root.join("blue")).unwrap();
        fs::create_dir_all(root.join("red")).unwrap();

        RgbImage::from_pixel(20, 10, Rgb([0, 0, 255]))
            .save(root.join("blue/b.png"))
            .unwrap();
        RgbImage::from_pixel(12, 12, Rgb([255, 0, 0]))
            .save(root.join("red/r.png"))
            .unwrap();
        fs::write(root.join("red/broken.jpg"), b"not a jpeg").unwrap();

        let index = ImageFolderIndex::scan(root).unwrap();
        let dataset = ClassFolderDataset::new(index, ImageTransformConfig::evaluation(8), 0);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.classes(), &["blue", "red"]);

        let blue = dataset.get(0).unwrap();
        assert_eq!(blue.label, 0);
        assert_eq!((blue.height, blue.width), (8, 8));
        assert_eq!(blue.pixels.len(), 8 * 8 * 3);
        assert_eq!(&blue.pixels[..3], &[0, 0, 255]);
        assert!(!blue.placeholder);

        // "broken.jpg" sorts before "r.png"; it decodes to a blank image.
        let broken = dataset.get(1).unwrap();
        assert_eq!(broken.label, 1);
        assert!(broken.placeholder);
        assert!(broken.pixels.iter().all(|&p| p == 0));

        let red = dataset.get(2).unwrap();
        assert_eq!(red.label, 1);
        assert_eq!(&red.pixels[..3], &[255, 0, 0]);

        assert!(dataset.get(3).is_none());
    }

    #[test]
    fn test_training_dataset_across_threads() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        for class in ["a", "b"] {
            fs::create_dir_all(root.join(class)).unwrap();
            for i in 0..4 {
                RgbImage::from_pixel(30, 20, Rgb([i * 40, 90, 10]))
                    .save(root.join(class).join(format!("{i}.png")))
                    .unwrap();
            }
        }

        let index = ImageFolderIndex::scan(root).unwrap();
        let dataset = ClassFolderDataset::new(index, ImageTransformConfig::training(16), 3);

        let items: Vec<ImageItem> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..dataset.len())
                .map(|i| {
                    let dataset = &dataset;
                    scope.spawn(move || dataset.get(i).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(items.len(), 8);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.label, i / 4);
            assert_eq!((item.height, item.width), (16, 16));
            assert!(!item.placeholder);
        }
    }
}
