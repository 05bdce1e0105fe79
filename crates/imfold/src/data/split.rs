//! # Stratified Train/Val/Test Splitting
//!
//! Splits a raw class-folder dataset into three class-folder datasets,
//! dividing each class independently so that every split keeps the
//! class proportions of the source.

use crate::data::index::{list_class_dirs, list_images};
use crate::errors::DatasetError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default training fraction.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.7;

/// Default validation fraction; the test split takes the remainder.
pub const DEFAULT_VAL_RATIO: f64 = 0.15;

/// Default shuffle seed.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Split proportions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Fraction of each class sent to the training split.
    pub train: f64,

    /// Fraction of each class sent to the validation split.
    pub val: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: DEFAULT_TRAIN_RATIO,
            val: DEFAULT_VAL_RATIO,
        }
    }
}

impl SplitRatios {
    /// Build and validate split ratios.
    ///
    /// # Errors
    ///
    /// If either ratio is negative (or NaN), or they sum past ``1.0``.
    pub fn new(
        train: f64,
        val: f64,
    ) -> Result<Self, DatasetError> {
        let ratios = Self { train, val };
        ratios.validate()?;
        Ok(ratios)
    }

    /// Check the ratios.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let ok = (0.0..=1.0).contains(&self.train)
            && (0.0..=1.0).contains(&self.val)
            && self.train + self.val <= 1.0 + f64::EPSILON;
        if ok {
            Ok(())
        } else {
            Err(DatasetError::InvalidRatios {
                train: self.train,
                val: self.val,
            })
        }
    }

    /// The implied test fraction.
    pub fn test(&self) -> f64 {
        (1.0 - self.train - self.val).max(0.0)
    }

    /// Partition sizes ``(train, val, test)`` for a class of `n` files.
    ///
    /// Train and val sizes are floored; test takes the remainder.
    pub fn partition_sizes(
        &self,
        n: usize,
    ) -> (usize, usize, usize) {
        let n_train = ((n as f64) * self.train).floor() as usize;
        let n_val = ((n as f64) * self.val).floor() as usize;
        let n_val = n_val.min(n - n_train);
        (n_train, n_val, n - n_train - n_val)
    }
}

/// The planned partition of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSplit<T> {
    /// Training files.
    pub train: Vec<T>,
    /// Validation files.
    pub val: Vec<T>,
    /// Test files.
    pub test: Vec<T>,
}

impl<T> ClassSplit<T> {
    /// The partitions, in ``train, val, test`` order.
    pub fn parts(&self) -> [&[T]; 3] {
        [&self.train, &self.val, &self.test]
    }
}

/// Shuffle `files` and cut them into train/val/test partitions.
///
/// This is the pure half of [`split_dataset`]; it touches no files.
pub fn plan_class_split<T, R: rand::Rng>(
    mut files: Vec<T>,
    ratios: &SplitRatios,
    rng: &mut R,
) -> ClassSplit<T> {
    files.shuffle(rng);

    let (n_train, n_val, _n_test) = ratios.partition_sizes(files.len());

    let test = files.split_off(n_train + n_val);
    let val = files.split_off(n_train);

    ClassSplit {
        train: files,
        val,
        test,
    }
}

/// Where to write each split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDirs {
    /// Training split root.
    pub train: PathBuf,
    /// Validation split root.
    pub val: PathBuf,
    /// Test split root.
    pub test: PathBuf,
}

impl SplitDirs {
    /// The conventional ``train``, ``val``, ``test`` children of `base`.
    pub fn under<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            train: base.join("train"),
            val: base.join("val"),
            test: base.join("test"),
        }
    }

    /// The roots, in ``train, val, test`` order.
    pub fn roots(&self) -> [&Path; 3] {
        [&self.train, &self.val, &self.test]
    }
}

/// Per-class split sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSplitCounts {
    /// Class name.
    pub class_name: String,
    /// Number of training files.
    pub train: usize,
    /// Number of validation files.
    pub val: usize,
    /// Number of test files.
    pub test: usize,
}

/// Summary of a [`split_dataset`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReport {
    /// Counts for classes which contained images.
    pub classes: Vec<ClassSplitCounts>,

    /// Classes with no images.
    pub empty_classes: Vec<String>,
}

impl SplitReport {
    /// Total ``(train, val, test)`` sizes.
    pub fn totals(&self) -> (usize, usize, usize) {
        self.classes.iter().fold((0, 0, 0), |(a, b, c), counts| {
            (a + counts.train, b + counts.val, c + counts.test)
        })
    }
}

fn create_dir(path: &Path) -> Result<(), DatasetError> {
    fs::create_dir_all(path)
        .map_err(|e| DatasetError::io(format!("failed to create '{}'", path.display()), e))
}

/// Split a class-folder dataset into train/val/test class-folder datasets.
///
/// Each class directory of `source` is shuffled and cut by `ratios`;
/// files are copied (overwriting) to ``<split>/<class>/<file name>``.
/// Class directories are created in every split, even for empty classes.
///
/// # Arguments
///
/// - `source`: the raw dataset root.
/// - `dirs`: the three output roots; created if missing.
/// - `ratios`: split proportions.
/// - `seed`: shuffle seed; classes are visited in sorted order,
///   so a seed fully determines the split.
///
/// # Errors
///
/// If `source` is missing, ratios are invalid, or any file operation fails.
pub fn split_dataset(
    source: &Path,
    dirs: &SplitDirs,
    ratios: &SplitRatios,
    seed: u64,
) -> Result<SplitReport, DatasetError> {
    ratios.validate()?;
    if !source.exists() {
        return Err(DatasetError::MissingSource(source.to_path_buf()));
    }
    let class_dirs = list_class_dirs(source)?;

    for root in dirs.roots() {
        create_dir(root)?;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut report = SplitReport::default();

    for class_name in class_dirs {
        tracing::info!("Processing {class_name}...");

        for root in dirs.roots() {
            create_dir(&root.join(&class_name))?;
        }

        let files = list_images(&source.join(&class_name))?;
        if files.is_empty() {
            tracing::warn!("No images found in {class_name}");
            report.empty_classes.push(class_name);
            continue;
        }

        let plan = plan_class_split(files, ratios, &mut rng);

        for (part, root) in plan.parts().into_iter().zip(dirs.roots()) {
            let dest_dir = root.join(&class_name);
            for src in part {
                // list_images only yields entries with file names.
                let Some(file_name) = src.file_name() else {
                    continue;
                };
                let dst = dest_dir.join(file_name);
                fs::copy(src, &dst).map_err(|e| {
                    DatasetError::io(
                        format!("failed to copy '{}' to '{}'", src.display(), dst.display()),
                        e,
                    )
                })?;
            }
        }

        let counts = ClassSplitCounts {
            class_name,
            train: plan.train.len(),
            val: plan.val.len(),
            test: plan.test.len(),
        };
        tracing::info!(
            "{}: {} train, {} val, {} test",
            counts.class_name,
            counts.train,
            counts.val,
            counts.test
        );
        report.classes.push(counts);
    }

    Ok(report)
}
