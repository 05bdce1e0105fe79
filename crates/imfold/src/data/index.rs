//! # Class-Folder Image Index
//!
//! An [`ImageFolderIndex`] maps a directory tree of the form:
//!
//! ```text,ignore
//! root/
//!   class_a/
//!     img0.jpg
//!     img1.png
//!   class_b/
//!     img2.jpeg
//! ```
//!
//! to a flat list of ``(path, label)`` items, where the label is the position
//! of the class directory in the sorted list of class names.

use crate::errors::DatasetError;
use globwalk::{FileType, GlobWalkerBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File extensions (lower-case) treated as images.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A single indexed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    /// Path to the image file.
    pub path: PathBuf,

    /// Class label; an index into [`ImageFolderIndex::classes`].
    pub label: usize,
}

/// Index of a class-folder image dataset.
#[derive(Debug, Clone)]
pub struct ImageFolderIndex {
    root: PathBuf,
    classes: Vec<String>,
    items: Vec<IndexedImage>,
}

impl ImageFolderIndex {
    /// Scan a dataset root.
    ///
    /// Every directory directly under `root` is a class; classes are sorted
    /// by name. Plain files under `root` are ignored.
    ///
    /// # Errors
    ///
    /// If `root` is missing, is not a directory, or cannot be listed.
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self, DatasetError> {
        let root = root.as_ref().to_path_buf();
        let classes = list_class_dirs(&root)?;

        let mut items = Vec::new();
        for (label, class_name) in classes.iter().enumerate() {
            for path in list_images(&root.join(class_name))? {
                items.push(IndexedImage { path, label });
            }
        }

        tracing::debug!(
            root = %root.display(),
            classes = classes.len(),
            images = items.len(),
            "indexed image folder"
        );

        Ok(Self {
            root,
            classes,
            items,
        })
    }

    /// The dataset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorted class names.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Lookup the label of a class by name.
    pub fn class_to_idx(
        &self,
        class_name: &str,
    ) -> Option<usize> {
        self.classes.iter().position(|c| c == class_name)
    }

    /// The ``class name -> label`` map.
    pub fn class_map(&self) -> BTreeMap<String, usize> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect()
    }

    /// All indexed images.
    pub fn items(&self) -> &[IndexedImage] {
        &self.items
    }

    /// Get an item by position.
    pub fn get(
        &self,
        index: usize,
    ) -> Option<&IndexedImage> {
        self.items.get(index)
    }

    /// Number of indexed images.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Is the index empty?
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of images per class, in label order.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for item in &self.items {
            counts[item.label] += 1;
        }
        counts
    }
}

/// Does this file name carry an image extension?
///
/// Case-insensitive.
pub fn is_image_file_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// List the sorted names of the directories directly under `root`.
///
/// # Errors
///
/// If `root` is missing, is not a directory, or cannot be listed.
pub fn list_class_dirs(root: &Path) -> Result<Vec<String>, DatasetError> {
    if !root.exists() {
        return Err(DatasetError::MissingRoot(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DatasetError::NotADirectory(root.to_path_buf()));
    }

    let context = || format!("failed to list '{}'", root.display());

    let mut classes = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| DatasetError::io(context(), e))? {
        let entry = entry.map_err(|e| DatasetError::io(context(), e))?;
        if entry.path().is_dir() {
            classes.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    classes.sort();
    Ok(classes)
}

/// List the image files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended.
///
/// # Errors
///
/// If the directory cannot be walked.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let walk_err = |source: Box<dyn std::error::Error + Send + Sync>| DatasetError::Walk {
        path: dir.to_path_buf(),
        source,
    };

    let patterns: Vec<String> = IMAGE_EXTENSIONS
        .iter()
        .map(|ext| format!("*.{ext}"))
        .collect();

    let walker = GlobWalkerBuilder::from_patterns(dir, &patterns)
        .max_depth(1)
        .case_insensitive(true)
        .file_type(FileType::FILE)
        .build()
        .map_err(|e| walk_err(Box::new(e)))?;

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| walk_err(Box::new(e)))?;
        let name = entry.file_name().to_string_lossy();
        if is_image_file_name(&name) {
            paths.push(entry.path().to_path_buf());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_is_image_file_name() {
        assert!(is_image_file_name("a.jpg"));
        assert!(is_image_file_name("a.JPEG"));
        assert!(is_image_file_name("a.b.Png"));
        assert!(!is_image_file_name("a.gif"));
        assert!(!is_image_file_name("jpg"));
        assert!(!is_image_file_name("notes.txt"));
    }

    #[test]
    fn test_scan() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        touch(&root.join("dog/b.jpg"));
        touch(&root.join("dog/a.PNG"));
        touch(&root.join("dog/readme.txt"));
        touch(&root.join("cat/x.jpeg"));
        touch(&root.join("cat/nested/deep.jpg"));
        touch(&root.join("empty/.keep"));
        touch(&root.join("stray.jpg"));

        let index = ImageFolderIndex::scan(root).unwrap();

        assert_eq!(index.classes(), &["cat", "dog", "empty"]);
        assert_eq!(index.class_to_idx("dog"), Some(1));
        assert_eq!(index.class_to_idx("stray.jpg"), None);
        assert_eq!(index.len(), 3);
        assert_eq!(index.class_counts(), vec![1, 2, 0]);

        let names: Vec<(String, usize)> = index
            .items()
            .iter()
            .map(|item| {
                (
                    item.path.file_name().unwrap().to_string_lossy().to_string(),
                    item.label,
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("x.jpeg".to_string(), 0),
                ("a.PNG".to_string(), 1),
                ("b.jpg".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_scan_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");

        let err = ImageFolderIndex::scan(&missing).unwrap_err();
        assert!(matches!(err, DatasetError::MissingRoot(_)));
        assert_eq!(
            err.to_string(),
            format!("dataset directory '{}' does not exist", missing.display())
        );
    }

    #[test]
    fn test_scan_file_root() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file.jpg");
        touch(&file);

        let err = ImageFolderIndex::scan(&file).unwrap_err();
        assert!(matches!(err, DatasetError::NotADirectory(_)));
    }
}
