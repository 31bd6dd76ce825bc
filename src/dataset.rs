//! Dataset Class Discovery
//!
//! A training dataset is a directory with one subdirectory per class label:
//!
//! ```text
//! data/tomato/
//! ├── Tomato___Bacterial_spot/
//! │   ├── image1.jpg
//! │   └── image2.jpg
//! ├── Tomato___healthy/
//! │   └── ...
//! └── ...
//! ```
//!
//! Class indices follow the sorted directory names, which is the order the
//! labels are written into a model manifest.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{LeafCureError, Result};

/// File extensions counted as images
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// One class folder
#[derive(Debug, Clone, Serialize)]
pub struct ClassFolder {
    /// Directory name, used verbatim as the class label
    pub label: String,
    /// Number of image files directly inside the folder
    pub image_count: usize,
}

/// Classes found under a dataset root
#[derive(Debug, Clone, Serialize)]
pub struct DatasetClasses {
    pub root_dir: PathBuf,
    pub classes: Vec<ClassFolder>,
}

impl DatasetClasses {
    /// Class labels in index order
    pub fn labels(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.label.clone()).collect()
    }

    /// Total number of images across all classes
    pub fn total_images(&self) -> usize {
        self.classes.iter().map(|c| c.image_count).sum()
    }
}

/// True if the path has one of [`IMAGE_EXTENSIONS`], case-insensitively
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Discover the class folders under `root_dir`
///
/// Fails when the directory is missing or contains no class folders.
pub fn discover_classes<P: AsRef<Path>>(root_dir: P) -> Result<DatasetClasses> {
    let root_dir = root_dir.as_ref().to_path_buf();
    info!("Scanning dataset at {:?}", root_dir);

    if !root_dir.is_dir() {
        return Err(LeafCureError::Dataset(format!(
            "Dataset directory not found: {}",
            root_dir.display()
        )));
    }

    let mut labels: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(&root_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                labels.push(name.to_string());
            }
        }
    }
    labels.sort();

    if labels.is_empty() {
        return Err(LeafCureError::Dataset(format!(
            "No class folders found inside {}",
            root_dir.display()
        )));
    }

    let classes: Vec<ClassFolder> = labels
        .into_iter()
        .map(|label| {
            let image_count = WalkDir::new(root_dir.join(&label))
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_image_file(e.path()))
                .count();
            debug!("Class '{}': {} images", label, image_count);
            ClassFolder { label, image_count }
        })
        .collect();

    info!("Found {} classes", classes.len());

    Ok(DatasetClasses { root_dir, classes })
}
