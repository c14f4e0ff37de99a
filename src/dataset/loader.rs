//! Blood Cell Corpus Loader
//!
//! This module handles enumerating an image-folder corpus from disk:
//! one subdirectory per raw class, image files inside. Enumeration order
//! is deterministic (class directories and file names are sorted), and
//! decoded images are retrieved by position on demand.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{CytoprepError, Result};

/// File extensions accepted as image samples
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

/// A single corpus entry: where the image lives and its raw class name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Raw class name, taken from the containing directory
    pub class_name: String,
}

/// An on-disk labeled image corpus with lazy decoding
///
/// The directory should be structured as:
/// ```text
/// root_dir/
/// ├── basophil/
/// │   ├── BA_1.jpg
/// │   └── BA_2.jpg
/// ├── neutrophil/
/// │   └── ...
/// └── ...
/// ```
#[derive(Debug)]
pub struct ImageFolderCorpus {
    root_dir: PathBuf,
    samples: Vec<RawSample>,
    classes: Vec<String>,
}

impl ImageFolderCorpus {
    /// Enumerate a corpus from a root directory.
    ///
    /// Fails with a data source error if the root does not exist or no
    /// image files are found under it. The failure is raised here, before
    /// any downstream stage runs.
    pub fn open<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Enumerating corpus from: {:?}", root_dir);

        if !root_dir.is_dir() {
            return Err(CytoprepError::DataSource(format!(
                "corpus root does not exist: {:?}",
                root_dir
            )));
        }

        // Discover class directories in sorted order
        let mut classes: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    classes.push(name.to_string());
                }
            }
        }
        classes.sort();

        let mut samples = Vec::new();
        for class_name in &classes {
            let class_dir = root_dir.join(class_name);
            let mut paths: Vec<PathBuf> = WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.path().to_path_buf())
                .filter(|p| is_image_file(p))
                .collect();
            paths.sort();

            debug!("Class '{}': {} image files", class_name, paths.len());

            samples.extend(paths.into_iter().map(|path| RawSample {
                path,
                class_name: class_name.clone(),
            }));
        }

        if samples.is_empty() {
            return Err(CytoprepError::DataSource(format!(
                "no image samples found under corpus root: {:?}",
                root_dir
            )));
        }

        info!(
            "Enumerated {} samples across {} raw classes",
            samples.len(),
            classes.len()
        );

        Ok(Self {
            root_dir,
            samples,
            classes,
        })
    }

    /// All samples in enumeration order
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    /// Raw class names discovered on disk (may be a superset of the catalog)
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Corpus root directory
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Number of samples in the corpus
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the corpus is empty (never true for an opened corpus)
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Decode the image at the given enumeration position.
    ///
    /// Decoding happens on every call; nothing is cached, so concurrent
    /// calls for different positions are safe.
    pub fn load(&self, position: usize) -> Result<DynamicImage> {
        let sample = self
            .samples
            .get(position)
            .ok_or(CytoprepError::IndexOutOfRange {
                index: position,
                len: self.samples.len(),
            })?;

        ImageReader::open(&sample.path)
            .map_err(|e| CytoprepError::ImageLoad(sample.path.clone(), e.to_string()))?
            .decode()
            .map_err(|e| CytoprepError::ImageLoad(sample.path.clone(), e.to_string()))
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
