//! Dataset preparation pipeline
//!
//! This module turns a raw image-folder corpus into three ready-to-
//! iterate splits:
//!
//! 1. [`loader`] enumerates the corpus from disk
//! 2. [`filter`] restricts it to the catalog classes and remaps labels
//! 3. [`split`] stratifies positions into train/val/test
//! 4. [`weights`] computes class-balanced resampling weights for train
//! 5. [`view`] materializes (transformed image, label) pairs on demand
//! 6. [`pipeline`] wires the stages together behind one entry point
//!
//! [`burn_dataset`] adapts a view to Burn's dataloader for batched,
//! multi-worker iteration.

pub mod augmentation;
pub mod burn_dataset;
pub mod catalog;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod split;
pub mod view;
pub mod weights;

// Re-export main types for convenience
pub use augmentation::{EvalTransform, TrainTransform, IMAGENET_MEAN, IMAGENET_STD};
pub use burn_dataset::{CellBatch, CellBatcher, CellItem};
pub use catalog::ClassCatalog;
pub use filter::{filter_corpus, FilteredEntry, FilteredIndex};
pub use loader::{ImageFolderCorpus, RawSample};
pub use pipeline::{DataPipeline, PipelineConfig};
pub use split::{stratified_split, SplitAssignment, SplitFractions, SplitStats};
pub use view::{SplitView, Transform};
pub use weights::{class_balanced_weights, WeightedEpochSampler};

/// Default number of working classes
pub const NUM_CLASSES: usize = 8;

/// Default image side length (PBC images are 224x224)
pub const DEFAULT_IMAGE_SIZE: usize = 224;

/// Peripheral blood cell classes, in canonical label order
pub const CLASS_NAMES: [&str; 8] = [
    "basophil",
    "eosinophil",
    "erythroblast",
    "ig",
    "lymphocyte",
    "monocyte",
    "neutrophil",
    "platelet",
];

/// Get the class name for a given default-catalog label
pub fn class_name(label: usize) -> Option<&'static str> {
    CLASS_NAMES.get(label).copied()
}

/// Get the default-catalog label for a given class name
pub fn class_index(name: &str) -> Option<usize> {
    CLASS_NAMES.iter().position(|&n| n == name)
}
