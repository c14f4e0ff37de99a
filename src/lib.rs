//! # cytoprep
//!
//! Data preparation for imbalanced peripheral blood cell image corpora.
//!
//! The pipeline filters a raw labeled corpus down to a fixed working set
//! of classes, partitions it into stratified train/validation/test
//! splits, and computes class-balanced resampling weights so rare cell
//! types are seen as often as common ones during training.
//!
//! ## Modules
//!
//! - `dataset`: corpus loading, label filtering, stratified splitting,
//!   weighting, split views, transforms, and Burn dataloader glue
//! - `utils`: error types and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cytoprep::{DataPipeline, PipelineConfig};
//!
//! let pipeline = DataPipeline::build(PipelineConfig::for_root("data/pbc"))?;
//! println!("{}", pipeline.stats());
//! ```

pub mod dataset;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::pipeline::{DataPipeline, PipelineConfig};
pub use dataset::{
    class_balanced_weights, filter_corpus, stratified_split, CellBatch, CellBatcher, CellItem,
    ClassCatalog, EvalTransform, FilteredIndex, ImageFolderCorpus, RawSample, SplitAssignment,
    SplitFractions, SplitStats, SplitView, TrainTransform, Transform, WeightedEpochSampler,
    CLASS_NAMES, DEFAULT_IMAGE_SIZE, NUM_CLASSES,
};
pub use utils::error::{CytoprepError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
