//! Pipeline Assembly
//!
//! Public entry point: wires corpus enumeration, label filtering,
//! stratified splitting, class-balanced weighting, and split views into
//! one ready-to-iterate pipeline. Every stage runs eagerly, so a
//! successfully built pipeline already satisfies the index, split, and
//! weight invariants.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::dataset::augmentation::{EvalTransform, TrainTransform};
use crate::dataset::catalog::ClassCatalog;
use crate::dataset::filter::{filter_corpus, FilteredIndex};
use crate::dataset::loader::ImageFolderCorpus;
use crate::dataset::split::{stratified_split, SplitAssignment, SplitFractions, SplitStats};
use crate::dataset::view::{SplitView, Transform};
use crate::dataset::weights::{class_balanced_weights, WeightedEpochSampler};
use crate::dataset::{CLASS_NAMES, DEFAULT_IMAGE_SIZE};
use crate::utils::error::{CytoprepError, Result};

/// Everything the assembler needs, supplied at construction.
///
/// No global state: catalog, fractions, and seed are all scoped to one
/// pipeline build.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory of the image-folder corpus
    pub corpus_root: PathBuf,
    /// Ordered working set of class names
    pub class_names: Vec<String>,
    /// Batch size for the downstream batching loader
    pub batch_size: usize,
    /// Val/test held-out fractions
    pub fractions: SplitFractions,
    /// Seed for the stratified split and epoch sampling
    pub seed: u64,
    /// Worker count for the downstream batching loader
    pub num_workers: usize,
    /// Side length images are resized to
    pub image_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from("data/pbc"),
            class_names: CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            batch_size: 16,
            fractions: SplitFractions::default(),
            seed: 42,
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            image_size: DEFAULT_IMAGE_SIZE as u32,
        }
    }
}

impl PipelineConfig {
    /// Config for a corpus root with defaults for everything else
    pub fn for_root<P: Into<PathBuf>>(corpus_root: P) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            ..Self::default()
        }
    }
}

/// A fully constructed data pipeline: three split views plus the
/// training resampling policy.
///
/// The train view pairs with `train_sampler` (weighted, with
/// replacement); val and test iterate sequentially via
/// [`SplitView::iter`]. All shared structures are immutable after
/// construction.
pub struct DataPipeline {
    pub catalog: ClassCatalog,
    pub train: SplitView,
    pub val: SplitView,
    pub test: SplitView,
    pub train_sampler: WeightedEpochSampler,
    pub assignment: SplitAssignment,
    pub config: PipelineConfig,
    index: Arc<FilteredIndex>,
}

impl DataPipeline {
    /// Build the pipeline with the default train/eval transforms.
    pub fn build(config: PipelineConfig) -> Result<Self> {
        let train_transform = Arc::new(TrainTransform::new(config.image_size));
        let eval_transform = Arc::new(EvalTransform::new(config.image_size));
        Self::build_with_transforms(config, train_transform, eval_transform.clone(), eval_transform)
    }

    /// Build the pipeline with caller-supplied per-split transforms.
    ///
    /// Runs filter, split, and weighting exactly once, eagerly. Fails
    /// with a data source error if the corpus root is missing or empty
    /// after filtering.
    pub fn build_with_transforms(
        config: PipelineConfig,
        train_transform: Arc<dyn Transform>,
        val_transform: Arc<dyn Transform>,
        test_transform: Arc<dyn Transform>,
    ) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(CytoprepError::Config("batch size must be > 0".to_string()));
        }

        let catalog = ClassCatalog::new(config.class_names.clone())?;
        let corpus = Arc::new(ImageFolderCorpus::open(&config.corpus_root)?);
        let index = Arc::new(filter_corpus(corpus.samples(), &catalog)?);
        let assignment = stratified_split(&index, &catalog, config.fractions, config.seed)?;

        let train_labels: Vec<usize> = assignment
            .train
            .iter()
            .filter_map(|&p| index.get(p).map(|e| e.label))
            .collect();
        let weights = class_balanced_weights(&train_labels)?;
        let train_sampler = WeightedEpochSampler::new(weights)?;

        let train = SplitView::new(
            corpus.clone(),
            index.clone(),
            assignment.train.clone(),
            train_transform,
        );
        let val = SplitView::new(
            corpus.clone(),
            index.clone(),
            assignment.val.clone(),
            val_transform,
        );
        let test = SplitView::new(
            corpus,
            index.clone(),
            assignment.test.clone(),
            test_transform,
        );

        info!(
            "Pipeline built: {} train / {} val / {} test samples, {} classes",
            train.len(),
            val.len(),
            test.len(),
            catalog.len()
        );

        Ok(Self {
            catalog,
            train,
            val,
            test,
            train_sampler,
            assignment,
            config,
            index,
        })
    }

    /// Per-class counts for every split
    pub fn stats(&self) -> SplitStats {
        SplitStats::new(&self.index, &self.assignment, &self.catalog)
    }

    /// The filtered index underlying all three views
    pub fn filtered_index(&self) -> &FilteredIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::TempDir;

    /// Cheap stand-in for the real transforms, avoids full-size resizing
    struct Tiny;

    impl Transform for Tiny {
        fn apply(&self, image: DynamicImage) -> Vec<f32> {
            vec![image.width() as f32]
        }
    }

    fn corpus_on_disk(layout: &[(&str, usize)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (class, count) in layout {
            let class_dir = dir.path().join(class);
            std::fs::create_dir(&class_dir).unwrap();
            for i in 0..*count {
                let img = RgbImage::from_pixel(6, 6, Rgb([i as u8, 50, 50]));
                img.save(class_dir.join(format!("{}.png", i))).unwrap();
            }
        }
        dir
    }

    fn build_tiny(dir: &TempDir, class_names: &[&str]) -> Result<DataPipeline> {
        let config = PipelineConfig {
            class_names: class_names.iter().map(|s| s.to_string()).collect(),
            ..PipelineConfig::for_root(dir.path())
        };
        DataPipeline::build_with_transforms(config, Arc::new(Tiny), Arc::new(Tiny), Arc::new(Tiny))
    }

    #[test]
    fn test_imbalanced_scenario_end_to_end() {
        // 8 of class a, 2 of class b, plus a class outside the catalog
        let dir = corpus_on_disk(&[("a", 8), ("b", 2), ("ignored", 3)]);
        let pipeline = build_tiny(&dir, &["a", "b"]).unwrap();

        assert_eq!(pipeline.filtered_index().len(), 10);
        assert_eq!(
            pipeline.train.len() + pipeline.val.len() + pipeline.test.len(),
            10
        );

        // Train keeps at least one of each class
        let stats = pipeline.stats();
        assert!(stats.train_counts[0] >= 1);
        assert!(stats.train_counts[1] >= 1);

        // No label outside the two catalog classes appears anywhere
        for view in [&pipeline.train, &pipeline.val, &pipeline.test] {
            assert!(view.labels().iter().all(|&l| l < 2));
        }
    }

    #[test]
    fn test_missing_root_fails_before_split() {
        let config = PipelineConfig::for_root("/no/such/corpus");
        let result = DataPipeline::build(config);
        assert!(matches!(result, Err(CytoprepError::DataSource(_))));
    }

    #[test]
    fn test_weight_mass_per_class() {
        let dir = corpus_on_disk(&[("a", 20), ("b", 5)]);
        let pipeline = build_tiny(&dir, &["a", "b"]).unwrap();

        let labels = pipeline.train.labels();
        let weights = pipeline.train_sampler.weights();
        for class in 0..2 {
            let mass: f64 = labels
                .iter()
                .zip(weights)
                .filter(|(&l, _)| l == class)
                .map(|(_, &w)| w)
                .sum();
            assert!((mass - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_train_epoch_draws_train_len_positions() {
        let dir = corpus_on_disk(&[("a", 12), ("b", 8)]);
        let pipeline = build_tiny(&dir, &["a", "b"]).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(pipeline.config.seed);
        let epoch = pipeline.train_sampler.draw_epoch(&mut rng);
        assert_eq!(epoch.len(), pipeline.train.len());
        assert!(epoch.iter().all(|&i| i < pipeline.train.len()));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let dir = corpus_on_disk(&[("a", 15), ("b", 6)]);
        let p1 = build_tiny(&dir, &["a", "b"]).unwrap();
        let p2 = build_tiny(&dir, &["a", "b"]).unwrap();
        assert_eq!(p1.assignment, p2.assignment);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = corpus_on_disk(&[("a", 4)]);
        let config = PipelineConfig {
            batch_size: 0,
            class_names: vec!["a".to_string()],
            ..PipelineConfig::for_root(dir.path())
        };
        assert!(matches!(
            DataPipeline::build(config),
            Err(CytoprepError::Config(_))
        ));
    }

    #[test]
    fn test_views_materialize_samples() {
        let dir = corpus_on_disk(&[("a", 10), ("b", 4)]);
        let pipeline = build_tiny(&dir, &["a", "b"]).unwrap();

        let (data, label) = pipeline.val.get(0).unwrap();
        assert_eq!(data, vec![6.0]);
        assert!(label < 2);
    }
}
