//! Burn Dataloader Integration
//!
//! Implements Burn's `Dataset` trait for split views and a `Batcher`
//! that stacks materialized samples into tensors. This is the seam the
//! external batching/prefetch loader plugs into; Burn's dataloader owns
//! worker threads and calls `get` concurrently, which is safe because a
//! view only reads immutable shared state.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::dataset::view::SplitView;

/// A sample materialized by a split view, ready for batching
#[derive(Clone, Debug)]
pub struct CellItem {
    /// Transformed image as flattened CHW float data
    pub image: Vec<f32>,
    /// Remapped class label
    pub label: usize,
}

impl Dataset<CellItem> for SplitView {
    fn get(&self, index: usize) -> Option<CellItem> {
        SplitView::get(self, index)
            .ok()
            .map(|(image, label)| CellItem { image, label })
    }

    fn len(&self) -> usize {
        SplitView::len(self)
    }
}

/// A batch of cell images for training or evaluation
#[derive(Clone, Debug)]
pub struct CellBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher stacking transformed samples into tensors.
///
/// Normalization already happened in the split transforms, so batching
/// is a pure reshape.
#[derive(Clone, Debug)]
pub struct CellBatcher<B: Backend> {
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> CellBatcher<B> {
    /// Create a batcher for the given device and image side length
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<CellItem, CellBatch<B>> for CellBatcher<B> {
    fn batch(&self, items: Vec<CellItem>) -> CellBatch<B> {
        let batch_size = items.len();
        let (height, width) = (self.image_size, self.image_size);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, height, width]),
            &self.device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets_data, [batch_size]),
            &self.device,
        );

        CellBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::catalog::ClassCatalog;
    use crate::dataset::filter::filter_corpus;
    use crate::dataset::loader::ImageFolderCorpus;
    use crate::dataset::view::Transform;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Unit;

    impl Transform for Unit {
        fn apply(&self, _image: DynamicImage) -> Vec<f32> {
            vec![1.0; 3 * 4 * 4]
        }
    }

    fn view_on_disk() -> (TempDir, SplitView) {
        let dir = TempDir::new().unwrap();
        let class_dir = dir.path().join("monocyte");
        std::fs::create_dir(&class_dir).unwrap();
        for i in 0..3 {
            RgbImage::from_pixel(4, 4, Rgb([i, i, i]))
                .save(class_dir.join(format!("{}.png", i)))
                .unwrap();
        }
        let corpus = Arc::new(ImageFolderCorpus::open(dir.path()).unwrap());
        let catalog = ClassCatalog::new(["monocyte"]).unwrap();
        let index = Arc::new(filter_corpus(corpus.samples(), &catalog).unwrap());
        let view = SplitView::new(corpus, index, vec![0, 1, 2], Arc::new(Unit));
        (dir, view)
    }

    #[test]
    fn test_dataset_impl_get_and_len() {
        let (_dir, view) = view_on_disk();
        assert_eq!(Dataset::len(&view), 3);

        let item = Dataset::get(&view, 0).unwrap();
        assert_eq!(item.label, 0);
        assert_eq!(item.image.len(), 3 * 4 * 4);

        assert!(Dataset::get(&view, 3).is_none());
    }
}
