//! Split Views
//!
//! A split view is a read-only indirection over the filtered index: it
//! holds the positions assigned to one split and materializes a
//! (transformed image, label) pair on demand. Nothing is cached, and all
//! shared state is immutable, so `get` may be called from any number of
//! loader workers concurrently.

use std::sync::Arc;

use image::DynamicImage;

use crate::dataset::filter::FilteredIndex;
use crate::dataset::loader::ImageFolderCorpus;
use crate::utils::error::{CytoprepError, Result};

/// Per-split image transform.
///
/// Implementations take a decoded image and produce CHW float tensor
/// data. A training transform may be stochastic; val/test transforms
/// must be deterministic. Implementations must be callable from multiple
/// threads at once.
pub trait Transform: Send + Sync {
    fn apply(&self, image: DynamicImage) -> Vec<f32>;
}

/// A read-only view over one split of the filtered corpus
#[derive(Clone)]
pub struct SplitView {
    corpus: Arc<ImageFolderCorpus>,
    index: Arc<FilteredIndex>,
    positions: Vec<usize>,
    transform: Arc<dyn Transform>,
}

impl SplitView {
    /// Create a view over the given filtered-index positions
    pub fn new(
        corpus: Arc<ImageFolderCorpus>,
        index: Arc<FilteredIndex>,
        positions: Vec<usize>,
        transform: Arc<dyn Transform>,
    ) -> Self {
        Self {
            corpus,
            index,
            positions,
            transform,
        }
    }

    /// Number of samples in this split
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the split is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Remapped label of the sample at view position `i`, without
    /// touching the image file
    pub fn label(&self, i: usize) -> Result<usize> {
        let entry = self.entry(i)?;
        Ok(entry.label)
    }

    /// Remapped labels for the whole split, in view order
    pub fn labels(&self) -> Vec<usize> {
        self.positions
            .iter()
            .filter_map(|&p| self.index.get(p).map(|e| e.label))
            .collect()
    }

    /// Materialize the sample at view position `i`.
    ///
    /// Resolves the position through the filtered index, decodes the
    /// image from the corpus, applies the split's transform, and returns
    /// the tensor data with its label. I/O and decode failures from the
    /// corpus loader are surfaced unchanged.
    pub fn get(&self, i: usize) -> Result<(Vec<f32>, usize)> {
        let entry = self.entry(i)?;
        let image = self.corpus.load(entry.position)?;
        Ok((self.transform.apply(image), entry.label))
    }

    /// Sequential single-pass iteration over the split, in view order.
    /// This is the iteration policy for the val and test splits.
    pub fn iter(&self) -> impl Iterator<Item = Result<(Vec<f32>, usize)>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    fn entry(&self, i: usize) -> Result<crate::dataset::filter::FilteredEntry> {
        let position = *self
            .positions
            .get(i)
            .ok_or(CytoprepError::IndexOutOfRange {
                index: i,
                len: self.positions.len(),
            })?;
        self.index
            .get(position)
            .ok_or(CytoprepError::IndexOutOfRange {
                index: position,
                len: self.index.len(),
            })
    }
}

impl std::fmt::Debug for SplitView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitView")
            .field("len", &self.positions.len())
            .field("corpus_root", &self.corpus.root_dir())
            .finish()
    }
}
