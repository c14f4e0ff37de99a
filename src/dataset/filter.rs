//! Label Filtering and Remapping
//!
//! Restricts a raw corpus to the classes in a catalog and remaps every
//! kept sample's label to its catalog position. The filter is stable:
//! kept samples appear in the same relative order as in the raw corpus.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::catalog::ClassCatalog;
use crate::dataset::loader::RawSample;
use crate::utils::error::{CytoprepError, Result};

/// One kept sample: its position in the raw corpus and its remapped label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredEntry {
    /// Position in the raw corpus enumeration
    pub position: usize,
    /// Label index into the class catalog
    pub label: usize,
}

/// The filtered, relabeled view of a corpus
///
/// Built once per pipeline construction and immutable afterwards; the
/// split assignment and all views index into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredIndex {
    entries: Vec<FilteredEntry>,
}

impl FilteredIndex {
    /// All entries in first-encounter order
    pub fn entries(&self) -> &[FilteredEntry] {
        &self.entries
    }

    /// Entry at the given index position
    pub fn get(&self, index: usize) -> Option<FilteredEntry> {
        self.entries.get(index).copied()
    }

    /// Number of kept samples
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remapped labels in index order
    pub fn labels(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.label).collect()
    }

    /// Per-class sample counts over the whole index
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for entry in &self.entries {
            if entry.label < num_classes {
                counts[entry.label] += 1;
            }
        }
        counts
    }
}

/// Filter a raw corpus down to the catalog's working set.
///
/// Samples whose raw class name is not in the catalog are skipped.
/// Fails with a data source error if the corpus is empty, or if no
/// sample matches any catalog class.
pub fn filter_corpus(samples: &[RawSample], catalog: &ClassCatalog) -> Result<FilteredIndex> {
    if catalog.is_empty() {
        return Err(CytoprepError::Config("class catalog is empty".to_string()));
    }
    if samples.is_empty() {
        return Err(CytoprepError::DataSource(
            "corpus contains no samples".to_string(),
        ));
    }

    let entries: Vec<FilteredEntry> = samples
        .iter()
        .enumerate()
        .filter_map(|(position, sample)| {
            catalog
                .index_of(&sample.class_name)
                .map(|label| FilteredEntry { position, label })
        })
        .collect();

    if entries.is_empty() {
        return Err(CytoprepError::DataSource(format!(
            "no samples left after filtering to {} catalog classes",
            catalog.len()
        )));
    }

    info!(
        "Filtered corpus: kept {} of {} samples ({} classes)",
        entries.len(),
        samples.len(),
        catalog.len()
    );

    Ok(FilteredIndex { entries })
}
