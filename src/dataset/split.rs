//! Stratified Train/Val/Test Splitting
//!
//! Partitions a filtered index into three disjoint position sets whose
//! per-class proportions match the requested fractions within one sample
//! of rounding. The split is performed in two stages, per class:
//!
//! 1. Train vs. held-out, at the combined val+test fraction
//! 2. Held-out into val and test, at their relative shares
//!
//! A ChaCha8 RNG seeded from the caller's seed decides which same-class
//! samples land on the fractional boundary, so the partition is
//! bit-for-bit reproducible for identical inputs and seed.

use std::path::Path;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::catalog::ClassCatalog;
use crate::dataset::filter::FilteredIndex;
use crate::utils::error::{CytoprepError, Result};

/// Held-out fractions for validation and test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitFractions {
    /// Fraction of the filtered corpus assigned to validation
    pub val: f64,
    /// Fraction of the filtered corpus assigned to test
    pub test: f64,
}

impl Default for SplitFractions {
    /// The 80/10/10 split used by the default pipeline
    fn default() -> Self {
        Self {
            val: 0.10,
            test: 0.10,
        }
    }
}

impl SplitFractions {
    /// Create validated fractions.
    ///
    /// Each fraction must be non-negative and the combined held-out
    /// fraction must lie strictly between 0 and 1.
    pub fn new(val: f64, test: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&val) || !(0.0..1.0).contains(&test) {
            return Err(CytoprepError::Config(format!(
                "split fractions must be in [0, 1): val={}, test={}",
                val, test
            )));
        }
        let held = val + test;
        if held <= 0.0 || held >= 1.0 {
            return Err(CytoprepError::Config(format!(
                "combined val+test fraction must be in (0, 1), got {}",
                held
            )));
        }
        Ok(Self { val, test })
    }

    /// Combined held-out fraction (val + test)
    pub fn held_out(&self) -> f64 {
        self.val + self.test
    }
}

/// A disjoint partition of `0..len(FilteredIndex)` into train/val/test
///
/// Positions index into the filtered index, not the raw corpus. Each
/// split's positions are stored in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAssignment {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitAssignment {
    /// Total number of assigned positions
    pub fn total_len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    /// Save the assignment to a JSON manifest for reproducibility
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CytoprepError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an assignment from a JSON manifest
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| CytoprepError::Serialization(e.to_string()))
    }
}

/// Stratified two-stage split of a filtered index.
///
/// Per class, the held-out count is the class size times the held-out
/// fraction rounded to the nearest whole sample, clamped so that at
/// least one sample stays in train and at least one is held out. The
/// held-out samples are then divided between val and test at their
/// relative shares; a fractional remainder is resolved by one seeded
/// draw per class, so a class of two ends up with one train sample and
/// one val-or-test sample chosen deterministically from the seed.
///
/// Fails with a split error naming every class that has exactly one
/// sample in the filtered index. Catalog classes absent from the index
/// are skipped.
pub fn stratified_split(
    index: &FilteredIndex,
    catalog: &ClassCatalog,
    fractions: SplitFractions,
    seed: u64,
) -> Result<SplitAssignment> {
    // Group filtered positions by label, in position order
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); catalog.len()];
    for (i, entry) in index.entries().iter().enumerate() {
        if let Some(bucket) = by_class.get_mut(entry.label) {
            bucket.push(i);
        }
    }

    let offending: Vec<&str> = by_class
        .iter()
        .enumerate()
        .filter(|(_, positions)| positions.len() == 1)
        .filter_map(|(label, _)| catalog.name(label))
        .collect();
    if !offending.is_empty() {
        return Err(CytoprepError::Split(format!(
            "classes with fewer than 2 samples cannot be stratified: {}",
            offending.join(", ")
        )));
    }

    let held_fraction = fractions.held_out();
    let val_share = fractions.val / held_fraction;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut train = Vec::new();
    let mut val = Vec::new();
    let mut test = Vec::new();

    // by_class is indexed by label, so iteration order is deterministic
    for positions in by_class.iter_mut() {
        if positions.is_empty() {
            continue;
        }
        let n = positions.len();
        positions.shuffle(&mut rng);

        let n_held = ((n as f64 * held_fraction).round() as usize).clamp(1, n - 1);
        let (held, kept) = positions.split_at(n_held);
        train.extend_from_slice(kept);

        let exact_val = held.len() as f64 * val_share;
        let mut n_val = exact_val.floor() as usize;
        let remainder = exact_val - n_val as f64;
        if remainder > 0.0 && rng.gen_bool(remainder) {
            n_val += 1;
        }
        val.extend_from_slice(&held[..n_val]);
        test.extend_from_slice(&held[n_val..]);
    }

    train.sort_unstable();
    val.sort_unstable();
    test.sort_unstable();

    Ok(SplitAssignment { train, val, test })
}

/// Per-class sample counts for each split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitStats {
    pub class_names: Vec<String>,
    pub train_counts: Vec<usize>,
    pub val_counts: Vec<usize>,
    pub test_counts: Vec<usize>,
}

impl SplitStats {
    /// Tally per-class counts for an assignment over a filtered index
    pub fn new(
        index: &FilteredIndex,
        assignment: &SplitAssignment,
        catalog: &ClassCatalog,
    ) -> Self {
        let tally = |positions: &[usize]| {
            let mut counts = vec![0usize; catalog.len()];
            for &p in positions {
                if let Some(entry) = index.get(p) {
                    counts[entry.label] += 1;
                }
            }
            counts
        };

        Self {
            class_names: catalog.names().to_vec(),
            train_counts: tally(&assignment.train),
            val_counts: tally(&assignment.val),
            test_counts: tally(&assignment.test),
        }
    }

    /// Split sizes as (train, val, test)
    pub fn sizes(&self) -> (usize, usize, usize) {
        (
            self.train_counts.iter().sum(),
            self.val_counts.iter().sum(),
            self.test_counts.iter().sum(),
        )
    }
}

impl std::fmt::Display for SplitStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (train, val, test) = self.sizes();
        writeln!(f, "Split Statistics (total: {}):", train + val + test)?;
        writeln!(
            f,
            "  {:20} {:>8} {:>8} {:>8}",
            "class", "train", "val", "test"
        )?;
        for (i, name) in self.class_names.iter().enumerate() {
            writeln!(
                f,
                "  {:20} {:>8} {:>8} {:>8}",
                name, self.train_counts[i], self.val_counts[i], self.test_counts[i]
            )?;
        }
        writeln!(f, "  {:20} {:>8} {:>8} {:>8}", "total", train, val, test)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::filter::filter_corpus;
    use crate::dataset::loader::RawSample;
    use std::collections::HashSet;
    use std::path::PathBuf;

    /// Catalog of `counts.len()` classes and an index with `counts[i]`
    /// samples of class `i`
    fn index_of_counts(counts: &[usize]) -> (FilteredIndex, ClassCatalog) {
        let names: Vec<String> = (0..counts.len()).map(|i| format!("class_{}", i)).collect();
        let mut samples = Vec::new();
        for (class, &count) in counts.iter().enumerate() {
            for i in 0..count {
                samples.push(RawSample {
                    path: PathBuf::from(format!("class_{}/img_{}.jpg", class, i)),
                    class_name: format!("class_{}", class),
                });
            }
        }
        let catalog = ClassCatalog::new(names).unwrap();
        let index = filter_corpus(&samples, &catalog).unwrap();
        (index, catalog)
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let (index, catalog) = index_of_counts(&[100, 100, 100, 100, 100]);
        let assignment =
            stratified_split(&index, &catalog, SplitFractions::default(), 42).unwrap();

        let mut seen = HashSet::new();
        for p in assignment
            .train
            .iter()
            .chain(&assignment.val)
            .chain(&assignment.test)
        {
            assert!(seen.insert(*p), "position {} assigned twice", p);
        }
        assert_eq!(seen.len(), index.len());
        assert!(seen.iter().all(|&p| p < index.len()));
    }

    #[test]
    fn test_stratification_within_rounding_tolerance() {
        let (index, catalog) = index_of_counts(&[200, 50, 17, 9]);
        let fractions = SplitFractions::default();
        let assignment = stratified_split(&index, &catalog, fractions, 7).unwrap();
        let stats = SplitStats::new(&index, &assignment, &catalog);

        let totals = index.class_counts(catalog.len());
        for c in 0..catalog.len() {
            let n_c = totals[c] as f64;
            let tolerance = 1.0 / n_c;
            let train_frac = stats.train_counts[c] as f64 / n_c;
            let val_frac = stats.val_counts[c] as f64 / n_c;
            let test_frac = stats.test_counts[c] as f64 / n_c;
            assert!(
                (train_frac - (1.0 - fractions.held_out())).abs() <= tolerance + 1e-9,
                "class {} train fraction {} off target",
                c,
                train_frac
            );
            assert!((val_frac - fractions.val).abs() <= tolerance + 1e-9);
            assert!((test_frac - fractions.test).abs() <= tolerance + 1e-9);
        }
    }

    #[test]
    fn test_split_is_deterministic_for_fixed_seed() {
        let (index, catalog) = index_of_counts(&[80, 20, 33]);
        let a = stratified_split(&index, &catalog, SplitFractions::default(), 42).unwrap();
        let b = stratified_split(&index, &catalog, SplitFractions::default(), 42).unwrap();
        assert_eq!(a, b);

        let c = stratified_split(&index, &catalog, SplitFractions::default(), 43).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_singleton_class_is_split_error() {
        let (index, catalog) = index_of_counts(&[10, 1, 10]);
        let result = stratified_split(&index, &catalog, SplitFractions::default(), 42);
        match result {
            Err(CytoprepError::Split(msg)) => assert!(msg.contains("class_1")),
            other => panic!("expected split error, got {:?}", other),
        }
    }

    #[test]
    fn test_class_of_two_keeps_one_in_train() {
        let (index, catalog) = index_of_counts(&[2, 40]);
        let assignment =
            stratified_split(&index, &catalog, SplitFractions::default(), 42).unwrap();
        let stats = SplitStats::new(&index, &assignment, &catalog);

        assert_eq!(stats.train_counts[0], 1);
        // The remaining sample lands in val or test, never dropped
        assert_eq!(stats.val_counts[0] + stats.test_counts[0], 1);
    }

    #[test]
    fn test_absent_catalog_class_is_skipped() {
        let names = vec!["a".to_string(), "b".to_string(), "ghost".to_string()];
        let catalog = ClassCatalog::new(names).unwrap();
        let mut samples = Vec::new();
        for i in 0..10 {
            samples.push(RawSample {
                path: PathBuf::from(format!("a/{}.jpg", i)),
                class_name: "a".to_string(),
            });
            samples.push(RawSample {
                path: PathBuf::from(format!("b/{}.jpg", i)),
                class_name: "b".to_string(),
            });
        }
        let index = filter_corpus(&samples, &catalog).unwrap();
        let assignment =
            stratified_split(&index, &catalog, SplitFractions::default(), 1).unwrap();
        assert_eq!(assignment.total_len(), index.len());
    }

    #[test]
    fn test_invalid_fractions_rejected() {
        assert!(SplitFractions::new(0.5, 0.5).is_err());
        assert!(SplitFractions::new(-0.1, 0.2).is_err());
        assert!(SplitFractions::new(0.0, 0.0).is_err());
        assert!(SplitFractions::new(0.1, 0.1).is_ok());
    }

    #[test]
    fn test_manifest_roundtrip() {
        let (index, catalog) = index_of_counts(&[30, 12]);
        let assignment =
            stratified_split(&index, &catalog, SplitFractions::default(), 9).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("splits.json");
        assignment.save(&path).unwrap();
        let loaded = SplitAssignment::load(&path).unwrap();
        assert_eq!(assignment, loaded);
    }
}
