//! Class-Balanced Sample Weights and Weighted Epoch Sampling
//!
//! Rare classes in the training split receive proportionally larger
//! resampling weights, so a weighted sampler drawing with replacement
//! sees every class equally often in expectation.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::utils::error::{CytoprepError, Result};

/// Inverse-frequency weight per training sample.
///
/// Each sample of class `c` receives weight `1 / n_c` where `n_c` is the
/// class count within `train_labels`; the weights of every class sum to
/// exactly 1, giving equal total sampling mass per class. Output order
/// matches input order.
pub fn class_balanced_weights(train_labels: &[usize]) -> Result<Vec<f64>> {
    if train_labels.is_empty() {
        return Err(CytoprepError::Split(
            "training set is empty, cannot compute class weights".to_string(),
        ));
    }

    let num_classes = train_labels.iter().max().copied().unwrap_or(0) + 1;
    let mut counts = vec![0usize; num_classes];
    for &label in train_labels {
        counts[label] += 1;
    }

    Ok(train_labels
        .iter()
        .map(|&label| 1.0 / counts[label] as f64)
        .collect())
}

/// Training iteration policy: weighted sampling with replacement.
///
/// One epoch draws exactly `num_draws` positions (default: one per
/// training sample), each chosen independently with probability
/// proportional to its weight. The RNG is supplied by the caller so
/// epoch order stays reproducible under a fixed seed.
#[derive(Debug, Clone)]
pub struct WeightedEpochSampler {
    weights: Vec<f64>,
    dist: WeightedIndex<f64>,
    num_draws: usize,
}

impl WeightedEpochSampler {
    /// Build a sampler over per-position weights.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        let dist = WeightedIndex::new(&weights).map_err(|e| {
            CytoprepError::Split(format!("invalid sampling weights: {}", e))
        })?;
        let num_draws = weights.len();
        Ok(Self {
            weights,
            dist,
            num_draws,
        })
    }

    /// Override the number of draws per epoch
    pub fn with_num_draws(mut self, num_draws: usize) -> Self {
        self.num_draws = num_draws;
        self
    }

    /// Unnormalized selection weights, one per position
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of positions drawn per epoch
    pub fn num_draws(&self) -> usize {
        self.num_draws
    }

    /// Draw one epoch of positions, with replacement
    pub fn draw_epoch<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        (0..self.num_draws).map(|_| self.dist.sample(rng)).collect()
    }
}
