//! # drbm-examples utilities
//!
//! Small seeded datasets for exercising DRBM training end to end.

use drbm_core::{DrbmError, DrbmResult};
use drbm_models::spin_configurations;
use drbm_train::TrainingExample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Isotropic Gaussian clusters, one per label.
///
/// Draws `n_per_class` points around each entry of `centers` with standard
/// deviation `std`. Label `k` is the index of the center. Examples are
/// grouped by label; shuffle or split with
/// [`TrainingDataset::from_examples`](drbm_train::TrainingDataset::from_examples).
pub fn gaussian_blobs(
    centers: &[Vec<f64>],
    n_per_class: usize,
    std: f64,
    seed: u64,
) -> DrbmResult<Vec<TrainingExample>> {
    let dim = match centers.first() {
        Some(c) => c.len(),
        None => return Err(DrbmError::invalid_config("centers", "need at least one center")),
    };
    if let Some(bad) = centers.iter().find(|c| c.len() != dim) {
        return Err(DrbmError::invalid_dimension("blob center", dim, bad.len()));
    }
    let noise = Normal::new(0.0, std)
        .map_err(|e| DrbmError::invalid_config("std", e.to_string()))?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut examples = Vec::with_capacity(centers.len() * n_per_class);
    for (label, center) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            let x = center.iter().map(|&c| c + noise.sample(&mut rng)).collect();
            examples.push(TrainingExample::new(x, label));
        }
    }
    Ok(examples)
}

/// Every `±1` input of length `n_bits`, labeled by parity.
///
/// Label 1 when the number of `-1` entries is odd. With `n_bits = 2` this is
/// XOR, which no model without hidden units can fit.
pub fn parity(n_bits: usize) -> DrbmResult<Vec<TrainingExample>> {
    if n_bits == 0 || n_bits > 16 {
        return Err(DrbmError::invalid_config("n_bits", "must be in 1..=16"));
    }
    Ok(spin_configurations(n_bits)
        .into_iter()
        .map(|x| {
            let negatives = x.iter().filter(|&&v| v < 0.0).count();
            TrainingExample::new(x, negatives % 2)
        })
        .collect())
}
