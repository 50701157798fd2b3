//! Energy-based view of the model and exact enumeration.
//!
//! A conditional EBM defines `p(h, y | x) ∝ exp(-E(h, y | x))` over a
//! finite set of hidden spin configurations and labels. For small hidden
//! layers the normalizer can be summed term by term, which gives an
//! independent check on the closed forms in [`crate::drbm`].

use drbm_core::{DrbmResult, Topology};
use itertools::Itertools;

/// Trait for models with an energy over (hidden, label) given an observed input.
pub trait ConditionalEbm {
    fn topology(&self) -> &Topology;

    /// Energy of one full configuration. `hidden` holds ±1 spins.
    fn energy(&self, hidden: &[f64], label: usize) -> DrbmResult<f64>;
}

/// Every ±1 assignment of `n` spins, first spin varying slowest.
///
/// Yields a single empty configuration when `n == 0`.
pub fn spin_configurations(n: usize) -> Vec<Vec<f64>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    (0..n)
        .map(|_| [-1.0, 1.0])
        .multi_cartesian_product()
        .collect()
}

/// Exact expectations computed by summing over all `2^H · ysize` states.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumeratedMoments {
    /// `Σ exp(-E)` over all states (the true partition function)
    pub partition: f64,
    /// `p(y = k | x)`
    pub label_probs: Vec<f64>,
    /// `E[h_j]`
    pub hidden_means: Vec<f64>,
    /// `E[h_j y_k]`, indexed `[j][k]`
    pub hidden_label_means: Vec<Vec<f64>>,
}

/// Enumerate every configuration and accumulate the exact moments.
///
/// Cost is `O(2^H · ysize · H)`; only practical for small hidden layers.
pub fn enumerate_moments<M: ConditionalEbm>(model: &M) -> DrbmResult<EnumeratedMoments> {
    let hsize = model.topology().hsize();
    let ysize = model.topology().ysize();

    let mut partition = 0.0;
    let mut label_mass = vec![0.0; ysize];
    let mut hidden_label_mass = vec![vec![0.0; ysize]; hsize];

    for hidden in spin_configurations(hsize) {
        for k in 0..ysize {
            let weight = (-model.energy(&hidden, k)?).exp();
            partition += weight;
            label_mass[k] += weight;
            for (j, &h) in hidden.iter().enumerate() {
                hidden_label_mass[j][k] += h * weight;
            }
        }
    }

    let label_probs = label_mass.iter().map(|m| m / partition).collect();
    let hidden_label_means: Vec<Vec<f64>> = hidden_label_mass
        .iter()
        .map(|row| row.iter().map(|m| m / partition).collect())
        .collect();
    let hidden_means = hidden_label_means
        .iter()
        .map(|row| row.iter().sum())
        .collect();

    Ok(EnumeratedMoments {
        partition,
        label_probs,
        hidden_means,
        hidden_label_means,
    })
}
