//! Labeled examples and train/validation splits.

use drbm_core::{DrbmError, DrbmResult, Topology};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A single observation: an input vector and its label index.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub x: Vec<f64>,
    pub y: usize,
}

impl TrainingExample {
    pub fn new(x: Vec<f64>, y: usize) -> Self {
        TrainingExample { x, y }
    }

    /// Check `x` has `xsize` entries and `y < ysize`.
    pub fn validate(&self, topology: &Topology) -> DrbmResult<()> {
        topology.input.check_len(self.x.len(), "training example")?;
        topology.label.check_index(self.y, "training example")
    }
}

/// Training set with a held-out validation split.
#[derive(Debug, Clone, Default)]
pub struct TrainingDataset {
    pub train: Vec<TrainingExample>,
    pub validation: Vec<TrainingExample>,
}

impl TrainingDataset {
    pub fn new(train: Vec<TrainingExample>, validation: Vec<TrainingExample>) -> Self {
        Self { train, validation }
    }

    /// Pair up inputs and labels.
    pub fn from_xy(xs: Vec<Vec<f64>>, ys: Vec<usize>) -> DrbmResult<Vec<TrainingExample>> {
        if xs.len() != ys.len() {
            return Err(DrbmError::invalid_dimension(
                "TrainingDataset::from_xy labels",
                xs.len(),
                ys.len(),
            ));
        }
        Ok(xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| TrainingExample::new(x, y))
            .collect())
    }

    /// Shuffle with `seed`, then hold out `val_fraction` of the examples.
    pub fn from_examples(
        mut examples: Vec<TrainingExample>,
        val_fraction: f64,
        seed: u64,
    ) -> DrbmResult<Self> {
        if !(0.0..1.0).contains(&val_fraction) {
            return Err(DrbmError::invalid_config(
                "val_fraction",
                "must lie in [0, 1)",
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        examples.shuffle(&mut rng);

        let n = examples.len();
        let val_size = (n as f64 * val_fraction).round() as usize;
        let validation = examples.split_off(n - val_size);

        Ok(Self {
            train: examples,
            validation,
        })
    }

    /// Validate every example against the model's layer sizes.
    pub fn validate(&self, topology: &Topology) -> DrbmResult<()> {
        self.train
            .iter()
            .chain(self.validation.iter())
            .try_for_each(|ex| ex.validate(topology))
    }

    pub fn n_train(&self) -> usize {
        self.train.len()
    }

    pub fn n_val(&self) -> usize {
        self.validation.len()
    }

    pub fn n_total(&self) -> usize {
        self.n_train() + self.n_val()
    }
}

/// Visiting order of `n` examples for one epoch.
///
/// Identity order when `shuffle` is false; otherwise a permutation that
/// depends only on `seed` and `epoch`.
pub fn epoch_order(n: usize, shuffle: bool, seed: u64, epoch: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    if shuffle {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(epoch as u64));
        order.shuffle(&mut rng);
    }
    order
}
