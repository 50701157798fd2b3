//! Discriminative RBM with Ising hidden units.
//!
//! The model couples an observed input `x`, hidden spins `h_j ∈ {-1, +1}`,
//! and a label `y` through the energy
//!
//! ```text
//! E(h, y | x) = -( Σ_j b_j h_j + c_y + Σ_ij x_i W_ij h_j + Σ_j h_j V_jy )
//! ```
//!
//! There are no hidden-hidden couplings, so given `x` and `y` the spins are
//! independent and every sum over the `2^H` hidden configurations factors
//! into per-unit `cosh` terms of the local field
//!
//! ```text
//! μ_jk = b_j + V_jk + Σ_i W_ij x_i
//! ```
//!
//! All quantities are exact. Nothing is rescaled into log space, so the
//! partition value overflows for large hidden layers or large fields and the
//! resulting `inf`/`NaN` is returned as is.

use crate::ebm::ConditionalEbm;
use crate::params::{Matrix, MatrixMut, ParamGroup, ParamSet};
use drbm_core::{DrbmResult, InitConfig, Topology};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// All model-side expectations for the current input and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactMoments {
    pub partition_div_2h: f64,
    /// `p(y = k | x)`
    pub label_probs: Vec<f64>,
    /// `E[h_j | x]`
    pub hidden_means: Vec<f64>,
    /// `E[h_j y_k | x]` at `(j, k)`
    pub hidden_label_means: Matrix,
}

impl ExactMoments {
    /// `E[x_i h_j | x] = x_i E[h_j | x]`.
    #[inline]
    pub fn input_hidden(&self, x_i: f64, j: usize) -> f64 {
        x_i * self.hidden_means[j]
    }
}

/// Model state: layer sizes, the current input activation, and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DrbmModel {
    topology: Topology,
    x: Vec<f64>,
    params: ParamSet,
}

impl DrbmModel {
    /// Create a model with every bias, weight, and input value at zero.
    pub fn new(xsize: usize, hsize: usize, ysize: usize) -> DrbmResult<Self> {
        Ok(Self::from_topology(Topology::new(xsize, hsize, ysize)?))
    }

    pub fn from_topology(topology: Topology) -> Self {
        let params = ParamSet::zeros(&topology);
        DrbmModel {
            x: vec![0.0; topology.xsize()],
            topology,
            params,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn xsize(&self) -> usize {
        self.topology.xsize()
    }

    pub fn hsize(&self) -> usize {
        self.topology.hsize()
    }

    pub fn ysize(&self) -> usize {
        self.topology.ysize()
    }

    /// The input every inference call is conditioned on.
    pub fn input(&self) -> &[f64] {
        &self.x
    }

    /// Replace the current input. The length must equal `xsize`.
    pub fn set_input(&mut self, x: &[f64]) -> DrbmResult<()> {
        self.topology.input.check_len(x.len(), "set_input")?;
        self.x.copy_from_slice(x);
        Ok(())
    }

    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Replace every parameter at once.
    pub fn set_params(&mut self, params: ParamSet) -> DrbmResult<()> {
        params.check_shape(&self.topology)?;
        self.params = params;
        Ok(())
    }

    pub fn bias_h(&self) -> &[f64] {
        self.params.bias_h()
    }

    pub fn bias_y(&self) -> &[f64] {
        self.params.bias_y()
    }

    pub fn weight_xh(&self) -> &Matrix {
        self.params.weight_xh()
    }

    pub fn weight_hy(&self) -> &Matrix {
        self.params.weight_hy()
    }

    // In-place writes go through fixed-length views; reshaping is only
    // possible via `set_params`.

    pub fn bias_h_mut(&mut self) -> &mut [f64] {
        self.params.bias_h_mut()
    }

    pub fn bias_y_mut(&mut self) -> &mut [f64] {
        self.params.bias_y_mut()
    }

    pub fn weight_xh_mut(&mut self) -> MatrixMut<'_> {
        self.params.weight_xh_mut()
    }

    pub fn weight_hy_mut(&mut self) -> MatrixMut<'_> {
        self.params.weight_hy_mut()
    }

    /// Flat writable view of one parameter group.
    pub fn group_mut(&mut self, group: ParamGroup) -> &mut [f64] {
        self.params.group_mut(group)
    }

    /// Draw every weight from `N(0, weight_scale²)` with a seeded ChaCha8
    /// stream. Biases are reset to zero.
    pub fn randomize(&mut self, init: &InitConfig) {
        let mut rng = ChaCha8Rng::seed_from_u64(init.seed);
        self.params.bias_h_mut().fill(0.0);
        self.params.bias_y_mut().fill(0.0);
        for group in [ParamGroup::WeightXH, ParamGroup::WeightHY] {
            for w in self.params.group_mut(group) {
                let z: f64 = StandardNormal.sample(&mut rng);
                *w = z * init.weight_scale;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Local fields
    // -------------------------------------------------------------------------

    /// Effective field on hidden unit `j` for label `k` under the current input.
    pub fn local_field(&self, j: usize, k: usize) -> DrbmResult<f64> {
        self.check_hidden(j, "local_field")?;
        self.check_label(k, "local_field")?;
        Ok(self.field(&self.x, j, k))
    }

    /// Same as [`local_field`](Self::local_field) but for an arbitrary input
    /// of length `xsize`, leaving the model's own input untouched.
    pub fn local_field_for(&self, x: &[f64], j: usize, k: usize) -> DrbmResult<f64> {
        self.topology.input.check_len(x.len(), "local_field_for")?;
        self.check_hidden(j, "local_field_for")?;
        self.check_label(k, "local_field_for")?;
        Ok(self.field(x, j, k))
    }

    #[inline]
    fn field(&self, x: &[f64], j: usize, k: usize) -> f64 {
        let w = self.params.weight_xh();
        let mut value = self.params.bias_h()[j] + self.params.weight_hy()[(j, k)];
        for (i, &xi) in x.iter().enumerate() {
            value += w[(i, j)] * xi;
        }
        value
    }

    /// `μ_jk` for every hidden unit `j` under the current input.
    fn label_fields(&self, k: usize) -> Vec<f64> {
        (0..self.hsize()).map(|j| self.field(&self.x, j, k)).collect()
    }

    // -------------------------------------------------------------------------
    // Partition function
    // -------------------------------------------------------------------------

    /// `Z / 2^H = Σ_k exp(c_k) Π_j cosh(μ_jk)`.
    ///
    /// Recomputed from the current input and parameters on every call.
    pub fn partition_div_2h(&self) -> f64 {
        (0..self.ysize()).map(|k| self.label_potential(k)).sum()
    }

    /// The true partition function `2^H · partition_div_2h()`.
    ///
    /// Overflows to `inf` well before `H` reaches a thousand units; prefer
    /// [`partition_div_2h`](Self::partition_div_2h) when only ratios matter.
    pub fn partition_constant(&self) -> f64 {
        2f64.powi(self.hsize() as i32) * self.partition_div_2h()
    }

    fn label_potential(&self, k: usize) -> f64 {
        self.potential_from(k, &self.label_fields(k))
    }

    fn hidden_label_potential(&self, j: usize, k: usize) -> f64 {
        self.hidden_potential_from(j, k, &self.label_fields(k))
    }

    /// `exp(c_k) Π_j cosh(μ_jk)`, accumulated in unit order.
    fn potential_from(&self, k: usize, fields: &[f64]) -> f64 {
        let mut value = self.params.bias_y()[k].exp();
        for mu in fields {
            value *= mu.cosh();
        }
        value
    }

    /// `exp(c_k) Π_{l≠j} cosh(μ_lk) · sinh(μ_jk)`.
    fn hidden_potential_from(&self, j: usize, k: usize, fields: &[f64]) -> f64 {
        let mut value = self.params.bias_y()[k].exp();
        for (l, mu) in fields.iter().enumerate() {
            if l != j {
                value *= mu.cosh();
            }
        }
        value * fields[j].sinh()
    }

    /// Every label and hidden expectation in one pass.
    ///
    /// The `hsize × ysize` field table is built once, so the whole set costs
    /// `O(X·H·Y + H²·Y)` instead of rebuilding fields per query. Values are
    /// bit-for-bit those of the individual `*_given_z` queries.
    pub fn moments(&self) -> ExactMoments {
        let (hsize, ysize) = (self.hsize(), self.ysize());
        let fields: Vec<Vec<f64>> = (0..ysize).map(|k| self.label_fields(k)).collect();

        let potentials: Vec<f64> = fields
            .iter()
            .enumerate()
            .map(|(k, f)| self.potential_from(k, f))
            .collect();
        let z: f64 = potentials.iter().sum();

        let mut hidden_label = Matrix::zeros(hsize, ysize);
        for (k, f) in fields.iter().enumerate() {
            for j in 0..hsize {
                hidden_label[(j, k)] = self.hidden_potential_from(j, k, f);
            }
        }
        let hidden_means = (0..hsize)
            .map(|j| hidden_label.row(j).iter().sum::<f64>() / z)
            .collect();
        for value in hidden_label.as_mut_slice() {
            *value /= z;
        }

        ExactMoments {
            partition_div_2h: z,
            label_probs: potentials.into_iter().map(|p| p / z).collect(),
            hidden_means,
            hidden_label_means: hidden_label,
        }
    }

    // -------------------------------------------------------------------------
    // Conditional probabilities and expectations
    // -------------------------------------------------------------------------

    /// `p(y = k | x)`.
    pub fn cond_prob_y(&self, k: usize) -> DrbmResult<f64> {
        let z = self.partition_div_2h();
        self.cond_prob_y_given_z(k, z)
    }

    /// `p(y = k | x)` with a precomputed `z = partition_div_2h()`.
    pub fn cond_prob_y_given_z(&self, k: usize, z: f64) -> DrbmResult<f64> {
        self.check_label(k, "cond_prob_y")?;
        Ok(self.label_potential(k) / z)
    }

    /// `E[y_k]` for the one-hot label, identical to `p(y = k | x)`.
    pub fn expected_value_y(&self, k: usize) -> DrbmResult<f64> {
        let z = self.partition_div_2h();
        self.expected_value_y_given_z(k, z)
    }

    pub fn expected_value_y_given_z(&self, k: usize, z: f64) -> DrbmResult<f64> {
        self.check_label(k, "expected_value_y")?;
        Ok(self.label_potential(k) / z)
    }

    /// `E[h_j | x]`, marginalized over labels. Always within `[-1, 1]`.
    pub fn expected_value_h(&self, j: usize) -> DrbmResult<f64> {
        let z = self.partition_div_2h();
        self.expected_value_h_given_z(j, z)
    }

    pub fn expected_value_h_given_z(&self, j: usize, z: f64) -> DrbmResult<f64> {
        self.check_hidden(j, "expected_value_h")?;
        Ok(self.expected_h(j, z))
    }

    fn expected_h(&self, j: usize, z: f64) -> f64 {
        let value: f64 = (0..self.ysize())
            .map(|k| self.hidden_label_potential(j, k))
            .sum();
        value / z
    }

    /// `E[h_j y_k | x]`: the hidden expectation restricted to label `k`.
    pub fn expected_value_hy(&self, j: usize, k: usize) -> DrbmResult<f64> {
        let z = self.partition_div_2h();
        self.expected_value_hy_given_z(j, k, z)
    }

    pub fn expected_value_hy_given_z(&self, j: usize, k: usize, z: f64) -> DrbmResult<f64> {
        self.check_hidden(j, "expected_value_hy")?;
        self.check_label(k, "expected_value_hy")?;
        Ok(self.hidden_label_potential(j, k) / z)
    }

    /// `E[x_i h_j | x] = x_i E[h_j | x]`, since `x` is observed.
    pub fn expected_value_xh(&self, i: usize, j: usize) -> DrbmResult<f64> {
        let z = self.partition_div_2h();
        self.expected_value_xh_given_z(i, j, z)
    }

    pub fn expected_value_xh_given_z(&self, i: usize, j: usize, z: f64) -> DrbmResult<f64> {
        self.topology.input.check_index(i, "expected_value_xh")?;
        self.check_hidden(j, "expected_value_xh")?;
        Ok(self.x[i] * self.expected_h(j, z))
    }

    // -------------------------------------------------------------------------
    // Prediction
    // -------------------------------------------------------------------------

    /// `p(y | x)` for every label, sharing one partition value.
    pub fn label_distribution(&self) -> Vec<f64> {
        let potentials: Vec<f64> = (0..self.ysize()).map(|k| self.label_potential(k)).collect();
        let z: f64 = potentials.iter().sum();
        potentials.into_iter().map(|p| p / z).collect()
    }

    /// Set the input to `x` and return the most probable label.
    ///
    /// Ties go to the lowest label; if every probability is NaN the result
    /// is label 0.
    pub fn predict(&mut self, x: &[f64]) -> DrbmResult<usize> {
        self.set_input(x)?;
        let probs = self.label_distribution();
        Ok(drbm_core::metrics::argmax(&probs).unwrap_or(0))
    }

    fn check_hidden(&self, j: usize, context: &str) -> DrbmResult<()> {
        self.topology.hidden.check_index(j, context)
    }

    fn check_label(&self, k: usize, context: &str) -> DrbmResult<()> {
        self.topology.label.check_index(k, context)
    }
}

impl ConditionalEbm for DrbmModel {
    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn energy(&self, hidden: &[f64], label: usize) -> DrbmResult<f64> {
        self.topology.hidden.check_len(hidden.len(), "energy")?;
        self.check_label(label, "energy")?;

        let mut neg_energy = self.params.bias_y()[label];
        for (j, &h) in hidden.iter().enumerate() {
            // h_j (b_j + V_jy + Σ_i x_i W_ij)
            neg_energy += h * self.field(&self.x, j, label);
        }
        Ok(-neg_energy)
    }
}
