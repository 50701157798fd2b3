//! Adamax: Adam with an infinity-norm second moment.
//!
//! For every scalar parameter the optimizer keeps a first moment `m` and an
//! infinity-norm second moment `v`, shaped exactly like the model's biases
//! and weights:
//!
//! ```text
//! m = β1 · m + (1 - β1) · g
//! v = max(β2 · v, |g|)
//! Δ = α / (1 - β1^t) · m / (v + ε)
//! ```
//!
//! `Δ` is added to the parameter, so a positive gradient (data mean above
//! the model expectation) moves the parameter up. `t` starts at 1 and is
//! advanced once per training step by the trainer, never by `delta`.

use drbm_core::{AdamaxConfig, DrbmError, DrbmResult, Topology};
use drbm_models::{ParamGroup, ParamSet};

/// Adamax optimizer state for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Adamax {
    config: AdamaxConfig,
    iteration: u64,
    first_moment: ParamSet,
    second_moment: ParamSet,
}

impl Adamax {
    /// Create an optimizer with zeroed moments for a model of `topology`.
    pub fn new(topology: &Topology, config: AdamaxConfig) -> DrbmResult<Self> {
        config.validate()?;
        Ok(Adamax {
            config,
            iteration: 1,
            first_moment: ParamSet::zeros(topology),
            second_moment: ParamSet::zeros(topology),
        })
    }

    pub fn config(&self) -> &AdamaxConfig {
        &self.config
    }

    /// The step counter `t` used for bias correction. Starts at 1.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Move to the next step. Called once after all parameters are updated.
    pub fn advance(&mut self) {
        self.iteration += 1;
    }

    /// `α / (1 - β1^t)` for the current iteration.
    pub fn step_size(&self) -> f64 {
        self.config.alpha / (1.0 - self.config.beta1.powf(self.iteration as f64))
    }

    /// Update the moments of one parameter with `gradient` and return its delta.
    ///
    /// Computing a delta always advances that parameter's moments; calling it
    /// twice for the same parameter in one step counts the gradient twice.
    pub fn delta(&mut self, group: ParamGroup, index: usize, gradient: f64) -> DrbmResult<f64> {
        let len = self.first_moment.group(group).len();
        if index >= len {
            return Err(DrbmError::index_out_of_range(
                format!("Adamax::delta ({})", group.name()),
                index,
                len,
            ));
        }

        let AdamaxConfig {
            beta1,
            beta2,
            epsilon,
            ..
        } = self.config;

        let m_slot = &mut self.first_moment.group_mut(group)[index];
        *m_slot = beta1 * *m_slot + (1.0 - beta1) * gradient;
        let m = *m_slot;

        let v_slot = &mut self.second_moment.group_mut(group)[index];
        *v_slot = (beta2 * *v_slot).max(gradient.abs());
        let v = *v_slot;

        Ok(self.step_size() * m / (v + epsilon))
    }

    pub fn first_moment(&self) -> &ParamSet {
        &self.first_moment
    }

    pub fn second_moment(&self) -> &ParamSet {
        &self.second_moment
    }

    /// Zero both moments and restart the iteration counter at 1.
    pub fn reset(&mut self) {
        self.first_moment.fill(0.0);
        self.second_moment.fill(0.0);
        self.iteration = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimizer() -> Adamax {
        let topo = Topology::new(2, 3, 2).unwrap();
        Adamax::new(&topo, AdamaxConfig::default()).unwrap()
    }

    #[test]
    fn test_first_step_delta() {
        let mut opt = optimizer();
        let g = 0.5;
        let delta = opt.delta(ParamGroup::BiasY, 1, g).unwrap();

        // m = 0.1 g, v = |g|, step = α / 0.1
        let m = 0.1 * g;
        let expected = 0.001 / (1.0 - 0.9) * m / (g + 1e-8);
        assert!((delta - expected).abs() < 1e-15, "{} vs {}", delta, expected);
        // First Adamax step moves by ~alpha in the gradient's direction
        assert!((delta - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_zero_gradient_gives_zero_delta() {
        let mut opt = optimizer();
        assert_eq!(opt.delta(ParamGroup::WeightXH, 0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_moments_are_per_parameter() {
        let mut opt = optimizer();
        opt.delta(ParamGroup::WeightHY, 4, -2.0).unwrap();

        assert_eq!(opt.second_moment().weight_hy().as_slice()[4], 2.0);
        assert!((opt.first_moment().weight_hy().as_slice()[4] + 0.2).abs() < 1e-15);
        // Neighbours and other groups untouched
        assert_eq!(opt.second_moment().weight_hy().as_slice()[3], 0.0);
        assert_eq!(opt.second_moment().max_abs(), 2.0);
    }

    #[test]
    fn test_second_moment_decays_then_tracks_max() {
        let mut opt = optimizer();
        opt.delta(ParamGroup::BiasH, 0, 1.0).unwrap();
        opt.advance();
        opt.delta(ParamGroup::BiasH, 0, 0.1).unwrap();
        assert!((opt.second_moment().bias_h()[0] - 0.999).abs() < 1e-15);
        opt.advance();
        opt.delta(ParamGroup::BiasH, 0, 5.0).unwrap();
        assert_eq!(opt.second_moment().bias_h()[0], 5.0);
    }

    #[test]
    fn test_iteration_only_moves_on_advance() {
        let mut opt = optimizer();
        assert_eq!(opt.iteration(), 1);
        opt.delta(ParamGroup::BiasH, 0, 1.0).unwrap();
        assert_eq!(opt.iteration(), 1);
        opt.advance();
        assert_eq!(opt.iteration(), 2);
        assert!((opt.step_size() - 0.001 / (1.0 - 0.81)).abs() < 1e-15);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut opt = optimizer();
        assert!(matches!(
            opt.delta(ParamGroup::WeightXH, 6, 1.0),
            Err(DrbmError::IndexOutOfRange { index: 6, len: 6, .. })
        ));
    }

    #[test]
    fn test_reset() {
        let mut opt = optimizer();
        opt.delta(ParamGroup::BiasY, 0, 1.0).unwrap();
        opt.advance();
        opt.reset();
        assert_eq!(opt.iteration(), 1);
        assert_eq!(opt.first_moment().max_abs(), 0.0);
        assert_eq!(opt.second_moment().max_abs(), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let topo = Topology::new(1, 1, 1).unwrap();
        let config = AdamaxConfig::default().with_betas(0.9, 1.5);
        assert!(Adamax::new(&topo, config).is_err());
    }
}
