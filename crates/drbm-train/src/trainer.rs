//! Online (single-example) training for the DRBM.
//!
//! ## Training objective
//!
//! Each step ascends the conditional log-likelihood `ln p(y | x)`. For every
//! parameter the gradient is
//!
//! ```text
//! ∂ ln p(y|x) / ∂θ = ⟨s_θ⟩_data − ⟨s_θ⟩_model
//! ```
//!
//! where `s_θ` is the statistic the parameter multiplies in the energy. The
//! data term clamps the label to the example's `y`, so each hidden spin has
//! mean `tanh(μ_jy)`; the model term is the exact expectation from
//! [`DrbmModel`] under the current parameters.
//!
//! A step captures every gradient first and only then applies the Adamax
//! deltas, so all updates are computed from the pre-step state.

use crate::data::{epoch_order, TrainingDataset, TrainingExample};
use crate::optimizer::Adamax;
use drbm_core::metrics::ClassificationReport;
use drbm_core::{AdamaxConfig, DrbmError, DrbmResult, LearningRatePolicy, TrainingConfig};
use drbm_models::{DrbmModel, ExactMoments, ParamGroup, ParamSet};

/// Pre-update view of one training step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// `partition_div_2h()` before the update
    pub partition_div_2h: f64,
    /// `p(y | x)` for every label before the update
    pub label_probs: Vec<f64>,
}

/// Statistics of one pass over the training set.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    /// Accuracy and NLL of the predictions made just before each update
    pub train: ClassificationReport,
    pub validation: Option<ClassificationReport>,
}

/// Gradient buffers plus the optimizer for one model.
#[derive(Debug, Clone)]
pub struct DrbmTrainer {
    gradients: ParamSet,
    optimizer: Adamax,
    lr_policy: LearningRatePolicy,
}

impl DrbmTrainer {
    /// Build a trainer whose buffers are shaped from `model`.
    pub fn new(model: &DrbmModel, config: AdamaxConfig) -> DrbmResult<Self> {
        Ok(DrbmTrainer {
            gradients: ParamSet::zeros(model.topology()),
            optimizer: Adamax::new(model.topology(), config)?,
            lr_policy: LearningRatePolicy::default(),
        })
    }

    pub fn with_lr_policy(mut self, policy: LearningRatePolicy) -> Self {
        self.lr_policy = policy;
        self
    }

    pub fn lr_policy(&self) -> LearningRatePolicy {
        self.lr_policy
    }

    pub fn optimizer(&self) -> &Adamax {
        &self.optimizer
    }

    pub fn optimizer_mut(&mut self) -> &mut Adamax {
        &mut self.optimizer
    }

    /// Gradients from the most recent step (scratch, overwritten each call).
    pub fn gradients(&self) -> &ParamSet {
        &self.gradients
    }

    /// One online gradient step on `example`.
    ///
    /// Sets the model input to `example.x`, computes every gradient, applies
    /// the Adamax deltas in place, then advances the optimizer iteration.
    /// Under [`LearningRatePolicy::Ignored`] `learning_rate` has no effect.
    pub fn train(
        &mut self,
        model: &mut DrbmModel,
        example: &TrainingExample,
        learning_rate: f64,
    ) -> DrbmResult<()> {
        self.step(model, example, learning_rate).map(|_| ())
    }

    /// [`train`](Self::train), also returning the pre-update label distribution.
    pub fn step(
        &mut self,
        model: &mut DrbmModel,
        example: &TrainingExample,
        learning_rate: f64,
    ) -> DrbmResult<StepReport> {
        let moments = self.fill_gradients(model, example)?;

        for group in ParamGroup::ALL {
            let params = model.group_mut(group);
            for (index, &gradient) in self.gradients.group(group).iter().enumerate() {
                let delta = self.optimizer.delta(group, index, gradient)?;
                params[index] += self.lr_policy.apply(delta, learning_rate);
            }
        }
        self.optimizer.advance();

        Ok(StepReport {
            partition_div_2h: moments.partition_div_2h,
            label_probs: moments.label_probs,
        })
    }

    /// Fill the gradient buffers for `example` without touching parameters.
    ///
    /// The model input is set to `example.x`. Returns the partition value
    /// `z` that every model expectation in this step was divided by.
    pub fn compute_gradients(
        &mut self,
        model: &mut DrbmModel,
        example: &TrainingExample,
    ) -> DrbmResult<f64> {
        let moments = self.fill_gradients(model, example)?;
        Ok(moments.partition_div_2h)
    }

    /// Parameters are fixed for the whole call, so the model side is taken
    /// from a single [`ExactMoments`] table.
    fn fill_gradients(
        &mut self,
        model: &mut DrbmModel,
        example: &TrainingExample,
    ) -> DrbmResult<ExactMoments> {
        self.check_model(model)?;
        example.validate(model.topology())?;
        model.set_input(&example.x)?;

        let moments = model.moments();
        if !moments.partition_div_2h.is_finite() {
            log::warn!(
                "partition value is {} at iteration {}; gradients will not be finite",
                moments.partition_div_2h,
                self.optimizer.iteration()
            );
        }

        let (xsize, hsize, ysize) = (model.xsize(), model.hsize(), model.ysize());
        let hidden_means = Self::hidden_data_means(model, example)?;
        let grads = &mut self.gradients;

        {
            let mut weight_xh = grads.weight_xh_mut();
            for i in 0..xsize {
                let x_i = example.x[i];
                for j in 0..hsize {
                    weight_xh[(i, j)] = x_i * hidden_means[j] - moments.input_hidden(x_i, j);
                }
            }
        }
        for (j, g) in grads.bias_h_mut().iter_mut().enumerate() {
            *g = hidden_means[j] - moments.hidden_means[j];
        }
        {
            let mut weight_hy = grads.weight_hy_mut();
            for j in 0..hsize {
                for k in 0..ysize {
                    let data = if k == example.y { hidden_means[j] } else { 0.0 };
                    weight_hy[(j, k)] = data - moments.hidden_label_means[(j, k)];
                }
            }
        }
        for (k, g) in grads.bias_y_mut().iter_mut().enumerate() {
            *g = Self::label_indicator(example, k) - moments.label_probs[k];
        }

        Ok(moments)
    }

    /// `tanh(μ_jy)` for every hidden unit, with the label clamped to `example.y`.
    fn hidden_data_means(model: &DrbmModel, example: &TrainingExample) -> DrbmResult<Vec<f64>> {
        (0..model.hsize())
            .map(|j| model.local_field_for(&example.x, j, example.y).map(f64::tanh))
            .collect()
    }

    #[inline]
    fn label_indicator(example: &TrainingExample, k: usize) -> f64 {
        if k == example.y {
            1.0
        } else {
            0.0
        }
    }

    // -------------------------------------------------------------------------
    // Data means
    // -------------------------------------------------------------------------

    /// `x_i · tanh(μ_jy)`.
    pub fn data_mean_xh(
        model: &DrbmModel,
        example: &TrainingExample,
        i: usize,
        j: usize,
    ) -> DrbmResult<f64> {
        model.topology().input.check_index(i, "data_mean_xh")?;
        Ok(example.x[i] * Self::data_mean_h(model, example, j)?)
    }

    /// `tanh(μ_jy)`.
    pub fn data_mean_h(model: &DrbmModel, example: &TrainingExample, j: usize) -> DrbmResult<f64> {
        Ok(model.local_field_for(&example.x, j, example.y)?.tanh())
    }

    /// `tanh(μ_jy)` when `k == y`, else 0.
    pub fn data_mean_hy(
        model: &DrbmModel,
        example: &TrainingExample,
        j: usize,
        k: usize,
    ) -> DrbmResult<f64> {
        model.topology().label.check_index(k, "data_mean_hy")?;
        if k == example.y {
            Self::data_mean_h(model, example, j)
        } else {
            model.topology().hidden.check_index(j, "data_mean_hy")?;
            Ok(0.0)
        }
    }

    /// 1 when `k == y`, else 0.
    pub fn data_mean_y(model: &DrbmModel, example: &TrainingExample, k: usize) -> DrbmResult<f64> {
        model.topology().label.check_index(k, "data_mean_y")?;
        Ok(Self::label_indicator(example, k))
    }

    // -------------------------------------------------------------------------
    // Epoch driver
    // -------------------------------------------------------------------------

    /// Run `config.epochs` passes of online training over `dataset.train`.
    ///
    /// Adopts `config.lr_policy` for the run. Validation, when the dataset
    /// has a held-out split, is evaluated after every epoch.
    pub fn fit(
        &mut self,
        model: &mut DrbmModel,
        dataset: &TrainingDataset,
        config: &TrainingConfig,
    ) -> DrbmResult<Vec<EpochStats>> {
        config.validate()?;
        self.check_model(model)?;
        dataset.validate(model.topology())?;
        self.lr_policy = config.lr_policy;

        let mut history = Vec::with_capacity(config.epochs);
        for epoch in 0..config.epochs {
            let mut train_report = ClassificationReport::new(model.ysize());

            for (n, idx) in epoch_order(dataset.n_train(), config.shuffle, config.seed, epoch)
                .into_iter()
                .enumerate()
            {
                let example = &dataset.train[idx];
                let report = self.step(model, example, config.learning_rate)?;
                train_report.record(&report.label_probs, example.y);

                if config.log_every > 0 && (n + 1) % config.log_every == 0 {
                    log::debug!(
                        "epoch {} step {}: z={:.6e} p(y|x)={:.4}",
                        epoch,
                        n + 1,
                        report.partition_div_2h,
                        report.label_probs[example.y]
                    );
                }
            }

            let validation = if dataset.validation.is_empty() {
                None
            } else {
                Some(evaluate(model, &dataset.validation)?)
            };

            match &validation {
                Some(val) => log::info!("Epoch {}: train {} | val {}", epoch, train_report, val),
                None => log::info!("Epoch {}: train {}", epoch, train_report),
            }

            history.push(EpochStats {
                epoch,
                train: train_report,
                validation,
            });
        }

        Ok(history)
    }

    fn check_model(&self, model: &DrbmModel) -> DrbmResult<()> {
        self.gradients
            .check_shape(model.topology())
            .map_err(|err| match err {
                DrbmError::InvalidDimension {
                    context,
                    expected,
                    got,
                } => DrbmError::invalid_dimension(
                    format!("trainer/model mismatch: {context}"),
                    got,
                    expected,
                ),
                other => other,
            })
    }
}

/// Accuracy and NLL of `model` on `examples`. Leaves the input set to the
/// last example.
pub fn evaluate(model: &mut DrbmModel, examples: &[TrainingExample]) -> DrbmResult<ClassificationReport> {
    let mut report = ClassificationReport::new(model.ysize());
    for example in examples {
        example.validate(model.topology())?;
        model.set_input(&example.x)?;
        report.record(&model.label_distribution(), example.y);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_means_zero_model() {
        let model = DrbmModel::new(2, 1, 2).unwrap();
        let ex = TrainingExample::new(vec![1.0, -1.0], 0);
        assert_eq!(DrbmTrainer::data_mean_h(&model, &ex, 0).unwrap(), 0.0);
        assert_eq!(DrbmTrainer::data_mean_y(&model, &ex, 0).unwrap(), 1.0);
        assert_eq!(DrbmTrainer::data_mean_y(&model, &ex, 1).unwrap(), 0.0);
        assert_eq!(DrbmTrainer::data_mean_hy(&model, &ex, 0, 1).unwrap(), 0.0);
        assert!(DrbmTrainer::data_mean_hy(&model, &ex, 1, 1).is_err());
        assert!(DrbmTrainer::data_mean_xh(&model, &ex, 2, 0).is_err());
    }

    #[test]
    fn test_mismatched_model_rejected() {
        let small = DrbmModel::new(2, 1, 2).unwrap();
        let mut big = DrbmModel::new(2, 3, 2).unwrap();
        let mut trainer = DrbmTrainer::new(&small, AdamaxConfig::default()).unwrap();
        let ex = TrainingExample::new(vec![1.0, -1.0], 0);
        assert!(matches!(
            trainer.train(&mut big, &ex, 0.1),
            Err(DrbmError::InvalidDimension { .. })
        ));
        assert_eq!(trainer.optimizer().iteration(), 1);
    }

    #[test]
    fn test_bad_example_leaves_state_untouched() {
        let mut model = DrbmModel::new(2, 1, 2).unwrap();
        let mut trainer = DrbmTrainer::new(&model, AdamaxConfig::default()).unwrap();
        let before = model.clone();

        let err = trainer
            .train(&mut model, &TrainingExample::new(vec![1.0, -1.0], 2), 0.1)
            .unwrap_err();
        assert!(matches!(err, DrbmError::IndexOutOfRange { index: 2, len: 2, .. }));
        assert!(trainer
            .train(&mut model, &TrainingExample::new(vec![1.0], 0), 0.1)
            .is_err());

        assert_eq!(model, before);
        assert_eq!(trainer.optimizer().iteration(), 1);
    }
}
