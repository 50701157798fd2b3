//! Classification metrics for label predictions.
//!
//! ## Metrics
//!
//! - **Accuracy**: fraction of examples whose argmax label matches the target
//! - **NLL**: negative log-likelihood `-ln p(y | x)` of the target label
//!
//! ## Example
//!
//! ```
//! use drbm_core::metrics::{argmax, ClassificationReport};
//!
//! let probs = vec![0.1, 0.7, 0.2];
//! assert_eq!(argmax(&probs), Some(1));
//!
//! let mut report = ClassificationReport::new(3);
//! report.record(&probs, 1);
//! assert_eq!(report.accuracy(), 1.0);
//! ```

use std::fmt;

/// Index of the largest value. Ties resolve to the first index.
///
/// Returns `None` for an empty slice or when every value is NaN.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Fraction of positions where `predicted` equals `targets`.
///
/// Compares up to the shorter length; returns 0.0 when either is empty.
pub fn accuracy(predicted: &[usize], targets: &[usize]) -> f64 {
    let n = predicted.len().min(targets.len());
    if n == 0 {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(targets.iter())
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / n as f64
}

/// `-ln p`. A zero probability gives `+inf`.
#[inline]
pub fn negative_log_likelihood(prob_of_target: f64) -> f64 {
    -prob_of_target.ln()
}

/// Running accuracy, NLL, and confusion counts over a set of predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    n_labels: usize,
    n_examples: usize,
    n_correct: usize,
    total_nll: f64,
    /// `confusion[target][predicted]`
    confusion: Vec<Vec<usize>>,
}

impl ClassificationReport {
    pub fn new(n_labels: usize) -> Self {
        ClassificationReport {
            n_labels,
            n_examples: 0,
            n_correct: 0,
            total_nll: 0.0,
            confusion: vec![vec![0; n_labels]; n_labels],
        }
    }

    /// Record one prediction given the full label distribution.
    ///
    /// Targets outside `0..n_labels` count as examples but never as correct,
    /// and are left out of the confusion matrix.
    pub fn record(&mut self, label_probs: &[f64], target: usize) {
        self.n_examples += 1;
        let predicted = argmax(label_probs);
        let p_target = label_probs.get(target).copied().unwrap_or(0.0);
        self.total_nll += negative_log_likelihood(p_target);

        if let Some(pred) = predicted {
            if pred == target {
                self.n_correct += 1;
            }
            if target < self.n_labels && pred < self.n_labels {
                self.confusion[target][pred] += 1;
            }
        }
    }

    pub fn n_examples(&self) -> usize {
        self.n_examples
    }

    pub fn accuracy(&self) -> f64 {
        if self.n_examples == 0 {
            0.0
        } else {
            self.n_correct as f64 / self.n_examples as f64
        }
    }

    pub fn mean_nll(&self) -> f64 {
        if self.n_examples == 0 {
            0.0
        } else {
            self.total_nll / self.n_examples as f64
        }
    }

    pub fn confusion(&self) -> &[Vec<usize>] {
        &self.confusion
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} accuracy={:.4} nll={:.4}",
            self.n_examples,
            self.accuracy(),
            self.mean_nll()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_edge_cases() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f64::NAN, f64::NAN]), None);
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[f64::NAN, 0.2, 0.9]), Some(2));
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[1]), 0.0);
    }

    #[test]
    fn test_report_accumulates() {
        let mut report = ClassificationReport::new(2);
        report.record(&[0.8, 0.2], 0);
        report.record(&[0.4, 0.6], 0);

        assert_eq!(report.n_examples(), 2);
        assert_eq!(report.accuracy(), 0.5);
        let expected_nll = (-(0.8f64).ln() - (0.4f64).ln()) / 2.0;
        assert!((report.mean_nll() - expected_nll).abs() < 1e-12);
        assert_eq!(report.confusion()[0], vec![1, 1]);
        assert!(report.to_string().contains("accuracy=0.5000"));
    }

    #[test]
    fn test_zero_probability_gives_infinite_nll() {
        assert!(negative_log_likelihood(0.0).is_infinite());
    }
}
