//! # drbm-train
//!
//! Online training for [`DrbmModel`](drbm_models::DrbmModel).
//!
//! - [`optimizer`] - Adamax state (first/second moments, iteration counter)
//! - [`trainer`] - gradient computation, one-example updates, epoch driver
//! - [`data`] - labeled examples, train/validation splits, epoch ordering
//!
//! ```
//! use drbm_core::AdamaxConfig;
//! use drbm_models::DrbmModel;
//! use drbm_train::{DrbmTrainer, TrainingExample};
//!
//! let mut model = DrbmModel::new(2, 1, 2).unwrap();
//! let mut trainer = DrbmTrainer::new(&model, AdamaxConfig::default()).unwrap();
//! trainer
//!     .train(&mut model, &TrainingExample::new(vec![1.0, -1.0], 0), 0.1)
//!     .unwrap();
//! assert_eq!(trainer.optimizer().iteration(), 2);
//! assert!(model.bias_y()[0] > 0.0);
//! ```

pub mod data;
pub mod optimizer;
pub mod trainer;

pub use data::*;
pub use optimizer::*;
pub use trainer::*;
