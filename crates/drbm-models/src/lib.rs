//! # drbm-models
//!
//! Discriminative restricted Boltzmann machines with Ising (±1) hidden units.
//!
//! ## Exact inference
//!
//! [`DrbmModel`] stores the three layers and their parameters and computes
//! the partition function, `p(y | x)`, and the hidden/label expectations in
//! closed form:
//!
//! ```rust
//! use drbm_models::DrbmModel;
//!
//! let mut model = DrbmModel::new(2, 1, 2).unwrap();
//! model.set_input(&[1.0, -1.0]).unwrap();
//!
//! // All parameters start at zero, so labels are uniform
//! assert_eq!(model.cond_prob_y(0).unwrap(), 0.5);
//! assert_eq!(model.expected_value_h(0).unwrap(), 0.0);
//! ```
//!
//! Every `*_given_z` variant takes a precomputed `z = partition_div_2h()` so
//! a caller evaluating many expectations for the same state pays for the
//! partition sum once. [`DrbmModel::moments`] returns every expectation at
//! once from a single table of local fields.
//!
//! ## Parameter groups
//!
//! - [`ParamGroup`]: `BiasH`, `BiasY`, `WeightXH`, `WeightHY`
//! - [`ParamSet`]: one buffer per group, shaped from a [`drbm_core::Topology`].
//!   Values are written through fixed-length views (`bias_h_mut`,
//!   [`MatrixMut`]); a new shape can only come in through
//!   [`DrbmModel::set_params`], which checks it.
//!
//! ## Enumeration
//!
//! - [`ConditionalEbm`]: energy of a full (hidden, label) configuration
//! - [`enumerate_moments`]: brute-force moments for small hidden layers

pub mod drbm;
pub mod ebm;
pub mod params;

pub use drbm::*;
pub use ebm::*;
pub use params::*;
