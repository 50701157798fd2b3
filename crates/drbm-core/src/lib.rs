//! # drbm-core
//!
//! Core types for discriminative restricted Boltzmann machines (DRBMs) with
//! Ising (±1) hidden units.
//!
//! - [`NodeType`]: Continuous input, Spin hidden unit, or Categorical label
//! - [`Layer`] / [`Topology`]: the three fixed-size layers `x`, `h`, `y`
//! - [`DrbmError`]: dimension, index, and configuration errors
//! - [`DrbmConfig`]: TOML + CLI configuration of a training run
//! - [`metrics`]: accuracy and negative log-likelihood
//!
//! ```rust
//! use drbm_core::{DrbmConfig, Topology};
//!
//! let config = DrbmConfig::default();
//! let topology: Topology = config.model.topology().unwrap();
//! assert_eq!(topology.ysize(), 2);
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod node;

pub use config::*;
pub use error::*;
pub use node::*;
