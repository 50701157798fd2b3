//! Configuration for DRBM models and training runs.
//!
//! A run is described by a [`DrbmConfig`] with four sections:
//! - **model**: layer sizes
//! - **optimizer**: Adamax hyperparameters
//! - **training**: epochs, learning rate handling, shuffling
//! - **init**: optional random weight initialization
//!
//! Values can be provided via:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Config file (explicit path, else `~/.config/drbm/config.toml`)
//! 4. Built-in defaults
//!
//! # Example TOML
//!
//! ```toml
//! [model]
//! xsize = 4
//! hsize = 8
//! ysize = 3
//!
//! [optimizer]
//! alpha = 0.002
//!
//! [training]
//! epochs = 50
//! learning_rate = 0.1
//! lr_policy = "scale-delta"
//! ```

use crate::error::{DrbmError, DrbmResult};
use crate::node::Topology;
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI arguments that override values from the config file.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "DRBM training configuration")]
pub struct ConfigArgs {
    /// Path to a TOML config file
    #[arg(long, env = "DRBM_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Number of hidden (Ising) units
    #[arg(long, env = "DRBM_HSIZE")]
    pub hsize: Option<usize>,

    /// Number of passes over the training set
    #[arg(long, env = "DRBM_EPOCHS")]
    pub epochs: Option<usize>,

    /// Learning rate handed to every training step
    #[arg(long, env = "DRBM_LEARNING_RATE")]
    pub learning_rate: Option<f64>,

    /// How the learning rate enters the update: "ignored" or "scale-delta"
    #[arg(long, env = "DRBM_LR_POLICY")]
    pub lr_policy: Option<String>,

    /// Adamax step scale
    #[arg(long, env = "DRBM_ALPHA")]
    pub alpha: Option<f64>,

    /// Seed for shuffling and random initialization
    #[arg(long, env = "DRBM_SEED")]
    pub seed: Option<u64>,
}

/// Layer sizes of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub xsize: usize,
    pub hsize: usize,
    pub ysize: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            xsize: 2,
            hsize: 4,
            ysize: 2,
        }
    }
}

impl ModelConfig {
    pub fn new(xsize: usize, hsize: usize, ysize: usize) -> Self {
        ModelConfig {
            xsize,
            hsize,
            ysize,
        }
    }

    /// Validate the sizes by building the topology they describe.
    pub fn topology(&self) -> DrbmResult<Topology> {
        Topology::new(self.xsize, self.hsize, self.ysize)
    }
}

/// Adamax hyperparameters.
///
/// Defaults follow Kingma & Ba (2015): `alpha = 0.001`, `beta1 = 0.9`,
/// `beta2 = 0.999`, `epsilon = 1e-8`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamaxConfig {
    /// Step scale
    pub alpha: f64,
    /// Decay rate of the first moment
    pub beta1: f64,
    /// Decay rate of the infinity-norm second moment
    pub beta2: f64,
    /// Added to the second moment before dividing
    pub epsilon: f64,
}

impl Default for AdamaxConfig {
    fn default() -> Self {
        AdamaxConfig {
            alpha: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamaxConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> DrbmResult<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(DrbmError::invalid_config("alpha", "must be finite and > 0"));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(DrbmError::invalid_config(name, "must lie in [0, 1)"));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(DrbmError::invalid_config("epsilon", "must be finite and >= 0"));
        }
        Ok(())
    }
}

/// How the per-step learning rate enters the parameter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearningRatePolicy {
    /// The learning rate is accepted but has no effect; Adamax's `alpha`
    /// alone sets the step size.
    #[default]
    Ignored,
    /// Every Adamax delta is multiplied by the learning rate.
    ScaleDelta,
}

impl LearningRatePolicy {
    /// Parse a policy name ("ignored", "scale-delta").
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "ignored" | "ignore" | "none" => Some(Self::Ignored),
            "scale-delta" | "scale" => Some(Self::ScaleDelta),
            _ => None,
        }
    }

    /// Apply the policy to one optimizer delta.
    #[inline]
    pub fn apply(&self, delta: f64, learning_rate: f64) -> f64 {
        match self {
            LearningRatePolicy::Ignored => delta,
            LearningRatePolicy::ScaleDelta => delta * learning_rate,
        }
    }
}

/// Settings for the epoch driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub lr_policy: LearningRatePolicy,
    /// Shuffle example order each epoch
    pub shuffle: bool,
    pub seed: u64,
    /// Log a debug line every `log_every` steps (0 disables)
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 10,
            learning_rate: 0.1,
            lr_policy: LearningRatePolicy::Ignored,
            shuffle: true,
            seed: 42,
            log_every: 0,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_lr_policy(mut self, policy: LearningRatePolicy) -> Self {
        self.lr_policy = policy;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> DrbmResult<()> {
        if !self.learning_rate.is_finite() {
            return Err(DrbmError::invalid_config("learning_rate", "must be finite"));
        }
        Ok(())
    }
}

/// Random weight initialization. Off by default: a fresh model starts at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    pub random: bool,
    pub seed: u64,
    /// Standard deviation of the Gaussian weight draw
    pub weight_scale: f64,
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig {
            random: false,
            seed: 0,
            weight_scale: 0.01,
        }
    }
}

/// Complete configuration of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrbmConfig {
    pub model: ModelConfig,
    pub optimizer: AdamaxConfig,
    pub training: TrainingConfig,
    pub init: InitConfig,
}

impl DrbmConfig {
    pub fn from_str(toml_str: &str) -> DrbmResult<Self> {
        let config: DrbmConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DrbmResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_str(&contents)
    }

    /// Load from an explicit path, else from the default location if a file
    /// exists there, else fall back to defaults.
    pub fn load(path: Option<&Path>) -> DrbmResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_config_path() {
            Some(default_path) if default_path.exists() => {
                log::debug!("loading config from {}", default_path.display());
                Self::load_from_file(default_path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse configuration from the process arguments.
    pub fn from_args() -> DrbmResult<Self> {
        Self::from_config_args(ConfigArgs::parse())
    }

    /// Build configuration from already-parsed arguments.
    ///
    /// Use this when `ConfigArgs` is flattened into another CLI parser.
    pub fn from_config_args(args: ConfigArgs) -> DrbmResult<Self> {
        let mut config = Self::load(args.config_file.as_deref())?;

        if let Some(hsize) = args.hsize {
            config.model.hsize = hsize;
        }
        if let Some(epochs) = args.epochs {
            config.training.epochs = epochs;
        }
        if let Some(lr) = args.learning_rate {
            config.training.learning_rate = lr;
        }
        if let Some(policy) = args.lr_policy.as_deref() {
            config.training.lr_policy = LearningRatePolicy::from_str(policy).ok_or_else(|| {
                DrbmError::invalid_config("lr_policy", format!("unknown policy '{policy}'"))
            })?;
        }
        if let Some(alpha) = args.alpha {
            config.optimizer.alpha = alpha;
        }
        if let Some(seed) = args.seed {
            config.training.seed = seed;
            config.init.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DrbmResult<()> {
        self.model.topology()?;
        self.optimizer.validate()?;
        self.training.validate()?;
        if !(self.init.weight_scale.is_finite() && self.init.weight_scale >= 0.0) {
            return Err(DrbmError::invalid_config(
                "weight_scale",
                "must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// `config.toml` in the platform config directory, if one can be determined.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "drbm").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn save_to_file(&self, path: &Path) -> DrbmResult<()> {
        let toml_str = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml_str)?;
        Ok(())
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "model {}x{}x{}, adamax(alpha={}, beta1={}, beta2={}), {} epochs, lr={} ({:?})",
            self.model.xsize,
            self.model.hsize,
            self.model.ysize,
            self.optimizer.alpha,
            self.optimizer.beta1,
            self.optimizer.beta2,
            self.training.epochs,
            self.training.learning_rate,
            self.training.lr_policy,
        )
    }
}
