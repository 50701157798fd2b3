//! Train a DRBM on a seeded toy dataset.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example train_toy -- --dataset blobs --epochs 30
//!
//! # XOR needs hidden units and a larger step
//! cargo run --release --example train_toy -- --dataset parity --hsize 8 --alpha 0.05
//!
//! # Settings can also come from a TOML file or DRBM_* environment variables
//! RUST_LOG=debug DRBM_EPOCHS=100 cargo run --release --example train_toy
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use drbm_core::{ConfigArgs, DrbmConfig};
use drbm_examples::{gaussian_blobs, parity};
use drbm_models::DrbmModel;
use drbm_train::{evaluate, DrbmTrainer, TrainingDataset};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Dataset {
    /// One Gaussian cluster per label
    Blobs,
    /// Parity of ±1 bits (XOR for two bits)
    Parity,
}

/// Train a discriminative RBM on toy data
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Train a DRBM on a toy dataset")]
struct Args {
    /// Which dataset to generate
    #[arg(long, value_enum, default_value = "blobs")]
    dataset: Dataset,

    /// Examples per label (blobs only)
    #[arg(long, default_value = "50")]
    n_per_class: usize,

    /// Input bits (parity only)
    #[arg(long, default_value = "2")]
    n_bits: usize,

    /// Fraction of examples held out for validation
    #[arg(long, default_value = "0.2")]
    val_fraction: f64,

    /// Randomize weights before training
    #[arg(long)]
    random_init: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = DrbmConfig::from_config_args(args.config.clone())
        .context("failed to load configuration")?;

    let (examples, val_fraction) = match args.dataset {
        Dataset::Blobs => {
            let centers = vec![vec![1.5, 1.5], vec![-1.5, -1.5], vec![1.5, -1.5]];
            let blobs = gaussian_blobs(&centers, args.n_per_class, 0.6, config.training.seed)?;
            (blobs, args.val_fraction)
        }
        // Every parity input appears once, so train and evaluate on all of them.
        Dataset::Parity => (parity(args.n_bits)?, 0.0),
    };

    let Some(first) = examples.first() else {
        bail!("dataset is empty");
    };
    config.model.xsize = first.x.len();
    config.model.ysize = examples.iter().map(|e| e.y).max().unwrap_or(0) + 1;
    if args.random_init {
        config.init.random = true;
    }
    config.validate()?;
    println!("{}", config.summary());

    let mut dataset = TrainingDataset::from_examples(examples, val_fraction, config.training.seed)?;
    if dataset.validation.is_empty() {
        dataset.validation = dataset.train.clone();
    }
    log::info!(
        "{} training / {} validation examples",
        dataset.n_train(),
        dataset.n_val()
    );

    let mut model = DrbmModel::from_topology(config.model.topology()?);
    if config.init.random {
        model.randomize(&config.init);
    }

    let mut trainer = DrbmTrainer::new(&model, config.optimizer)?;
    let history = trainer.fit(&mut model, &dataset, &config.training)?;
    let Some(last) = history.last() else {
        bail!("no epochs were run; set --epochs above 0");
    };

    let report = evaluate(&mut model, &dataset.validation)?;
    println!("\n=== Training Complete ===\n");
    println!("final train:      {}", last.train);
    println!("validation:       {}", report);
    println!("optimizer steps:  {}", trainer.optimizer().iteration() - 1);
    println!("partition const:  {:.6e}", model.partition_constant());

    Ok(())
}
