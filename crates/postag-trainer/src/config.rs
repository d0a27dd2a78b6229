//! Training hyperparameters.

use clap::Args;
use postag_core::TaggerConfig;
use serde::{Deserialize, Serialize};

/// Hyperparameters of a training run. Parsed from CLI flags and saved next
/// to the trained model.
#[derive(Debug, Clone, PartialEq, Args, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Width of the hidden layers
    #[arg(short = 'w', long, default_value_t = 128)]
    pub width: usize,

    /// Depth of the hidden layers
    #[arg(short = 'd', long, default_value_t = 1)]
    pub depth: usize,

    /// Width of the word vectors
    #[arg(short = 'V', long, default_value_t = 128)]
    pub vector_length: usize,

    /// Minimum minibatch size during training
    #[arg(short = 'b', long, default_value_t = 16)]
    pub min_batch_size: usize,

    /// Maximum minibatch size during training
    #[arg(short = 'B', long, default_value_t = 16)]
    pub max_batch_size: usize,

    /// Multiplicative batch-size growth per batch
    #[arg(long, default_value_t = 1.001)]
    pub batch_growth: f64,

    /// Learning rate
    #[arg(short = 'e', long, default_value_t = 0.001)]
    pub learn_rate: f64,

    /// Momentum
    #[arg(short = 'm', long, default_value_t = 0.9)]
    pub momentum: f64,

    /// Dropout rate
    #[arg(short = 'D', long, default_value_t = 0.5)]
    pub dropout: f32,

    /// Dropout decay
    #[arg(short = 'C', long, default_value_t = 1e-4)]
    pub dropout_decay: f32,

    /// Maximum passes over the training data
    #[arg(short = 'i', long, default_value_t = 20)]
    pub nb_epoch: usize,

    /// L2 regularization penalty
    #[arg(short = 'L', long = "l2", default_value_t = 1e-6)]
    pub l2: f64,

    /// Clip the global gradient norm to this value (0 disables clipping)
    #[arg(long, default_value_t = 10.0)]
    pub max_grad_norm: f64,

    /// Seed for the shuffle order
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            width: 128,
            depth: 1,
            vector_length: 128,
            min_batch_size: 16,
            max_batch_size: 16,
            batch_growth: 1.001,
            learn_rate: 0.001,
            momentum: 0.9,
            dropout: 0.5,
            dropout_decay: 1e-4,
            nb_epoch: 20,
            l2: 1e-6,
            max_grad_norm: 10.0,
            seed: 0,
        }
    }
}

impl TrainConfig {
    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.min_batch_size >= 1, "min batch size must be at least 1");
        anyhow::ensure!(
            self.max_batch_size >= self.min_batch_size,
            "max batch size ({}) is below min batch size ({})",
            self.max_batch_size,
            self.min_batch_size
        );
        anyhow::ensure!(self.batch_growth >= 1.0, "batch growth must be >= 1");
        anyhow::ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout must be in [0, 1), got {}",
            self.dropout
        );
        anyhow::ensure!(self.dropout_decay >= 0.0, "dropout decay must be >= 0");
        anyhow::ensure!(self.learn_rate > 0.0, "learning rate must be positive");
        anyhow::ensure!(
            (0.0..1.0).contains(&self.momentum),
            "momentum must be in [0, 1)"
        );
        anyhow::ensure!(self.width >= 2 && self.width % 2 == 0, "width must be even");
        Ok(())
    }

    /// Model architecture for a tag set of `n_tags` tags.
    pub fn tagger_config(&self, n_tags: usize) -> TaggerConfig {
        TaggerConfig {
            width: self.width,
            depth: self.depth,
            vector_length: self.vector_length,
            n_tags,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: TrainConfig,
    }

    #[test]
    fn test_defaults_match_cli() {
        let cli = Cli::parse_from(["train"]);
        assert_eq!(cli.config, TrainConfig::default());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "train", "-w", "64", "-d", "2", "-V", "32", "-b", "4", "-B", "64", "-e", "0.01",
            "-m", "0.5", "-D", "0.2", "-C", "0.001", "-i", "3", "-L", "0.0001",
        ]);
        let c = cli.config;
        assert_eq!((c.width, c.depth, c.vector_length), (64, 2, 32));
        assert_eq!((c.min_batch_size, c.max_batch_size), (4, 64));
        assert_eq!(c.nb_epoch, 3);
        assert_eq!(c.l2, 0.0001);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_batch_bounds() {
        let config = TrainConfig {
            min_batch_size: 32,
            max_batch_size: 8,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tagger_config() {
        let config = TrainConfig {
            width: 64,
            vector_length: 48,
            ..Default::default()
        }
        .tagger_config(17);
        assert_eq!(config.width, 64);
        assert_eq!(config.vector_length, 48);
        assert_eq!(config.n_tags, 17);
        assert_eq!(config.pieces, 3);
    }
}
