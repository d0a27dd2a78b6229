//! # postag trainer
//!
//! Minibatch training for the postag tagger: a momentum SGD optimizer, the
//! growing batch-size schedule, per-epoch dev evaluation and the UD AnCora
//! data fetcher used by the `train` binary.

pub mod config;
pub mod fetch;
pub mod optimizer;
pub mod progress;
pub mod schedule;
pub mod trainer;

pub use config::TrainConfig;
pub use optimizer::{MomentumSgd, SgdConfig};
pub use progress::{ActivationProbe, EpochReport, ProgressTracker};
pub use schedule::{batch_plan, BatchSchedule, DropoutSchedule};
pub use trainer::{categorical_loss, Trainer, TrainingSummary};
