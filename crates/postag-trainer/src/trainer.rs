//! Training loop with a growing minibatch size.

use anyhow::Context;
use candle_core::Tensor;
use candle_nn::Optimizer;
use oorandom::Rand64;
use postag_core::{to_categorical, Accuracy, Corpus, FeatureArray, Tagger};

use crate::config::TrainConfig;
use crate::optimizer::{MomentumSgd, SgdConfig};
use crate::progress::{ActivationProbe, EpochReport, ProgressTracker};
use crate::schedule::{batch_plan, BatchSchedule, DropoutSchedule};

type EpochHook = Box<dyn FnMut(&EpochReport)>;

/// Outcome of a full training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs: Vec<EpochReport>,
    pub final_accuracy: Accuracy,
}

/// Categorical cross-entropy summed over tokens.
///
/// Its gradient with respect to `logits` is `softmax(logits) - targets`,
/// the elementwise difference between predicted and true distributions.
pub fn categorical_loss(logits: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    let log_probs = candle_nn::ops::log_softmax(logits, candle_core::D::Minus1)?;
    (log_probs * targets)?.sum_all()?.neg()
}

/// Drives minibatch training of a [`Tagger`].
pub struct Trainer {
    config: TrainConfig,
    rng: Rand64,
    probe: ActivationProbe,
    each_epoch: Vec<EpochHook>,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        let rng = Rand64::new(u128::from(config.seed));
        Self {
            config,
            rng,
            probe: ActivationProbe::default(),
            each_epoch: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Register a callback run after every epoch's dev evaluation.
    pub fn on_epoch<F: FnMut(&EpochReport) + 'static>(&mut self, hook: F) {
        self.each_epoch.push(Box::new(hook));
    }

    /// A fresh random permutation of `0..n`.
    pub fn shuffled(&mut self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.rng.rand_range(0..(i as u64 + 1)) as usize;
            order.swap(i, j);
        }
        order
    }

    fn optimizer_config(&self) -> SgdConfig {
        SgdConfig {
            learn_rate: self.config.learn_rate,
            momentum: self.config.momentum,
            l2: self.config.l2,
            max_grad_norm: (self.config.max_grad_norm > 0.0).then_some(self.config.max_grad_norm),
        }
    }

    /// Train `tagger` on `corpus.train`, evaluating on `corpus.dev` after
    /// every epoch.
    pub fn train(&mut self, tagger: &Tagger, corpus: &Corpus) -> anyhow::Result<TrainingSummary> {
        anyhow::ensure!(!corpus.train.is_empty(), "training set is empty");

        let mut optimizer = MomentumSgd::new(tagger.vars(), self.optimizer_config())?;
        let mut schedule = BatchSchedule::new(
            self.config.min_batch_size,
            self.config.max_batch_size,
            self.config.batch_growth,
        );
        let dropout = DropoutSchedule::new(self.config.dropout, self.config.dropout_decay);
        let mut tracker = ProgressTracker::new(corpus.train.n_tokens());
        let mut epochs = Vec::with_capacity(self.config.nb_epoch);

        tracing::info!(
            sentences = corpus.train.len(),
            tokens = corpus.train.n_tokens(),
            tags = corpus.tags.len(),
            "starting training"
        );

        for epoch in 1..=self.config.nb_epoch {
            let order = self.shuffled(corpus.train.len());
            let mut loss = 0f64;
            let mut batches = 0;

            for (span, rate) in batch_plan(order.len(), &mut schedule, &dropout) {
                let (features, labels) = corpus.train.take(&order[span]);

                loss += self
                    .train_batch(tagger, &mut optimizer, &features, &labels, rate)
                    .with_context(|| format!("training batch {batches} of epoch {epoch}"))?;
                batches += 1;
            }

            let report = tracker.each_epoch(epoch, loss, batches, tagger, &corpus.dev)?;
            tracing::debug!(
                epoch,
                loss,
                batches,
                batch_size = schedule.current(),
                "epoch finished"
            );
            for hook in &mut self.each_epoch {
                hook(&report);
            }
            epochs.push(report);
        }

        let final_accuracy = tagger.evaluate(&corpus.dev.features, &corpus.dev.labels)?;
        Ok(TrainingSummary {
            epochs,
            final_accuracy,
        })
    }

    /// One forward/backward/update step; returns the batch loss.
    fn train_batch(
        &mut self,
        tagger: &Tagger,
        optimizer: &mut MomentumSgd,
        features: &[FeatureArray],
        labels: &[Vec<usize>],
        dropout: f32,
    ) -> anyhow::Result<f64> {
        let logits = tagger.forward(features, dropout)?;
        let gold: Vec<usize> = labels.concat();
        let targets = to_categorical(&gold, tagger.tags().len(), tagger.device())?;

        let loss = categorical_loss(&logits, &targets)?;
        self.probe.observe_predictions(&logits)?;
        optimizer.backward_step(&loss)?;

        Ok(f64::from(loss.to_scalar::<f32>()?))
    }
}
