//! Per-epoch evaluation and progress reporting.

use std::fmt;
use std::time::Instant;

use candle_core::Tensor;
use postag_core::{Accuracy, Dataset, Tagger};

/// Statistics gathered at the end of one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Summed training loss over the epoch.
    pub loss: f64,
    /// Minibatches taken in the epoch.
    pub batches: usize,
    pub dev_acc: Accuracy,
    /// Training throughput, in tokens per second.
    pub wps_train: f64,
    /// Evaluation throughput, in tokens per second.
    pub wps_run: f64,
}

impl fmt::Display for EpochReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} dev acc, {} wps train, {} wps run",
            self.dev_acc.value(),
            self.wps_train as u64,
            self.wps_run as u64
        )
    }
}

/// Times epochs and evaluates on the dev set after each one.
pub struct ProgressTracker {
    n_train: usize,
    epoch_start: Instant,
}

impl ProgressTracker {
    /// `n_train` is the number of training tokens per epoch.
    pub fn new(n_train: usize) -> Self {
        Self {
            n_train,
            epoch_start: Instant::now(),
        }
    }

    /// Close the current epoch: evaluate on `dev` and restart the clock.
    pub fn each_epoch(
        &mut self,
        epoch: usize,
        loss: f64,
        batches: usize,
        tagger: &Tagger,
        dev: &Dataset,
    ) -> postag_core::Result<EpochReport> {
        let train_secs = self.epoch_start.elapsed().as_secs_f64();

        let dev_start = Instant::now();
        let dev_acc = tagger.evaluate(&dev.features, &dev.labels)?;
        let dev_secs = dev_start.elapsed().as_secs_f64();

        let report = EpochReport {
            epoch,
            loss,
            batches,
            dev_acc,
            wps_train: per_second(self.n_train, train_secs),
            wps_run: per_second(dev.n_tokens(), dev_secs),
        };

        self.epoch_start = Instant::now();
        Ok(report)
    }
}

fn per_second(n: usize, secs: f64) -> f64 {
    if secs > 0.0 { n as f64 / secs } else { 0.0 }
}

/// Logs the mean and variance of a tensor every `every` observations.
#[derive(Debug, Clone)]
pub struct ActivationProbe {
    calls: usize,
    every: usize,
}

impl Default for ActivationProbe {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ActivationProbe {
    pub fn new(every: usize) -> Self {
        Self {
            calls: 0,
            every: every.max(1),
        }
    }

    /// Number of observations so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Record one observation; returns the statistics when they were logged.
    pub fn observe(&mut self, xs: &Tensor) -> candle_core::Result<Option<(f32, f32)>> {
        if !self.tick() {
            return Ok(None);
        }
        self.stats(xs).map(Some)
    }

    /// Like [`ActivationProbe::observe`], over the softmax of `logits`.
    /// The softmax is only computed on calls that log.
    pub fn observe_predictions(&mut self, logits: &Tensor) -> candle_core::Result<Option<(f32, f32)>> {
        if !self.tick() {
            return Ok(None);
        }
        let probs = candle_nn::ops::softmax_last_dim(logits)?;
        self.stats(&probs).map(Some)
    }

    fn tick(&mut self) -> bool {
        let due = self.calls % self.every == 0;
        self.calls += 1;
        due
    }

    fn stats(&self, xs: &Tensor) -> candle_core::Result<(f32, f32)> {
        let xs = xs.flatten_all()?;
        let mean = xs.mean_all()?;
        let var = xs.broadcast_sub(&mean)?.sqr()?.mean_all()?;
        let (mean, var) = (mean.to_scalar::<f32>()?, var.to_scalar::<f32>()?);
        tracing::debug!(call = self.calls, mean, var, "activation stats");
        Ok((mean, var))
    }
}
