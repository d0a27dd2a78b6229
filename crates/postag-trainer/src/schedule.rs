//! Batch-size and dropout schedules.

use std::ops::Range;

/// Minibatch size that grows geometrically per batch up to a cap.
#[derive(Debug, Clone)]
pub struct BatchSchedule {
    size: f64,
    max: usize,
    growth: f64,
}

impl BatchSchedule {
    pub fn new(min: usize, max: usize, growth: f64) -> Self {
        Self {
            size: min.max(1) as f64,
            max: max.max(1),
            growth,
        }
    }

    /// Size of the batch about to be taken, without advancing.
    pub fn current(&self) -> usize {
        (self.size.floor() as usize).clamp(1, self.max)
    }

    /// Take the size of the next batch and grow the schedule.
    pub fn next_size(&mut self) -> usize {
        let size = self.current();
        if size < self.max {
            self.size *= self.growth;
        }
        size
    }
}

/// Dropout rate that decays with the number of examples seen in an epoch.
#[derive(Debug, Clone, Copy)]
pub struct DropoutSchedule {
    rate: f32,
    decay: f32,
}

impl DropoutSchedule {
    pub fn new(rate: f32, decay: f32) -> Self {
        Self { rate, decay }
    }

    /// Rate after `seen` examples of the current epoch.
    pub fn at(&self, seen: usize) -> f32 {
        self.rate / (1.0 + self.decay * seen as f32)
    }
}

/// Cut one epoch of `n` examples into batches, pairing each span with its
/// dropout rate.
///
/// The rate lags one batch behind: the first two batches use `at(0)`, and
/// every later batch uses the rate at the start of the batch before it.
/// `seen` restarts at zero each epoch while `schedule` keeps growing.
pub fn batch_plan(
    n: usize,
    schedule: &mut BatchSchedule,
    dropout: &DropoutSchedule,
) -> Vec<(Range<usize>, f32)> {
    let mut plan = Vec::new();
    let mut seen = 0;
    let mut rate = dropout.at(0);
    while seen < n {
        let end = (seen + schedule.next_size()).min(n);
        plan.push((seen..end, rate));
        rate = dropout.at(seen);
        seen = end;
    }
    plan
}
