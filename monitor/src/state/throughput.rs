//! Iteration throughput per worker.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Iterations per second between two observations, 0 when no time passed.
pub fn instant_rate(delta_iterations: i64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        delta_iterations as f64 / secs
    } else {
        0.0
    }
}

/// One exponential moving average step.
pub fn ema(alpha: f64, instant: f64, previous: f64) -> f64 {
    alpha * instant + (1.0 - alpha) * previous
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    iterations: i64,
    smoothed: f64,
    at: Instant,
}

/// Instantaneous and smoothed throughput of every worker id.
///
/// Call [`begin_tick`](Self::begin_tick) once per tick, then
/// [`observe`](Self::observe) each worker read in that tick. Rates are
/// measured against the worker's own previous sample, so a worker skipped
/// for a tick does not report the skipped tick's iterations twice.
#[derive(Debug)]
pub struct ThroughputTracker {
    alpha: f64,
    now: Option<Instant>,
    samples: HashMap<i32, Sample>,
}

impl ThroughputTracker {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            now: None,
            samples: HashMap::new(),
        }
    }

    /// Marks the start of a tick at `now`.
    pub fn begin_tick(&mut self, now: Instant) {
        self.now = Some(now);
    }

    /// Records `iterations` for worker `id` at the current tick.
    ///
    /// # Returns
    /// `(instant, smoothed)` rates in iterations per second. The first
    /// observation of a worker, and one whose counter went backwards
    /// (worker restarted) or jumped by more than an `i64` can hold, report
    /// 0 and start a new baseline.
    pub fn observe(&mut self, id: i32, iterations: i64) -> (f64, f64) {
        let Some(now) = self.now else {
            return (0.0, 0.0);
        };

        let delta = self
            .samples
            .get(&id)
            .and_then(|prev| Some((iterations.checked_sub(prev.iterations)?, prev)))
            .filter(|(delta, _)| *delta >= 0);

        let (instant, smoothed) = match delta {
            Some((delta, prev)) => {
                let instant = instant_rate(delta, now.saturating_duration_since(prev.at));
                (instant, ema(self.alpha, instant, prev.smoothed))
            }
            None => (0.0, 0.0),
        };

        self.samples.insert(
            id,
            Sample {
                iterations,
                smoothed,
                at: now,
            },
        );
        (instant, smoothed)
    }

    /// Drops baselines of ids outside `[0, worker_count)`.
    pub fn retain_workers(&mut self, worker_count: i32) {
        self.samples.retain(|id, _| (0..worker_count).contains(id));
    }

    /// Forgets every baseline, used when the writer disappears.
    pub fn reset(&mut self) {
        self.now = None;
        self.samples.clear();
    }

    /// Number of workers with a baseline.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Seeds the baseline of `id` at the current tick.
    #[cfg(test)]
    pub fn prime(&mut self, id: i32, iterations: i64, smoothed: f64) {
        let at = self.now.unwrap_or_else(Instant::now);
        self.samples.insert(id, Sample { iterations, smoothed, at });
    }
}
