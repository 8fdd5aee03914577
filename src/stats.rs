//! Search odds and progress estimation.
//!
//! With a prefix of `L` hex digits every attempt matches with probability
//! `1/M`, `M = 16^L`. After `k` attempts the chance of having found a key is
//! `1 - ((M-1)/M)^k`, and the attempts needed to reach a chance `p` are
//! `ln(1-p) / ln((M-1)/M)`.
//!
//! Nothing here touches the workers: the estimator only reads the aggregate
//! attempt counter the pool publishes.

use std::fmt;
use std::time::{Duration, Instant};

/// Search odds for a given prefix length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Odds {
    keyspace: f64,
}

impl Odds {
    /// Odds for a prefix of `len` hex digits.
    ///
    /// `16^len` is a power of two, so it is exact in an `f64` for every
    /// prefix a fingerprint can hold.
    pub fn for_prefix_len(len: usize) -> Self {
        Self {
            keyspace: 16f64.powi(len as i32),
        }
    }

    /// Expected number of attempts to find a match (`16^L`).
    pub fn expected_attempts(&self) -> f64 {
        self.keyspace
    }

    /// Probability of at least one match after `attempts` tries.
    pub fn probability_after(&self, attempts: f64) -> f64 {
        if attempts <= 0.0 {
            return 0.0;
        }
        // 1 - (1 - 1/M)^k, via exp/ln_1p so huge M does not round to 1
        -(attempts * (-1.0 / self.keyspace).ln_1p()).exp_m1()
    }

    /// Attempts needed to reach cumulative probability `p` (`0 <= p < 1`).
    pub fn attempts_for_probability(&self, p: f64) -> f64 {
        if p <= 0.0 {
            return 0.0;
        }
        if self.keyspace <= 1.0 {
            return 1.0;
        }
        if p >= 1.0 {
            return f64::INFINITY;
        }
        (-p).ln_1p() / (-1.0 / self.keyspace).ln_1p()
    }
}

/// Projected time to reach a probability threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// No throughput observed yet.
    Unknown,
    /// The threshold has already been passed.
    Done,
    /// Time left at the current throughput, saturating at `Duration::MAX`.
    Remaining(Duration),
}

impl Eta {
    fn project(needed: f64, so_far: f64, throughput: f64) -> Self {
        if needed <= so_far {
            return Eta::Done;
        }
        if !(throughput.is_finite() && throughput > 0.0) {
            return Eta::Unknown;
        }
        let secs = (needed - so_far) / throughput;
        Eta::Remaining(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Unknown => f.write_str("unknown"),
            Eta::Done => f.write_str("any moment"),
            Eta::Remaining(d) => f.write_str(&format_duration(*d)),
        }
    }
}

/// A point-in-time view of search progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Attempts across all workers so far.
    pub attempts: u64,
    /// Time since the search started.
    pub elapsed: Duration,
    /// Smoothed attempts per second across all workers.
    pub keys_per_second: f64,
    /// Chance that a match should have been found by now.
    pub probability: f64,
    /// Projected time until a 50% chance of success.
    pub eta_50: Eta,
    /// Projected time until a 75% chance of success.
    pub eta_75: Eta,
}

/// Turns periodic reads of the attempt counter into speed and ETA figures.
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    odds: Odds,
    needed_50: f64,
    needed_75: f64,
    smoothing: f64,
    started: Instant,
    last_attempts: u64,
    last_sample: Instant,
    throughput: Option<f64>,
}

impl ProgressEstimator {
    /// Default EWMA weight of the newest throughput sample.
    pub const DEFAULT_SMOOTHING: f64 = 0.5;

    /// Creates an estimator for a search that started at `started`.
    pub fn new(odds: Odds, started: Instant) -> Self {
        Self {
            odds,
            needed_50: odds.attempts_for_probability(0.5),
            needed_75: odds.attempts_for_probability(0.75),
            smoothing: Self::DEFAULT_SMOOTHING,
            started,
            last_attempts: 0,
            last_sample: started,
            throughput: None,
        }
    }

    /// Sets the weight of the newest sample, clamped to `(0, 1]`.
    ///
    /// `1.0` reports each window's raw throughput.
    pub fn with_smoothing(mut self, alpha: f64) -> Self {
        self.smoothing = if alpha.is_finite() {
            alpha.clamp(f64::MIN_POSITIVE, 1.0)
        } else {
            1.0
        };
        self
    }

    /// Records the counter value read at `now` and returns the projection.
    pub fn sample(&mut self, attempts: u64, now: Instant) -> ProgressSnapshot {
        let window = now.saturating_duration_since(self.last_sample).as_secs_f64();

        if window > 0.0 {
            let delta = attempts.saturating_sub(self.last_attempts) as f64;
            let current = delta / window;
            self.throughput = Some(match self.throughput {
                Some(previous) => self.smoothing * current + (1.0 - self.smoothing) * previous,
                None => current,
            });
            self.last_attempts = attempts;
            self.last_sample = now;
        }

        let throughput = self.throughput.unwrap_or(0.0);
        let so_far = attempts as f64;

        ProgressSnapshot {
            attempts,
            elapsed: now.saturating_duration_since(self.started),
            keys_per_second: throughput,
            probability: self.odds.probability_after(so_far),
            eta_50: Eta::project(self.needed_50, so_far, throughput),
            eta_75: Eta::project(self.needed_75, so_far, throughput),
        }
    }
}

/// Formats a duration rounded to 100ms, e.g. `1h2m3.4s`, `800ms`.
pub fn format_duration(d: Duration) -> String {
    let tenths = (d.as_millis() + 50) / 100;
    if tenths == 0 {
        return "0s".into();
    }
    if tenths < 10 {
        return format!("{}ms", tenths * 100);
    }

    let hours = tenths / 36_000;
    let minutes = (tenths / 600) % 60;
    let seconds = (tenths / 10) % 60;
    let frac = tenths % 10;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if frac > 0 {
        out.push_str(&format!("{}.{}s", seconds, frac));
    } else {
        out.push_str(&format!("{}s", seconds));
    }
    out
}
