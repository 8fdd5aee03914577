//! CPU worker running the seed → key → fingerprint → match loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::crypto::{Fingerprint, Keypair, SeedCursor};
use crate::matcher::Prefix;

/// Attempts between publications to the shared counter.
const PUBLISH_EVERY: u64 = 1024;

/// Shared counters read by the progress estimator.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Attempts published by all workers
    pub attempts: AtomicU64,
}

impl WorkerStats {
    /// Creates new worker stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attempts published so far (lags the workers slightly).
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

/// Single-assignment slot deciding which worker's match is accepted.
#[derive(Debug, Default)]
pub struct WinClaim {
    claimed: AtomicBool,
}

impl WinClaim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for exactly one caller over the claim's lifetime.
    #[inline]
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// The key a worker matched and won the claim with.
#[derive(Debug, Clone)]
pub struct Winner {
    pub worker_id: usize,
    pub keypair: Keypair,
    pub fingerprint: Fingerprint,
}

/// Lifecycle of a worker: `Running` until it either wins or is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    /// Found a match and won the claim
    Matched,
    /// Observed the stop signal, or matched after another worker had won
    Cancelled,
}

/// How a worker ended and how much work it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOutcome {
    pub worker_id: usize,
    pub state: WorkerState,
    /// Local attempts, including the winning one for the winner
    pub attempts: u64,
}

/// A CPU worker that walks its own seed range.
pub struct CpuWorker {
    /// Worker ID
    id: usize,
    /// The prefix to match against
    prefix: Arc<Prefix>,
    /// This worker's private seed cursor
    cursor: SeedCursor,
    /// Channel to report the winning key
    result_tx: Sender<Winner>,
    /// Shared win slot
    claim: Arc<WinClaim>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
    /// Shared statistics
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    /// Creates a new CPU worker.
    pub fn new(
        id: usize,
        prefix: Arc<Prefix>,
        cursor: SeedCursor,
        result_tx: Sender<Winner>,
        claim: Arc<WinClaim>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            prefix,
            cursor,
            result_tx,
            claim,
            stop_flag,
            stats,
        }
    }

    /// Runs the worker loop until it matches or the stop flag is raised.
    ///
    /// The stop flag is checked once per attempt, so after a win elsewhere a
    /// worker finishes at most the attempt it is on.
    pub fn run(mut self) -> WorkerOutcome {
        let mut attempts: u64 = 0;
        let mut unpublished: u64 = 0;
        let state = loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                break WorkerState::Cancelled;
            }

            let seed = self.cursor.advance();
            let keypair = Keypair::from_seed(&seed);
            let fingerprint = keypair.fingerprint();
            attempts += 1;
            unpublished += 1;

            if self.prefix.matches(&fingerprint) {
                break self.report(keypair, fingerprint);
            }
            if unpublished == PUBLISH_EVERY {
                self.stats.attempts.fetch_add(unpublished, Ordering::Relaxed);
                unpublished = 0;
            }
        };

        self.stats.attempts.fetch_add(unpublished, Ordering::Relaxed);
        log::debug!(
            "worker {} stopped: {:?} after {} attempts",
            self.id,
            state,
            attempts
        );

        WorkerOutcome {
            worker_id: self.id,
            state,
            attempts,
        }
    }

    fn report(&self, keypair: Keypair, fingerprint: Fingerprint) -> WorkerState {
        if !self.claim.try_claim() {
            log::debug!("worker {} matched {} after the win was claimed", self.id, fingerprint);
            return WorkerState::Cancelled;
        }

        self.stop_flag.store(true, Ordering::Release);
        log::info!("worker {} claimed the win with {}", self.id, fingerprint);

        let winner = Winner {
            worker_id: self.id,
            keypair,
            fingerprint,
        };
        // The pool may already be gone if it was dropped mid-search.
        if self.result_tx.send(winner).is_err() {
            log::warn!("worker {}: result receiver dropped", self.id);
        }
        WorkerState::Matched
    }
}
