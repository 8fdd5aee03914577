//! Worker pool management and search coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::crypto::{Fingerprint, Keypair, SeedCursor};
use crate::error::SearchError;
use crate::matcher::Prefix;
use crate::stats::{Odds, ProgressEstimator, ProgressSnapshot};

use super::cpu::{CpuWorker, WinClaim, Winner, WorkerOutcome, WorkerStats};

/// The key found by a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The winning keypair
    pub keypair: Keypair,
    /// Its fingerprint, which starts with the target prefix
    pub fingerprint: Fingerprint,
    /// Attempts across all workers (best effort, see [`WorkerPool::run`])
    pub attempts: u64,
    /// Wall-clock time from pool start until the win was received
    pub elapsed: Duration,
    /// The ID of the worker that found the key
    pub worker_id: usize,
    /// How each worker ended
    pub workers: Vec<WorkerOutcome>,
}

/// Runs N workers over independent seed ranges until one of them matches.
pub struct WorkerPool {
    /// Number of workers
    num_workers: usize,
    /// The prefix to search for
    prefix: Arc<Prefix>,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<WorkerOutcome>>>,
    /// Channel receiver for the single winner
    result_rx: Receiver<Winner>,
    /// Shared win slot
    claim: Arc<WinClaim>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
    /// Shared statistics
    stats: Arc<WorkerStats>,
    /// Start time
    start_time: Instant,
}

impl WorkerPool {
    /// Starts `num_workers` workers with origins drawn from the OS.
    pub fn new(num_workers: usize, prefix: Prefix) -> Result<Self, SearchError> {
        Self::with_rng(num_workers, prefix, &mut OsRng)
    }

    /// Starts `num_workers` workers with origins drawn from `rng`.
    ///
    /// All origins are drawn before any worker starts, so an entropy failure
    /// aborts the search before any work is done.
    pub fn with_rng<R: RngCore + CryptoRng>(
        num_workers: usize,
        prefix: Prefix,
        rng: &mut R,
    ) -> Result<Self, SearchError> {
        if num_workers == 0 {
            return Err(SearchError::NoWorkers);
        }

        let cursors = (0..num_workers)
            .map(|_| SeedCursor::from_rng(rng))
            .collect::<Result<Vec<_>, _>>()?;

        // Only the winner ever sends, so one slot never blocks.
        let (result_tx, result_rx) = bounded(1);
        let prefix = Arc::new(prefix);
        let claim = Arc::new(WinClaim::new());
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let mut handles = Vec::with_capacity(num_workers);
        for (id, cursor) in cursors.into_iter().enumerate() {
            let worker = CpuWorker::new(
                id,
                prefix.clone(),
                cursor,
                result_tx.clone(),
                claim.clone(),
                stop_flag.clone(),
                stats.clone(),
            );

            let spawned = thread::Builder::new()
                .name(format!("mineid-worker-{}", id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop_flag.store(true, Ordering::Release);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SearchError::Spawn(e));
                }
            }
        }

        // Drop our sender so the channel disconnects once every worker exits
        drop(result_tx);
        log::debug!("started {} workers for prefix {}", num_workers, prefix);

        Ok(Self {
            num_workers,
            prefix,
            handles: Some(handles),
            result_rx,
            claim,
            stop_flag,
            stats,
            start_time: Instant::now(),
        })
    }

    /// Creates a progress estimator for this search.
    pub fn estimator(&self) -> ProgressEstimator {
        ProgressEstimator::new(Odds::for_prefix_len(self.prefix.len()), self.start_time)
    }

    /// Blocks until a worker wins, reporting progress every `report_interval`.
    ///
    /// On a win the remaining workers are cancelled and joined before the
    /// result is returned. The attempt total sums each worker's count at the
    /// moment it stopped, so it can include a few attempts made after the win.
    ///
    /// Returns [`SearchError::Interrupted`] if the stop flag was raised from
    /// outside, and [`SearchError::WorkerFailed`] if a worker died.
    pub fn run<F>(
        mut self,
        mut estimator: ProgressEstimator,
        report_interval: Duration,
        mut on_progress: F,
    ) -> Result<SearchResult, SearchError>
    where
        F: FnMut(&ProgressSnapshot),
    {
        loop {
            match self.result_rx.recv_timeout(report_interval) {
                Ok(winner) => return self.finish(winner),
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(worker_id) = self.dead_worker() {
                        log::error!("worker {} exited without a result", worker_id);
                        self.stop();
                        self.join_all();
                        return Err(SearchError::WorkerFailed { worker_id });
                    }
                    let snapshot = estimator.sample(self.total_attempts(), Instant::now());
                    on_progress(&snapshot);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // Every worker exited and none of them won.
                    let (outcomes, failed) = self.join_all();
                    if let Some(worker_id) = failed {
                        return Err(SearchError::WorkerFailed { worker_id });
                    }
                    let attempts = outcomes.iter().map(|o| o.attempts).sum();
                    log::warn!("search interrupted after {} attempts", attempts);
                    return Err(SearchError::Interrupted { attempts });
                }
            }
        }
    }

    fn finish(&mut self, winner: Winner) -> Result<SearchResult, SearchError> {
        let elapsed = self.elapsed();
        self.stop();

        let (workers, failed) = self.join_all();
        if let Some(worker_id) = failed {
            return Err(SearchError::WorkerFailed { worker_id });
        }

        let attempts = workers.iter().map(|o| o.attempts).sum();
        log::info!(
            "worker {} found {} after ~{} attempts in {:?}",
            winner.worker_id,
            winner.fingerprint,
            attempts,
            elapsed
        );

        Ok(SearchResult {
            keypair: winner.keypair,
            fingerprint: winner.fingerprint,
            attempts,
            elapsed,
            worker_id: winner.worker_id,
            workers,
        })
    }

    /// A worker that finished while nobody asked it to stop has crashed.
    ///
    /// Losers of the claim exit before the winner raises the stop flag, so
    /// a claimed win also rules this out.
    fn dead_worker(&self) -> Option<usize> {
        if self.is_stopped() || self.claim.is_claimed() {
            return None;
        }
        self.handles
            .as_ref()?
            .iter()
            .position(|handle| handle.is_finished())
    }

    /// Joins every worker, returning the clean outcomes and the first
    /// worker that panicked, if any.
    fn join_all(&mut self) -> (Vec<WorkerOutcome>, Option<usize>) {
        let mut outcomes = Vec::with_capacity(self.num_workers);
        let mut failed = None;

        for (id, handle) in self.handles.take().unwrap_or_default().into_iter().enumerate() {
            match handle.join() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => {
                    log::error!("worker {} panicked", id);
                    failed.get_or_insert(id);
                }
            }
        }

        (outcomes, failed)
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Stops and waits for all workers to complete.
    pub fn join(mut self) -> Vec<WorkerOutcome> {
        self.stop();
        self.join_all().0
    }

    /// Returns the number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the attempts published so far across all workers.
    pub fn total_attempts(&self) -> u64 {
        self.stats.total_attempts()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        // Wait for workers to finish if they haven't been joined
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TICK: Duration = Duration::from_millis(20);

    // A prefix no fingerprint will hit during a test.
    fn unreachable_prefix() -> Prefix {
        Prefix::parse(&"0".repeat(64)).unwrap()
    }

    struct DryRng;

    impl RngCore for DryRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!()
        }
        fn next_u64(&mut self) -> u64 {
            unreachable!()
        }
        fn fill_bytes(&mut self, _: &mut [u8]) {
            unreachable!()
        }
        fn try_fill_bytes(&mut self, _: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for DryRng {}

    #[test]
    fn test_zero_workers_rejected() {
        let err = WorkerPool::new(0, Prefix::parse("a").unwrap()).err().unwrap();
        assert!(matches!(err, SearchError::NoWorkers));
    }

    #[test]
    fn test_entropy_failure_aborts_before_start() {
        let err = WorkerPool::with_rng(4, Prefix::parse("a").unwrap(), &mut DryRng)
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::Entropy(_)));
    }

    #[test]
    fn test_single_worker_fixed_rng() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = WorkerPool::with_rng(1, Prefix::parse("a").unwrap(), &mut rng).unwrap();
        let estimator = pool.estimator();
        let result = pool.run(estimator, TICK, |_| {}).unwrap();

        assert!(result.fingerprint.to_hex().starts_with('a'));
        assert_eq!(result.fingerprint, result.keypair.fingerprint());
        assert!(result.attempts >= 1);
        assert_eq!(result.worker_id, 0);
        assert_eq!(result.workers.len(), 1);
        assert_eq!(result.workers[0].state, WorkerState::Matched);
        assert_eq!(result.workers[0].attempts, result.attempts);
    }

    #[test]
    fn test_single_worker_is_reproducible() {
        let search = || {
            let pool = WorkerPool::with_rng(
                1,
                Prefix::parse("ab").unwrap(),
                &mut StdRng::seed_from_u64(99),
            )
            .unwrap();
            let estimator = pool.estimator();
            pool.run(estimator, TICK, |_| {}).unwrap()
        };

        let first = search();
        let second = search();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.attempts, second.attempts);
    }

    #[test]
    fn test_exactly_one_winner_across_runs() {
        for run in 0..20 {
            let pool = WorkerPool::new(4, Prefix::parse("0").unwrap()).unwrap();
            let estimator = pool.estimator();
            let result = pool.run(estimator, TICK, |_| {}).unwrap();

            let matched: Vec<_> = result
                .workers
                .iter()
                .filter(|o| o.state == WorkerState::Matched)
                .collect();
            assert_eq!(matched.len(), 1, "run {}", run);
            assert_eq!(matched[0].worker_id, result.worker_id);
            assert!(result.fingerprint.to_hex().starts_with('0'));
        }
    }

    #[test]
    fn test_win_cancels_every_sibling() {
        let pool = WorkerPool::new(4, Prefix::parse("00").unwrap()).unwrap();
        let estimator = pool.estimator();
        let result = pool.run(estimator, TICK, |_| {}).unwrap();

        // run() only returns after joining, so every worker has stopped
        assert_eq!(result.workers.len(), 4);
        for outcome in &result.workers {
            if outcome.worker_id == result.worker_id {
                assert_eq!(outcome.state, WorkerState::Matched);
            } else {
                assert_eq!(outcome.state, WorkerState::Cancelled);
            }
        }
        let total: u64 = result.workers.iter().map(|o| o.attempts).sum();
        assert_eq!(result.attempts, total);
    }

    #[test]
    fn test_external_stop_interrupts() {
        let pool = WorkerPool::new(2, unreachable_prefix()).unwrap();
        let stop_flag = pool.stop_flag_clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            stop_flag.store(true, Ordering::Relaxed);
        });

        let estimator = pool.estimator();
        let err = pool.run(estimator, TICK, |_| {}).err().unwrap();
        stopper.join().unwrap();

        match err {
            SearchError::Interrupted { attempts } => assert!(attempts > 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_progress_is_reported_periodically() {
        let pool = WorkerPool::new(2, unreachable_prefix()).unwrap();
        let stop_flag = pool.stop_flag_clone();
        let mut snapshots = Vec::new();

        let estimator = pool.estimator();
        let err = pool
            .run(estimator, TICK, |snapshot| {
                snapshots.push(*snapshot);
                if snapshots.len() == 3 {
                    stop_flag.store(true, Ordering::Relaxed);
                }
            })
            .err()
            .unwrap();

        assert!(matches!(err, SearchError::Interrupted { .. }));
        assert!(snapshots.len() >= 3);
        for pair in snapshots.windows(2) {
            assert!(pair[1].attempts >= pair[0].attempts);
            assert!(pair[1].elapsed >= pair[0].elapsed);
        }
    }

    #[test]
    fn test_join_stops_workers() {
        let pool = WorkerPool::new(3, unreachable_prefix()).unwrap();
        assert_eq!(pool.num_workers(), 3);
        assert!(!pool.claim.is_claimed());

        let outcomes = pool.join();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.state == WorkerState::Cancelled));
    }
}
