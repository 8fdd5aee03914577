//! Errors that end a search without a key.

/// Why a search stopped without producing a result.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("at least one worker is required")]
    NoWorkers,

    #[error("random source failed to supply a starting seed: {0}")]
    Entropy(#[from] rand::Error),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker {worker_id} stopped unexpectedly")]
    WorkerFailed { worker_id: usize },

    #[error("search interrupted after {attempts} attempts")]
    Interrupted { attempts: u64 },
}
