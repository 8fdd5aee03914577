//! Parallel key search.
//!
//! This module provides:
//! - CPU workers, each walking its own seed range
//! - A pool that accepts exactly one winner and cancels the rest
//! - Attempt counters for progress reporting

mod cpu;
mod pool;

pub use cpu::{CpuWorker, WinClaim, Winner, WorkerOutcome, WorkerState, WorkerStats};
pub use pool::{SearchResult, WorkerPool};
