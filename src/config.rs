//! Runtime configuration for the key search.

use std::time::Duration;

use clap::Parser;

use crate::matcher::{Prefix, PrefixError};

/// Find an Ed25519 SSH key whose id starts with a hex prefix
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Prefix the key id must start with (hex characters only: 0-9, a-f)
    pub prefix: String,

    /// Number of worker threads (default: number of CPU cores)
    pub threads: Option<usize>,

    /// Number of worker threads; overrides the positional THREADS
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "2")]
    pub report_interval: u64,

    /// Weight of the newest speed sample, in (0, 1]; 1 disables smoothing
    #[arg(long, default_value = "0.5")]
    pub smoothing: f64,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.or(self.threads).unwrap_or_else(num_cpus::get)
    }

    /// Returns the progress report interval.
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    /// Validates the configuration and returns the normalized target prefix.
    pub fn validate(&self) -> Result<Prefix, ConfigError> {
        let prefix = Prefix::parse(&self.prefix)?;

        if self.worker_count() == 0 {
            return Err(ConfigError::NoWorkers);
        }

        if self.report_interval == 0 {
            return Err(ConfigError::ReportInterval);
        }

        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }

        Ok(prefix)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidPrefix(#[from] PrefixError),

    #[error("number of threads must be at least 1")]
    NoWorkers,

    #[error("report interval must be at least 1 second")]
    ReportInterval,

    #[error("smoothing must be in (0, 1], got {0}")]
    Smoothing(f64),
}
