//! # ssh_vanity
//!
//! Searches for an Ed25519 SSH key whose id (hex SHA-256 of the public key
//! blob) starts with a chosen prefix.
//!
//! ## Architecture
//!
//! - `crypto`: Seed walking, key derivation, fingerprints, OpenSSH encodings
//! - `matcher`: Prefix validation and matching
//! - `worker`: Parallel search and worker pool management
//! - `stats`: Odds and progress estimation
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod stats;
pub mod worker;

pub use config::{Config, ConfigError};
pub use crypto::{Fingerprint, Keypair, SeedCursor};
pub use error::SearchError;
pub use matcher::{Prefix, PrefixError};
pub use stats::{Eta, Odds, ProgressEstimator, ProgressSnapshot};
pub use worker::{SearchResult, WorkerPool};
