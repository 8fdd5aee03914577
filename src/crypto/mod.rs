//! Cryptographic operations for the key search.
//!
//! This module provides:
//! - Sequential candidate seeds from a secure random origin
//! - Ed25519 keypair derivation and SSH wire encoding
//! - SHA-256 fingerprints over the wire encoding
//! - OpenSSH text encodings for reporting a found key

mod fingerprint;
mod keypair;
pub mod openssh;
mod seed;

pub use fingerprint::{Fingerprint, FINGERPRINT_HEX_LEN, FINGERPRINT_LEN};
pub use keypair::{encode_public_wire, Keypair, KEY_TYPE, PUBLIC_KEY_LEN, WIRE_LEN};
pub use seed::{SeedCursor, SEED_LEN};
