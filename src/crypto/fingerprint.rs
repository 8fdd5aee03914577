//! Key fingerprints: SHA-256 over the SSH wire encoding of a public key.

use std::fmt;

use sha2::{Digest, Sha256};

/// Length of a fingerprint digest in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Number of hex digits in a rendered fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = FINGERPRINT_LEN * 2;

/// A SHA-256 digest of a public key blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Hashes a public key's canonical wire encoding.
    #[inline]
    pub fn of_wire(wire: &[u8]) -> Self {
        Self(Sha256::digest(wire).into())
    }

    /// Creates a fingerprint from raw digest bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the hex digit at `index` (0 = most significant nibble).
    #[inline]
    pub fn nibble(&self, index: usize) -> u8 {
        let byte = self.0[index / 2];
        if index % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0f
        }
    }

    /// Returns the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
