//! Per-worker candidate seed generation.

use rand::{CryptoRng, RngCore};

/// Length of an Ed25519 seed in bytes.
pub const SEED_LEN: usize = 32;

/// A 256-bit big-endian counter that walks the seed space.
///
/// The first value handed out is the random origin; every following value is
/// the previous one plus one, wrapping at 2^256. Each worker owns its own
/// cursor, so nothing here is shared or synchronized.
#[derive(Clone)]
pub struct SeedCursor {
    next: [u8; SEED_LEN],
}

impl SeedCursor {
    /// Draws a fresh origin from a cryptographically secure source.
    ///
    /// Fails only if the source cannot supply entropy; callers treat that as
    /// fatal.
    pub fn from_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, rand::Error> {
        let mut origin = [0u8; SEED_LEN];
        rng.try_fill_bytes(&mut origin)?;
        Ok(Self::starting_at(origin))
    }

    /// Creates a cursor whose first value is `origin`.
    pub const fn starting_at(origin: [u8; SEED_LEN]) -> Self {
        Self { next: origin }
    }

    /// Returns the value the next call to [`SeedCursor::advance`] will yield.
    pub fn peek(&self) -> &[u8; SEED_LEN] {
        &self.next
    }

    /// Yields the current seed and moves the cursor forward by one.
    #[inline]
    pub fn advance(&mut self) -> [u8; SEED_LEN] {
        let current = self.next;
        increment_be(&mut self.next);
        current
    }
}

impl Iterator for SeedCursor {
    type Item = [u8; SEED_LEN];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.advance())
    }
}

// Origins are secret key material.
impl std::fmt::Debug for SeedCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SeedCursor(..)")
    }
}

/// Increment a 32-byte big-endian integer by 1 (with wrapping).
#[inline]
fn increment_be(value: &mut [u8; SEED_LEN]) {
    for byte in value.iter_mut().rev() {
        let (val, overflow) = byte.overflowing_add(1);
        *byte = val;
        if !overflow {
            return;
        }
    }
}
