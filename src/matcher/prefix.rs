//! Target prefix validation and matching.

use std::fmt;
use std::str::FromStr;

use crate::crypto::{Fingerprint, FINGERPRINT_HEX_LEN};

/// Reasons a prefix string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixError {
    #[error("prefix cannot be empty")]
    Empty,

    #[error("prefix contains this non-hex character: {0}")]
    NonHexCharacter(String),

    #[error("prefix contains these non-hex characters: {0}")]
    NonHexCharacters(String),

    #[error("prefix cannot be longer than {max} characters", max = FINGERPRINT_HEX_LEN)]
    TooLong(usize),
}

/// A validated, lowercase hex prefix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    text: String,
    nibbles: Vec<u8>,
}

impl Prefix {
    /// Validates `input` and normalizes it to lowercase.
    ///
    /// Rejected characters are reported as the user typed them.
    pub fn parse(input: &str) -> Result<Self, PrefixError> {
        if input.is_empty() {
            return Err(PrefixError::Empty);
        }

        let rejected: String = input.chars().filter(|c| !c.is_ascii_hexdigit()).collect();
        match rejected.chars().count() {
            0 => {}
            1 => return Err(PrefixError::NonHexCharacter(rejected)),
            _ => return Err(PrefixError::NonHexCharacters(rejected)),
        }

        let text = input.to_ascii_lowercase();

        if text.len() > FINGERPRINT_HEX_LEN {
            return Err(PrefixError::TooLong(text.len()));
        }

        let nibbles = text
            .bytes()
            .map(|b| match b {
                b'0'..=b'9' => b - b'0',
                _ => b - b'a' + 10,
            })
            .collect();

        Ok(Self { text, nibbles })
    }

    /// Returns the normalized prefix text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the prefix length in hex digits.
    pub fn len(&self) -> usize {
        self.nibbles.len()
    }

    /// Always false: an empty prefix never validates.
    pub fn is_empty(&self) -> bool {
        self.nibbles.is_empty()
    }

    /// Tests whether the fingerprint's hex rendering starts with this prefix.
    #[inline]
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        self.nibbles
            .iter()
            .enumerate()
            .all(|(i, &n)| fingerprint.nibble(i) == n)
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prefix({})", self.text)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Literal, case-sensitive prefix test on rendered fingerprints.
#[inline]
pub fn matches(fingerprint: &str, prefix: &str) -> bool {
    fingerprint.starts_with(prefix)
}
