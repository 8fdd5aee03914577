//! Prefix matching for key fingerprints.
//!
//! A target prefix is validated once into a [`Prefix`], which then tests
//! fingerprints nibble by nibble without rendering them to hex.

mod prefix;

pub use prefix::{matches, Prefix, PrefixError};
