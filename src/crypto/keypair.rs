//! Ed25519 keypair derivation and SSH public key encoding.

use std::fmt;

use ed25519_dalek::SigningKey;

use super::fingerprint::Fingerprint;
use super::seed::SEED_LEN;

/// SSH algorithm name for Ed25519 keys.
pub const KEY_TYPE: &str = "ssh-ed25519";

/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of the SSH wire encoding of an Ed25519 public key:
/// `u32 len || "ssh-ed25519" || u32 len || key`.
pub const WIRE_LEN: usize = 4 + KEY_TYPE.len() + 4 + PUBLIC_KEY_LEN;

/// An Ed25519 keypair derived from a 32-byte seed.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Derives a keypair from a seed.
    ///
    /// Pure and total: every 32-byte value is a valid Ed25519 seed.
    #[inline]
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Returns the seed the keypair was derived from.
    pub fn seed(&self) -> [u8; SEED_LEN] {
        self.signing_key.to_bytes()
    }

    /// Returns the raw public key.
    #[inline]
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Returns the SSH wire encoding of the public key.
    #[inline]
    pub fn public_key_wire(&self) -> [u8; WIRE_LEN] {
        encode_public_wire(&self.public_key_bytes())
    }

    /// Returns the fingerprint of the public key.
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_wire(&self.public_key_wire())
    }
}

// Never print the secret half.
impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// Encodes a raw Ed25519 public key as an SSH wire blob.
pub fn encode_public_wire(public_key: &[u8; PUBLIC_KEY_LEN]) -> [u8; WIRE_LEN] {
    let mut wire = [0u8; WIRE_LEN];
    let type_len = KEY_TYPE.len();

    wire[..4].copy_from_slice(&(type_len as u32).to_be_bytes());
    wire[4..4 + type_len].copy_from_slice(KEY_TYPE.as_bytes());

    let key_at = 4 + type_len;
    wire[key_at..key_at + 4].copy_from_slice(&(PUBLIC_KEY_LEN as u32).to_be_bytes());
    wire[key_at + 4..].copy_from_slice(public_key);

    wire
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc8032_seed() -> [u8; 32] {
        hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
            .unwrap()
            .try_into()
            .unwrap()
    }

    #[test]
    fn test_rfc8032_public_key() {
        let keypair = Keypair::from_seed(&rfc8032_seed());
        assert_eq!(
            hex::encode(keypair.public_key_bytes()),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
        assert_eq!(keypair.seed(), rfc8032_seed());
    }

    #[test]
    fn test_wire_layout() {
        let keypair = Keypair::from_seed(&rfc8032_seed());
        let wire = keypair.public_key_wire();

        assert_eq!(WIRE_LEN, 51);
        assert_eq!(&wire[..4], &[0, 0, 0, 11]);
        assert_eq!(&wire[4..15], b"ssh-ed25519");
        assert_eq!(&wire[15..19], &[0, 0, 0, 32]);
        assert_eq!(&wire[19..], &keypair.public_key_bytes());
    }

    #[test]
    fn test_known_fingerprints() {
        let keypair = Keypair::from_seed(&rfc8032_seed());
        assert_eq!(
            keypair.fingerprint().to_hex(),
            "6db5e9b8a1bace1cdd9a7c6adb9e9396acc5073465d9fe8e3a0ef6d9c60d6d4f"
        );

        let zero = Keypair::from_seed(&[0u8; 32]);
        assert_eq!(
            hex::encode(zero.public_key_bytes()),
            "3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29"
        );
        assert_eq!(
            zero.fingerprint().to_hex(),
            "b405c5c935c8f31b436ae8c011cc09b2501873dffa14a71491dd8bc34c4384fa"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        for fill in [0x00u8, 0x01, 0x7f, 0xff] {
            let seed = [fill; 32];
            let first = Keypair::from_seed(&seed).fingerprint();
            let second = Keypair::from_seed(&seed).fingerprint();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_debug_hides_seed() {
        let keypair = Keypair::from_seed(&rfc8032_seed());
        let debug = format!("{:?}", keypair);
        assert!(!debug.contains("9d61b19d"));
        assert!(debug.contains("d75a9801"));
    }
}
