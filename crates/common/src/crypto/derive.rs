//! Deterministic RSA keypair derivation
//!
//! The owner's encryption keypair is never stored anywhere. It is recomputed
//! from the signing identity's private entropy whenever a session key has to be
//! wrapped or unwrapped:
//!
//! ```text
//! seed    = SHA-256(entropy)
//! rng     = ChaCha20Rng::from_seed(seed)
//! keypair = RSA-2048 generated from rng
//! ```
//!
//! The generator is seeded only from the supplied entropy, so the same entropy
//! always yields the same keypair.

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::keys::SecretKey;

/// Modulus size of derived keypairs, in bits
pub const RSA_KEY_BITS: usize = 2048;
/// Size of a session key wrapped under a derived public key, in bytes
pub const WRAPPED_KEY_SIZE: usize = RSA_KEY_BITS / 8;

#[derive(Debug, thiserror::Error)]
pub enum KeyDerivationError {
    #[error("key derivation requires non-empty entropy")]
    EmptyEntropy,
    #[error("failed to generate keypair: {0}")]
    Generation(#[from] rsa::Error),
}

/// Asymmetric keypair derived from a signing identity
///
/// Held only for the duration of one encrypt or decrypt call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl DerivedKeyPair {
    /// Derive a keypair from raw private entropy
    ///
    /// The RSA generator is a ChaCha20 stream seeded with `SHA-256(entropy)`.
    /// ChaCha20 takes exactly 32 seed bytes, and the hash maps entropy of any
    /// length onto them, so equal entropy always yields the same keypair.
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationError::EmptyEntropy` if `entropy` is empty, or
    /// `KeyDerivationError::Generation` if the RSA primitive fails.
    pub fn derive(entropy: &[u8]) -> Result<Self, KeyDerivationError> {
        if entropy.is_empty() {
            return Err(KeyDerivationError::EmptyEntropy);
        }

        let seed: [u8; 32] = Sha256::digest(entropy).into();
        let mut rng = ChaCha20Rng::from_seed(seed);

        let private = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)?;
        let public = private.to_public_key();
        tracing::debug!(bits = public.size() * 8, "derived rsa keypair");

        Ok(Self { private, public })
    }

    /// Derive the keypair belonging to a signing identity
    ///
    /// Uses the full 64-byte keypair encoding as entropy.
    pub fn from_identity(identity: &SecretKey) -> Result<Self, KeyDerivationError> {
        Self::derive(&identity.to_keypair_bytes())
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }
}

/// Shorthand for [`DerivedKeyPair::derive`]
pub fn derive_keypair(entropy: &[u8]) -> Result<DerivedKeyPair, KeyDerivationError> {
    DerivedKeyPair::derive(entropy)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let entropy = [7u8; 64];
        let first = derive_keypair(&entropy).unwrap();
        let second = derive_keypair(&entropy).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.public_key().size(), WRAPPED_KEY_SIZE);
    }

    #[test]
    fn test_entropy_of_any_length() {
        let short = derive_keypair(&[1u8]).unwrap();
        let long = derive_keypair(&[1u8; 100]).unwrap();
        assert_ne!(short, long);
        assert_eq!(long.public_key().size(), WRAPPED_KEY_SIZE);
    }

    #[test]
    fn test_different_entropy_different_keypair() {
        let first = derive_keypair(&[1u8; 64]).unwrap();
        let second = derive_keypair(&[2u8; 64]).unwrap();
        assert_ne!(first.public_key(), second.public_key());
    }

    #[test]
    fn test_empty_entropy_rejected() {
        assert!(matches!(
            derive_keypair(&[]),
            Err(KeyDerivationError::EmptyEntropy)
        ));
    }
}
