//! Hybrid envelope encryption for record content
//!
//! # Wire Format
//!
//! ```text
//! ciphertext:  AES-256-GCM(session_key, nonce, plaintext)   len(plaintext) bytes
//! wrapped_key: RSA-OAEP-SHA256(owner_public, session_key)   256 bytes
//! nonce:                                                    12 bytes
//! auth_tag:                                                 16 bytes
//! ```
//!
//! An envelope is either sealed (all key material present) or in plaintext mode
//! (every field empty). Anything in between is malformed and rejected before
//! any decryption is attempted.

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::derive::WRAPPED_KEY_SIZE;
use super::secret::{SecretError, SessionKey, NONCE_SIZE, SESSION_KEY_SIZE, TAG_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// Field lengths are inconsistent with either mode
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// Unwrap failed, tag did not verify, or ciphertext is corrupt
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// Encrypted content plus the key material needed to open it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub ciphertext: Vec<u8>,
    pub wrapped_key: Vec<u8>,
    pub nonce: Vec<u8>,
    pub auth_tag: Vec<u8>,
}

impl Envelope {
    /// An envelope signalling "no encryption"
    pub fn plaintext_mode() -> Self {
        Self::default()
    }

    pub fn is_plaintext_mode(&self) -> bool {
        self.ciphertext.is_empty()
            && self.wrapped_key.is_empty()
            && self.nonce.is_empty()
            && self.auth_tag.is_empty()
    }

    /// Encrypt `plaintext` for the holder of `recipient`'s private key
    ///
    /// A fresh session key and nonce are generated for every call.
    pub fn seal(plaintext: &[u8], recipient: &RsaPublicKey) -> Result<Self, EnvelopeError> {
        let session_key = SessionKey::generate()?;
        let sealed = session_key.encrypt(plaintext)?;

        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed)
            .map_err(|e| EnvelopeError::Encryption(format!("failed to seed rng: {}", e)))?;
        let mut rng = ChaCha20Rng::from_seed(seed);

        let wrapped_key = recipient
            .encrypt(&mut rng, Oaep::new::<Sha256>(), session_key.bytes())
            .map_err(|e| EnvelopeError::Encryption(format!("session key wrap failed: {}", e)))?;

        Ok(Self {
            ciphertext: sealed.ciphertext,
            wrapped_key,
            nonce: sealed.nonce.to_vec(),
            auth_tag: sealed.tag.to_vec(),
        })
    }

    /// Check that field lengths describe a sealed envelope
    ///
    /// The ciphertext may be empty (empty plaintext); the key material may not.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.is_plaintext_mode() {
            return Err(EnvelopeError::Malformed(
                "envelope is in plaintext mode".to_string(),
            ));
        }
        if self.wrapped_key.len() != WRAPPED_KEY_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "wrapped key must be {} bytes, got {}",
                WRAPPED_KEY_SIZE,
                self.wrapped_key.len()
            )));
        }
        if self.nonce.len() != NONCE_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                self.nonce.len()
            )));
        }
        if self.auth_tag.len() != TAG_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "auth tag must be {} bytes, got {}",
                TAG_SIZE,
                self.auth_tag.len()
            )));
        }
        Ok(())
    }

    /// Unwrap the session key and decrypt the content
    ///
    /// # Errors
    ///
    /// - `EnvelopeError::Malformed` if the field lengths are inconsistent
    /// - `EnvelopeError::Decryption` if the key does not unwrap or the tag does
    ///   not verify
    pub fn open(&self, recipient: &RsaPrivateKey) -> Result<Vec<u8>, EnvelopeError> {
        self.validate()?;

        let unwrapped = recipient
            .decrypt(Oaep::new::<Sha256>(), &self.wrapped_key)
            .map_err(|e| EnvelopeError::Decryption(format!("session key unwrap failed: {}", e)))?;
        if unwrapped.len() != SESSION_KEY_SIZE {
            return Err(EnvelopeError::Decryption(format!(
                "unwrapped session key has wrong size {}",
                unwrapped.len()
            )));
        }
        let session_key = SessionKey::from_slice(&unwrapped)?;

        session_key
            .decrypt(&self.ciphertext, &self.nonce, &self.auth_tag)
            .map_err(|e| EnvelopeError::Decryption(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use std::sync::OnceLock;

    use super::*;
    use crate::crypto::derive::DerivedKeyPair;

    fn keypair() -> &'static DerivedKeyPair {
        static KEYPAIR: OnceLock<DerivedKeyPair> = OnceLock::new();
        KEYPAIR.get_or_init(|| DerivedKeyPair::derive(&[42u8; 64]).unwrap())
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let keypair = keypair();
        let plaintext = b"attack at dawn";

        let envelope = Envelope::seal(plaintext, keypair.public_key()).unwrap();
        assert_eq!(envelope.wrapped_key.len(), WRAPPED_KEY_SIZE);
        assert_eq!(envelope.nonce.len(), NONCE_SIZE);
        assert_eq!(envelope.auth_tag.len(), TAG_SIZE);
        assert_ne!(envelope.ciphertext, plaintext.to_vec());

        let opened = envelope.open(keypair.private_key()).unwrap();
        assert_eq!(opened, plaintext.to_vec());
    }

    #[test]
    fn test_fresh_session_key_per_seal() {
        let keypair = keypair();
        let first = Envelope::seal(b"same", keypair.public_key()).unwrap();
        let second = Envelope::seal(b"same", keypair.public_key()).unwrap();
        assert_ne!(first.wrapped_key, second.wrapped_key);
        assert_ne!(first.nonce, second.nonce);
    }

    #[test]
    fn test_tampering_is_detected() {
        let keypair = keypair();
        let envelope = Envelope::seal(b"do not touch", keypair.public_key()).unwrap();

        let mut ciphertext = envelope.clone();
        ciphertext.ciphertext[0] ^= 0x01;
        assert!(matches!(
            ciphertext.open(keypair.private_key()),
            Err(EnvelopeError::Decryption(_))
        ));

        let mut nonce = envelope.clone();
        nonce.nonce[NONCE_SIZE - 1] ^= 0x80;
        assert!(matches!(
            nonce.open(keypair.private_key()),
            Err(EnvelopeError::Decryption(_))
        ));

        let mut tag = envelope.clone();
        tag.auth_tag[3] ^= 0x10;
        assert!(matches!(
            tag.open(keypair.private_key()),
            Err(EnvelopeError::Decryption(_))
        ));

        let mut wrapped = envelope;
        wrapped.wrapped_key[100] ^= 0xff;
        assert!(matches!(
            wrapped.open(keypair.private_key()),
            Err(EnvelopeError::Decryption(_))
        ));
    }

    #[test]
    fn test_malformed_envelopes_rejected() {
        let keypair = keypair();
        let envelope = Envelope::seal(b"payload", keypair.public_key()).unwrap();

        let mut no_nonce = envelope.clone();
        no_nonce.nonce.clear();
        assert!(matches!(
            no_nonce.open(keypair.private_key()),
            Err(EnvelopeError::Malformed(_))
        ));

        let mut short_tag = envelope.clone();
        short_tag.auth_tag.truncate(8);
        assert!(matches!(
            short_tag.open(keypair.private_key()),
            Err(EnvelopeError::Malformed(_))
        ));

        let only_ciphertext = Envelope {
            ciphertext: envelope.ciphertext,
            ..Envelope::default()
        };
        assert!(matches!(
            only_ciphertext.validate(),
            Err(EnvelopeError::Malformed(_))
        ));

        assert!(Envelope::plaintext_mode().is_plaintext_mode());
        assert!(matches!(
            Envelope::plaintext_mode().open(keypair.private_key()),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let keypair = keypair();
        let envelope = Envelope::seal(b"", keypair.public_key()).unwrap();
        assert!(envelope.ciphertext.is_empty());
        assert!(!envelope.is_plaintext_mode());
        assert!(envelope.open(keypair.private_key()).unwrap().is_empty());
    }
}
