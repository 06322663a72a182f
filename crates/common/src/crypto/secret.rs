//! Session keys and AES-256-GCM content encryption
//!
//! Every encrypted write gets its own `SessionKey`. It encrypts exactly one
//! version of one record's content and is then wrapped for the owner; it is
//! never reused for another write.

use std::fmt;

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};

/// Size of an AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of an AES-256 key in bytes
pub const SESSION_KEY_SIZE: usize = 32;
/// Size of an AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Output of a detached AES-GCM encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
}

/// A 256-bit symmetric key for a single write
///
/// Ciphertext, nonce and tag are kept apart (detached mode) because the ledger
/// stores them as separate fields.
#[derive(PartialEq, Eq, Clone)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl From<[u8; SESSION_KEY_SIZE]> for SessionKey {
    fn from(bytes: [u8; SESSION_KEY_SIZE]) -> Self {
        SessionKey(bytes)
    }
}

impl SessionKey {
    /// Generate a new random key using a cryptographically secure RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0; SESSION_KEY_SIZE];
        getrandom::getrandom(&mut buff)
            .map_err(|e| anyhow::anyhow!("failed to generate session key: {}", e))?;
        Ok(Self(buff))
    }

    /// Create a session key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SESSION_KEY_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SESSION_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid session key size, expected {}, got {}",
                SESSION_KEY_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SESSION_KEY_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt data with AES-256-GCM under a fresh random nonce
    ///
    /// # Errors
    ///
    /// Returns an error if the system RNG fails or the cipher rejects the input.
    pub fn encrypt(&self, data: &[u8]) -> Result<Sealed, SecretError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()));

        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;

        let mut ciphertext = data.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut ciphertext)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(tag.as_slice());

        Ok(Sealed {
            ciphertext,
            nonce,
            tag: tag_bytes,
        })
    }

    /// Decrypt detached AES-256-GCM ciphertext, verifying the tag
    ///
    /// # Errors
    ///
    /// Returns an error if nonce or tag have the wrong length, or if the tag
    /// does not authenticate the ciphertext under this key.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8], tag: &[u8]) -> Result<Vec<u8>, SecretError> {
        if nonce.len() != NONCE_SIZE {
            return Err(anyhow::anyhow!("invalid nonce size {}", nonce.len()).into());
        }
        if tag.len() != TAG_SIZE {
            return Err(anyhow::anyhow!("invalid tag size {}", tag.len()).into());
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()));
        let mut plaintext = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce),
                b"",
                &mut plaintext,
                Tag::from_slice(tag),
            )
            .map_err(|_| anyhow::anyhow!("decrypt error"))?;

        Ok(plaintext)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_key_encrypt_decrypt() {
        let key = SessionKey::generate().unwrap();
        let data = b"hello world, this is a test message for encryption";

        let sealed = key.encrypt(data).unwrap();
        assert_eq!(sealed.ciphertext.len(), data.len());

        let decrypted = key.decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag).unwrap();
        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let key = SessionKey::generate().unwrap();
        let first = key.encrypt(b"same").unwrap();
        let second = key.encrypt(b"same").unwrap();
        assert_ne!(first.nonce, second.nonce);
    }

    #[test]
    fn test_session_key_size_validation() {
        assert!(SessionKey::from_slice(&[1u8; 16]).is_err());
        assert!(SessionKey::from_slice(&[1u8; 64]).is_err());
        assert!(SessionKey::from_slice(&[1u8; SESSION_KEY_SIZE]).is_ok());
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = SessionKey::generate().unwrap();
        let other = SessionKey::generate().unwrap();
        let sealed = key.encrypt(b"secret").unwrap();
        assert!(other
            .decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag)
            .is_err());
    }

    #[test]
    fn test_empty_data_encryption() {
        let key = SessionKey::generate().unwrap();
        let sealed = key.encrypt(b"").unwrap();
        assert!(sealed.ciphertext.is_empty());

        let decrypted = key.decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag).unwrap();
        assert!(decrypted.is_empty());
    }
}
