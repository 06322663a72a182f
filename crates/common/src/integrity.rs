use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Size of a content digest in bytes
pub const DIGEST_SIZE: usize = 32;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("content digest mismatch: expected {expected}, got {actual}")]
pub struct IntegrityError {
    pub expected: Digest,
    pub actual: Digest,
}

/// SHA-256 digest binding record metadata to the exact stored bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Digest([u8; DIGEST_SIZE]);

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; DIGEST_SIZE]> for Digest {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        Digest(bytes)
    }
}

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }
}

/// Digest some bytes
pub fn digest(bytes: &[u8]) -> Digest {
    use sha2::Digest as _;
    Digest(Sha256::digest(bytes).into())
}

/// Check that `bytes` hash to `expected`
pub fn verify(bytes: &[u8], expected: &Digest) -> Result<(), IntegrityError> {
    let actual = digest(bytes);
    if actual != *expected {
        return Err(IntegrityError {
            expected: *expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_known_digest() {
        // sha256 of [1, 2, 3]
        assert_eq!(
            digest(&[1, 2, 3]).to_string(),
            "039058c6f2c0cb492c533b0a4d14ef77cc0f78abccced5287d84a1a2011cfb81"
        );
    }

    #[test]
    fn test_verify() {
        let bytes = b"content";
        let expected = digest(bytes);
        assert!(verify(bytes, &expected).is_ok());

        let err = verify(b"Content", &expected).unwrap_err();
        assert_eq!(err.expected, expected);
        assert_eq!(err.actual, digest(b"Content"));
    }
}
