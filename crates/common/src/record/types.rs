use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::{Address, RecordId, RECORD_ID_SIZE};
use crate::crypto::{Envelope, PublicKey};
use crate::integrity::{self, Digest, IntegrityError};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Bincode encoding for everything that crosses the ledger boundary
///
/// Integers are fixed-width little endian, byte vectors are length prefixed,
/// ids and digests are fixed 32-byte arrays.
pub trait Payload: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(bincode::serialize(self)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Metadata describing one version of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub id: RecordId,
    pub version: u64,
    pub owner: PublicKey,
    /// Length of the stored (possibly encrypted) bytes
    pub byte_length: u64,
    /// Digest of the stored (possibly encrypted) bytes
    pub content_digest: Digest,
    pub is_encrypted: bool,
    /// Where the content of this version lives
    pub content_address: Address,
    pub created_at: u64,
    pub updated_at: u64,
    pub expires_at: Option<u64>,
}

impl Payload for RecordMetadata {}

impl RecordMetadata {
    /// Offset of `owner` in the encoded payload (after id and version)
    pub const OWNER_OFFSET: usize = RECORD_ID_SIZE + 8;

    /// Point the metadata at new content, refreshing length and digest
    pub(crate) fn bind(&mut self, content: &StoredContent) {
        self.byte_length = content.bytes.len() as u64;
        self.content_digest = integrity::digest(&content.bytes);
        self.is_encrypted = content.is_encrypted();
    }
}

/// Stored bytes of one version plus the key material needed to open them
///
/// In plaintext mode `bytes` holds the content and the key material fields are
/// empty; otherwise `bytes` is the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredContent {
    pub bytes: Vec<u8>,
    pub wrapped_key: Vec<u8>,
    pub nonce: Vec<u8>,
    pub auth_tag: Vec<u8>,
}

impl Payload for StoredContent {}

impl StoredContent {
    pub fn plain(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    pub fn sealed(envelope: Envelope) -> Self {
        Self {
            bytes: envelope.ciphertext,
            wrapped_key: envelope.wrapped_key,
            nonce: envelope.nonce,
            auth_tag: envelope.auth_tag,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        !(self.wrapped_key.is_empty() && self.nonce.is_empty() && self.auth_tag.is_empty())
    }

    /// The stored bytes and key material as an envelope
    pub fn envelope(&self) -> Envelope {
        Envelope {
            ciphertext: self.bytes.clone(),
            wrapped_key: self.wrapped_key.clone(),
            nonce: self.nonce.clone(),
            auth_tag: self.auth_tag.clone(),
        }
    }
}

/// Tracks the newest version created under an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCounter {
    pub id: RecordId,
    pub owner: PublicKey,
    pub current_version: u64,
}

impl Payload for VersionCounter {}

impl VersionCounter {
    /// Offset of `owner` in the encoded payload
    pub const OWNER_OFFSET: usize = RECORD_ID_SIZE;
}

/// Unversioned record: one account per `(owner, id)` carrying its own size,
///  digest and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteStore {
    pub id: RecordId,
    pub owner: PublicKey,
    pub byte_length: u64,
    pub content_digest: Digest,
    pub is_encrypted: bool,
    pub created_at: u64,
    pub updated_at: u64,
    pub content: StoredContent,
}

impl Payload for ByteStore {}

impl ByteStore {
    /// Offset of `owner` in the encoded payload
    pub const OWNER_OFFSET: usize = RECORD_ID_SIZE;

    /// Replace the content, refreshing length and digest
    pub(crate) fn bind(&mut self, content: StoredContent) {
        self.byte_length = content.bytes.len() as u64;
        self.content_digest = integrity::digest(&content.bytes);
        self.is_encrypted = content.is_encrypted();
        self.content = content;
    }

    pub fn verify(&self) -> Result<(), IntegrityError> {
        integrity::verify(&self.content.bytes, &self.content_digest)
    }
}

/// One version of a record as read back from the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub metadata: RecordMetadata,
    pub content: StoredContent,
}

impl Record {
    /// Check the stored bytes against the digest in the metadata
    pub fn verify(&self) -> Result<(), IntegrityError> {
        integrity::verify(&self.content.bytes, &self.metadata.content_digest)
    }
}
