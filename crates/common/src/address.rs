//! Deterministic record addresses
//!
//! Every record the ledger holds lives at an address derived from
//! `domain || owner || record id [|| version]`, scoped to the ledger program:
//!
//! ```text
//! for bump in 255..=0:
//!     candidate = SHA-256(domain || owner || id [|| version] || [bump] || program_id || "ProgramDerivedAddress")
//!     if candidate is not a valid ed25519 point: return (candidate, bump)
//! ```
//!
//! Rejecting on-curve candidates guarantees no private key exists for the
//! address. The first bump that works is returned with the address since the
//! ledger program re-checks it.

use std::fmt;

use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::PublicKey;

/// Fixed width of a record id, in bytes
pub const RECORD_ID_SIZE: usize = 32;
/// Size of an address, in bytes
pub const ADDRESS_SIZE: usize = 32;
/// Longest single seed the ledger accepts, in bytes
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("record id is {0} bytes, at most {RECORD_ID_SIZE} fit")]
    RecordIdTooLarge(usize),
    #[error("seed is {0} bytes, at most {MAX_SEED_LEN} allowed")]
    SeedTooLong(usize),
    #[error("no bump produced an off-curve address")]
    NoViableBump,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Caller-chosen record name, zero-padded on the right to 32 bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct RecordId([u8; RECORD_ID_SIZE]);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self)
    }
}

/// Shows the id as text when the unpadded bytes are UTF-8, hex otherwise
impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.trimmed()) {
            Ok(text) => f.write_str(text),
            Err(_) => f.write_str(&hex::encode(self.0)),
        }
    }
}

impl RecordId {
    /// Pad a raw id to the fixed width
    ///
    /// # Errors
    ///
    /// Returns `AddressError::RecordIdTooLarge` if `raw` is longer than 32 bytes.
    pub fn new(raw: &[u8]) -> Result<Self, AddressError> {
        if raw.len() > RECORD_ID_SIZE {
            return Err(AddressError::RecordIdTooLarge(raw.len()));
        }
        let mut buff = [0u8; RECORD_ID_SIZE];
        buff[..raw.len()].copy_from_slice(raw);
        Ok(Self(buff))
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_ID_SIZE] {
        &self.0
    }

    /// The id without its trailing zero padding
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |i| i + 1);
        &self.0[..end]
    }
}

impl TryFrom<&str> for RecordId {
    type Error = AddressError;
    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id.as_bytes())
    }
}

impl TryFrom<&[u8]> for RecordId {
    type Error = AddressError;
    fn try_from(id: &[u8]) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

/// Namespace of a record kind
///
/// The label is the first seed, so two kinds can never share an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Stored bytes plus envelope key material
    Content,
    /// `RecordMetadata`
    Metadata,
    /// Per-id version counter
    VersionCounter,
    /// Unversioned byte store
    Store,
    Custom(String),
}

impl Domain {
    pub fn label(&self) -> &str {
        match self {
            Domain::Content => "byte_account",
            Domain::Metadata => "metadata_account",
            Domain::VersionCounter => "version_account",
            Domain::Store => "byte_store_account",
            Domain::Custom(label) => label,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Location of a record on the ledger
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }
}

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(text: &str) -> Result<Self, AddressError> {
        let mut buff = [0; ADDRESS_SIZE];
        hex::decode_to_slice(text, &mut buff)
            .map_err(|_| AddressError::InvalidAddress(text.to_string()))?;
        Ok(Address(buff))
    }
}

/// An address together with the bump that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Address,
    pub bump: u8,
}

/// Derives addresses under one ledger program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: PublicKey,
}

impl AddressDeriver {
    pub fn new(program_id: PublicKey) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> &PublicKey {
        &self.program_id
    }

    /// Derive the address for `(domain, owner, record_id, version)`
    ///
    /// The version, when present, is appended as decimal text.
    pub fn derive(
        &self,
        domain: &Domain,
        owner: &PublicKey,
        record_id: &RecordId,
        version: Option<u64>,
    ) -> Result<DerivedAddress, AddressError> {
        let version_text = version.map(|v| v.to_string());
        let mut seeds: Vec<&[u8]> = vec![
            domain.label().as_bytes(),
            owner.as_ref(),
            &record_id.as_bytes()[..],
        ];
        if let Some(text) = &version_text {
            seeds.push(text.as_bytes());
        }
        find_program_address(&seeds, &self.program_id)
    }

    /// Address of the stored bytes for one version
    pub fn content(
        &self,
        owner: &PublicKey,
        record_id: &RecordId,
        version: u64,
    ) -> Result<DerivedAddress, AddressError> {
        self.derive(&Domain::Content, owner, record_id, Some(version))
    }

    /// Address of the metadata for one version
    pub fn metadata(
        &self,
        owner: &PublicKey,
        record_id: &RecordId,
        version: u64,
    ) -> Result<DerivedAddress, AddressError> {
        self.derive(&Domain::Metadata, owner, record_id, Some(version))
    }

    /// Address of the version counter of an id
    pub fn version_counter(
        &self,
        owner: &PublicKey,
        record_id: &RecordId,
    ) -> Result<DerivedAddress, AddressError> {
        self.derive(&Domain::VersionCounter, owner, record_id, None)
    }

    /// Address of the unversioned byte store of an id
    pub fn store(
        &self,
        owner: &PublicKey,
        record_id: &RecordId,
    ) -> Result<DerivedAddress, AddressError> {
        self.derive(&Domain::Store, owner, record_id, None)
    }
}

/// Derive an address from raw parts
///
/// `record_id` is padded to 32 bytes first and rejected if longer.
pub fn derive_address(
    program_id: &PublicKey,
    domain: &str,
    owner_id: &[u8],
    record_id: &[u8],
    version: Option<u64>,
) -> Result<DerivedAddress, AddressError> {
    let record_id = RecordId::new(record_id)?;
    let version_text = version.map(|v| v.to_string());
    let mut seeds: Vec<&[u8]> = vec![domain.as_bytes(), owner_id, &record_id.as_bytes()[..]];
    if let Some(text) = &version_text {
        seeds.push(text.as_bytes());
    }
    find_program_address(&seeds, program_id)
}

fn find_program_address(
    seeds: &[&[u8]],
    program_id: &PublicKey,
) -> Result<DerivedAddress, AddressError> {
    if let Some(seed) = seeds.iter().find(|seed| seed.len() > MAX_SEED_LEN) {
        return Err(AddressError::SeedTooLong(seed.len()));
    }

    for bump in (0..=u8::MAX).rev() {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update([bump]);
        hasher.update(program_id.to_bytes());
        hasher.update(PDA_MARKER);
        let candidate: [u8; ADDRESS_SIZE] = hasher.finalize().into();

        if !is_on_curve(&candidate) {
            return Ok(DerivedAddress {
                address: Address(candidate),
                bump,
            });
        }
    }

    Err(AddressError::NoViableBump)
}

fn is_on_curve(bytes: &[u8; ADDRESS_SIZE]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}
