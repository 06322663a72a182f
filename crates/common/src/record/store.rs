use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::ledger::{Expect, LedgerError, LedgerOp, LedgerStore};
use super::types::{Payload, PayloadError, Record, RecordMetadata, StoredContent, VersionCounter};
use crate::address::{Address, AddressDeriver, AddressError, RecordId};
use crate::crypto::{
    DerivedKeyPair, Envelope, EnvelopeError, KeyDerivationError, PublicKey, SecretKey,
};
use crate::integrity::{self, Digest, IntegrityError};

#[derive(Debug, thiserror::Error)]
pub enum RecordError<E> {
    #[error("record {id} has no version {version}")]
    NotFound { id: RecordId, version: u64 },
    #[error("no byte store named {0}")]
    StoreNotFound(RecordId),
    #[error("expires_at {expires_at} must be later than {now}")]
    InvalidExpiry { expires_at: u64, now: u64 },
    #[error("record {id} still has live versions {versions:?}")]
    VersionsRemaining { id: RecordId, versions: Vec<u64> },
    #[error("{expected} bytes were recorded but {actual} are stored")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("version counter of {0} is exhausted")]
    VersionOverflow(RecordId),
    #[error("address error: {0}")]
    Address(#[from] AddressError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError<E>),
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
    #[error("key derivation error: {0}")]
    KeyDerivation(#[from] KeyDerivationError),
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Per-write choices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Seal the content for the owner
    pub encrypt: bool,
    /// Unix milliseconds after which the ledger may drop the version
    pub expires_at: Option<u64>,
}

impl WriteOptions {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn encrypted() -> Self {
        Self {
            encrypt: true,
            expires_at: None,
        }
    }

    pub fn expires_at(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordStoreConfig {
    /// Ledger program the addresses are derived under
    pub program_id: PublicKey,
    /// Refuse to delete a version counter while versions are still stored
    pub strict_counter_delete: bool,
}

impl RecordStoreConfig {
    pub fn new(program_id: PublicKey) -> Self {
        Self {
            program_id,
            strict_counter_delete: true,
        }
    }
}

/// A version as loaded for modification, with the digests of the payloads
///  it was read from so the write can be made conditional on them
struct Loaded {
    record: Record,
    metadata_address: Address,
    metadata_payload: Digest,
    content_payload: Digest,
}

/// Lifecycle of an owner's versioned records
///
/// Per `(owner, id)` the ledger holds one version counter plus a
/// metadata/content pair for every live version:
///
/// ```text
/// Absent --create--> Active(1) --create--> Active(2) ... --delete_counter--> Absent
/// ```
///
/// `append`, `update` and `delete` target a single existing version and never
/// touch the counter. Every multi-record change is committed as one atomic
/// ledger transaction with preconditions, so a concurrent writer surfaces as
/// `LedgerError::Conflict` and the caller decides whether to retry.
#[derive(Debug, Clone)]
pub struct RecordStore<L: LedgerStore> {
    ledger: L,
    identity: SecretKey,
    deriver: AddressDeriver,
    pub(super) clock: Arc<dyn Clock>,
    strict_counter_delete: bool,
}

impl<L: LedgerStore> RecordStore<L> {
    pub fn new(ledger: L, identity: SecretKey, config: RecordStoreConfig) -> Self {
        Self {
            ledger,
            identity,
            deriver: AddressDeriver::new(config.program_id),
            clock: Arc::new(SystemClock),
            strict_counter_delete: config.strict_counter_delete,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn owner(&self) -> PublicKey {
        self.identity.public()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// Newest version created under `id`, if a counter exists
    pub async fn current_version(&self, id: &RecordId) -> Result<Option<u64>, RecordError<L::Error>> {
        let address = self.deriver.version_counter(&self.owner(), id)?;
        Ok(self
            .read_payload::<VersionCounter>(address.address)
            .await?
            .map(|(counter, _)| counter.current_version))
    }

    /// Store `bytes` as the next version of `id`
    ///
    /// Starts at version 1 when no counter exists, otherwise uses counter + 1.
    pub async fn create(
        &self,
        id: &RecordId,
        bytes: &[u8],
        options: WriteOptions,
    ) -> Result<RecordMetadata, RecordError<L::Error>> {
        let owner = self.owner();
        let now = self.clock.now();
        check_expiry::<L::Error>(options.expires_at, now)?;

        let counter_address = self.deriver.version_counter(&owner, id)?;
        let (version, counter_expected) = match self
            .read_payload::<VersionCounter>(counter_address.address)
            .await?
        {
            Some((counter, payload)) => (
                counter
                    .current_version
                    .checked_add(1)
                    .ok_or(RecordError::<L::Error>::VersionOverflow(*id))?,
                Expect::Matches(payload),
            ),
            None => (1, Expect::Absent),
        };

        let content = self.seal(bytes.to_vec(), options.encrypt)?;
        let content_address = self.deriver.content(&owner, id, version)?;
        let metadata_address = self.deriver.metadata(&owner, id, version)?;

        let mut metadata = RecordMetadata {
            id: *id,
            version,
            owner,
            byte_length: 0,
            content_digest: Digest::default(),
            is_encrypted: false,
            content_address: content_address.address,
            created_at: now,
            updated_at: now,
            expires_at: options.expires_at,
        };
        metadata.bind(&content);

        let counter = VersionCounter {
            id: *id,
            owner,
            current_version: version,
        };

        self.ledger
            .commit(vec![
                LedgerOp::Write {
                    address: counter_address.address,
                    payload: counter.encode()?,
                    expected: Some(counter_expected),
                },
                LedgerOp::Write {
                    address: content_address.address,
                    payload: content.encode()?,
                    expected: Some(Expect::Absent),
                },
                LedgerOp::Write {
                    address: metadata_address.address,
                    payload: metadata.encode()?,
                    expected: Some(Expect::Absent),
                },
            ])
            .await?;

        tracing::info!(
            id = %id,
            version,
            encrypted = metadata.is_encrypted,
            bytes = metadata.byte_length,
            "created record version"
        );
        Ok(metadata)
    }

    /// Extend an existing version with `bytes`
    ///
    /// Encrypted versions are opened, extended and sealed again under a fresh
    /// session key, so the tag always covers the whole content.
    pub async fn append(
        &self,
        id: &RecordId,
        version: u64,
        bytes: &[u8],
    ) -> Result<RecordMetadata, RecordError<L::Error>> {
        let loaded = self.load(&self.owner(), id, version).await?;
        check_record::<L::Error>(&loaded.record)?;

        let Record {
            mut metadata,
            content,
        } = loaded.record;

        let content = if metadata.is_encrypted {
            let keypair = self.keypair()?;
            let mut plaintext = content.envelope().open(keypair.private_key())?;
            plaintext.extend_from_slice(bytes);
            StoredContent::sealed(Envelope::seal(&plaintext, keypair.public_key())?)
        } else {
            let mut stored = content.bytes;
            stored.extend_from_slice(bytes);
            StoredContent::plain(stored)
        };

        metadata.bind(&content);
        metadata.updated_at = self.touch(metadata.updated_at);

        self.commit_version(
            &metadata,
            &content,
            loaded.metadata_address,
            loaded.metadata_payload,
            loaded.content_payload,
        )
        .await?;

        tracing::info!(
            id = %id,
            version,
            appended = bytes.len(),
            bytes = metadata.byte_length,
            "appended to record version"
        );
        Ok(metadata)
    }

    /// Replace the content of an existing version
    ///
    /// May switch between plaintext and encrypted mode; the expiry is replaced
    /// by `options.expires_at`.
    pub async fn update(
        &self,
        id: &RecordId,
        version: u64,
        bytes: &[u8],
        options: WriteOptions,
    ) -> Result<RecordMetadata, RecordError<L::Error>> {
        let loaded = self.load(&self.owner(), id, version).await?;
        let mut metadata = loaded.record.metadata;

        // expiry is checked against the write's own timestamp, not the raw clock
        let updated_at = self.touch(metadata.updated_at);
        check_expiry::<L::Error>(options.expires_at, updated_at)?;

        let content = self.seal(bytes.to_vec(), options.encrypt)?;
        metadata.bind(&content);
        metadata.updated_at = updated_at;
        metadata.expires_at = options.expires_at;

        self.commit_version(
            &metadata,
            &content,
            loaded.metadata_address,
            loaded.metadata_payload,
            loaded.content_payload,
        )
        .await?;

        tracing::info!(
            id = %id,
            version,
            encrypted = metadata.is_encrypted,
            bytes = metadata.byte_length,
            "updated record version"
        );
        Ok(metadata)
    }

    /// Remove the metadata and content of one version
    ///
    /// The version counter is left alone.
    pub async fn delete(&self, id: &RecordId, version: u64) -> Result<(), RecordError<L::Error>> {
        let loaded = self.load(&self.owner(), id, version).await?;

        self.ledger
            .commit(vec![
                LedgerOp::Delete {
                    address: loaded.record.metadata.content_address,
                },
                LedgerOp::Delete {
                    address: loaded.metadata_address,
                },
            ])
            .await?;

        tracing::info!(id = %id, version, "deleted record version");
        Ok(())
    }

    /// Remove the version counter of `id`
    ///
    /// With `strict_counter_delete` set this fails with
    /// `RecordError::VersionsRemaining` while any version is still stored, since
    /// nothing could enumerate those versions afterwards.
    pub async fn delete_counter(&self, id: &RecordId) -> Result<(), RecordError<L::Error>> {
        let counter_address = self.deriver.version_counter(&self.owner(), id)?;

        if self.strict_counter_delete {
            let versions = self.live_versions(id).await?;
            if !versions.is_empty() {
                return Err(RecordError::VersionsRemaining { id: *id, versions });
            }
        }

        self.ledger.delete(counter_address.address).await?;

        tracing::info!(id = %id, "deleted version counter");
        Ok(())
    }

    /// Versions of `id` that still have metadata stored, ascending
    pub async fn live_versions(&self, id: &RecordId) -> Result<Vec<u64>, RecordError<L::Error>> {
        let owner = self.owner();
        let Some(current) = self.current_version(id).await? else {
            return Ok(Vec::new());
        };

        let mut live = Vec::new();
        for version in 1..=current {
            let address = self.deriver.metadata(&owner, id, version)?;
            if self.ledger.exists(address.address).await? {
                live.push(version);
            }
        }
        Ok(live)
    }

    /// Read one version of one of our records, as stored
    pub async fn read(&self, id: &RecordId, version: u64) -> Result<Record, RecordError<L::Error>> {
        self.read_from(&self.owner(), id, version).await
    }

    /// Read one version of any owner's record, as stored
    pub async fn read_from(
        &self,
        owner: &PublicKey,
        id: &RecordId,
        version: u64,
    ) -> Result<Record, RecordError<L::Error>> {
        Ok(self.load(owner, id, version).await?.record)
    }

    /// Read the newest version of `id`
    ///
    /// `None` if no counter exists or the newest version was deleted.
    pub async fn read_latest(&self, id: &RecordId) -> Result<Option<Record>, RecordError<L::Error>> {
        let Some(version) = self.current_version(id).await? else {
            return Ok(None);
        };
        match self.read(id, version).await {
            Ok(record) => Ok(Some(record)),
            Err(RecordError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read one version and check its content against the stored digest
    pub async fn read_verified(
        &self,
        id: &RecordId,
        version: u64,
    ) -> Result<Record, RecordError<L::Error>> {
        let record = self.read(id, version).await?;
        if let Err(e) = check_record::<L::Error>(&record) {
            tracing::warn!(id = %id, version, error = %e, "record failed integrity check");
            return Err(e);
        }
        Ok(record)
    }

    /// Read, verify and (when encrypted) decrypt one version
    pub async fn read_plaintext(
        &self,
        id: &RecordId,
        version: u64,
    ) -> Result<Vec<u8>, RecordError<L::Error>> {
        let record = self.read_verified(id, version).await?;
        self.open(record)
    }

    /// The newest `limit` versions of `id` that still exist, ascending
    pub async fn read_versions(
        &self,
        id: &RecordId,
        limit: u64,
    ) -> Result<Vec<Record>, RecordError<L::Error>> {
        let Some(current) = self.current_version(id).await? else {
            return Ok(Vec::new());
        };

        let start = current.saturating_sub(limit).saturating_add(1).max(1);
        let mut records = Vec::new();
        for version in start..=current {
            match self.read(id, version).await {
                Ok(record) => records.push(record),
                Err(RecordError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Like [`RecordStore::read_versions`], verified and decrypted
    pub async fn read_plaintext_versions(
        &self,
        id: &RecordId,
        limit: u64,
    ) -> Result<Vec<(u64, Vec<u8>)>, RecordError<L::Error>> {
        let mut out = Vec::new();
        for record in self.read_versions(id, limit).await? {
            check_record::<L::Error>(&record)?;
            let version = record.metadata.version;
            out.push((version, self.open(record)?));
        }
        Ok(out)
    }

    /// Timestamp for a rewrite: the clock reading, but always strictly after
    ///  the previous write at `last`
    pub(super) fn touch(&self, last: u64) -> u64 {
        self.clock.now().max(last.saturating_add(1))
    }

    fn keypair(&self) -> Result<DerivedKeyPair, KeyDerivationError> {
        DerivedKeyPair::from_identity(&self.identity)
    }

    pub(super) fn seal(&self, bytes: Vec<u8>, encrypt: bool) -> Result<StoredContent, RecordError<L::Error>> {
        if !encrypt {
            return Ok(StoredContent::plain(bytes));
        }
        let keypair = self.keypair()?;
        Ok(StoredContent::sealed(Envelope::seal(
            &bytes,
            keypair.public_key(),
        )?))
    }

    fn open(&self, record: Record) -> Result<Vec<u8>, RecordError<L::Error>> {
        self.open_content(record.metadata.is_encrypted, record.content)
    }

    pub(super) fn open_content(
        &self,
        encrypted: bool,
        content: StoredContent,
    ) -> Result<Vec<u8>, RecordError<L::Error>> {
        if !encrypted {
            return Ok(content.bytes);
        }
        let keypair = self.keypair()?;
        Ok(content.envelope().open(keypair.private_key())?)
    }

    pub(super) async fn read_payload<P: Payload>(
        &self,
        address: Address,
    ) -> Result<Option<(P, Digest)>, RecordError<L::Error>> {
        match self.ledger.read(address).await {
            Ok(payload) => Ok(Some((P::decode(&payload)?, integrity::digest(&payload)))),
            Err(LedgerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(
        &self,
        owner: &PublicKey,
        id: &RecordId,
        version: u64,
    ) -> Result<Loaded, RecordError<L::Error>> {
        let not_found = || RecordError::<L::Error>::NotFound { id: *id, version };

        let metadata_address = self.deriver.metadata(owner, id, version)?.address;
        let (metadata, metadata_payload) = self
            .read_payload::<RecordMetadata>(metadata_address)
            .await?
            .ok_or_else(not_found)?;
        let (content, content_payload) = self
            .read_payload::<StoredContent>(metadata.content_address)
            .await?
            .ok_or_else(not_found)?;

        Ok(Loaded {
            record: Record { metadata, content },
            metadata_address,
            metadata_payload,
            content_payload,
        })
    }

    async fn commit_version(
        &self,
        metadata: &RecordMetadata,
        content: &StoredContent,
        metadata_address: Address,
        metadata_payload: Digest,
        content_payload: Digest,
    ) -> Result<(), RecordError<L::Error>> {
        self.ledger
            .commit(vec![
                LedgerOp::Write {
                    address: metadata.content_address,
                    payload: content.encode()?,
                    expected: Some(Expect::Matches(content_payload)),
                },
                LedgerOp::Write {
                    address: metadata_address,
                    payload: metadata.encode()?,
                    expected: Some(Expect::Matches(metadata_payload)),
                },
            ])
            .await?;
        Ok(())
    }
}

/// Length and digest of the stored bytes must match the metadata
fn check_record<E>(record: &Record) -> Result<(), RecordError<E>> {
    check_content(
        record.metadata.byte_length,
        &record.metadata.content_digest,
        &record.content.bytes,
    )
}

/// Length first, then digest
pub(super) fn check_content<E>(
    byte_length: u64,
    digest: &Digest,
    bytes: &[u8],
) -> Result<(), RecordError<E>> {
    let actual = bytes.len() as u64;
    if byte_length != actual {
        return Err(RecordError::SizeMismatch {
            expected: byte_length,
            actual,
        });
    }
    integrity::verify(bytes, digest)?;
    Ok(())
}

fn check_expiry<E>(expires_at: Option<u64>, now: u64) -> Result<(), RecordError<E>> {
    match expires_at {
        Some(expires_at) if expires_at <= now => Err(RecordError::InvalidExpiry { expires_at, now }),
        _ => Ok(()),
    }
}
