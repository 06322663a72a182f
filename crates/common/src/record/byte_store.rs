use super::ledger::{Expect, LedgerStore};
use super::store::{check_content, RecordError, RecordStore};
use super::types::{ByteStore, Payload, StoredContent};
use crate::address::RecordId;
use crate::crypto::PublicKey;
use crate::integrity::Digest;

/// Unversioned byte stores
///
/// A byte store lives at one address per `(owner, id)` and is rewritten in
/// place. It carries its own length and digest, so reads are checked the same
/// way as versioned records. There is no counter and no history.
impl<L: LedgerStore> RecordStore<L> {
    /// Create the byte store `id`
    ///
    /// Fails with `LedgerError::Conflict` if it already exists.
    pub async fn create_store(
        &self,
        id: &RecordId,
        bytes: &[u8],
        encrypt: bool,
    ) -> Result<ByteStore, RecordError<L::Error>> {
        let owner = self.owner();
        let address = self.deriver().store(&owner, id)?.address;
        let now = self.clock.now();

        let mut store = ByteStore {
            id: *id,
            owner,
            byte_length: 0,
            content_digest: Digest::default(),
            is_encrypted: false,
            created_at: now,
            updated_at: now,
            content: StoredContent::default(),
        };
        store.bind(self.seal(bytes.to_vec(), encrypt)?);

        self.ledger()
            .write(address, store.encode()?, Some(Expect::Absent))
            .await?;

        tracing::info!(
            id = %id,
            encrypted = store.is_encrypted,
            bytes = store.byte_length,
            "created byte store"
        );
        Ok(store)
    }

    /// Replace the content of the byte store `id`
    pub async fn update_store(
        &self,
        id: &RecordId,
        bytes: &[u8],
        encrypt: bool,
    ) -> Result<ByteStore, RecordError<L::Error>> {
        let address = self.deriver().store(&self.owner(), id)?.address;
        let (mut store, payload) = self
            .read_payload::<ByteStore>(address)
            .await?
            .ok_or(RecordError::<L::Error>::StoreNotFound(*id))?;

        store.bind(self.seal(bytes.to_vec(), encrypt)?);
        store.updated_at = self.touch(store.updated_at);

        self.ledger()
            .write(address, store.encode()?, Some(Expect::Matches(payload)))
            .await?;

        tracing::info!(
            id = %id,
            encrypted = store.is_encrypted,
            bytes = store.byte_length,
            "updated byte store"
        );
        Ok(store)
    }

    pub async fn delete_store(&self, id: &RecordId) -> Result<(), RecordError<L::Error>> {
        let address = self.deriver().store(&self.owner(), id)?.address;
        if !self.ledger().exists(address).await? {
            return Err(RecordError::StoreNotFound(*id));
        }
        self.ledger().delete(address).await?;

        tracing::info!(id = %id, "deleted byte store");
        Ok(())
    }

    /// Read one of our byte stores, as stored
    pub async fn read_store(&self, id: &RecordId) -> Result<ByteStore, RecordError<L::Error>> {
        self.read_store_from(&self.owner(), id).await
    }

    /// Read any owner's byte store, as stored
    pub async fn read_store_from(
        &self,
        owner: &PublicKey,
        id: &RecordId,
    ) -> Result<ByteStore, RecordError<L::Error>> {
        let address = self.deriver().store(owner, id)?.address;
        self.read_payload::<ByteStore>(address)
            .await?
            .map(|(store, _)| store)
            .ok_or(RecordError::StoreNotFound(*id))
    }

    /// Read, verify and (when encrypted) decrypt one of our byte stores
    pub async fn read_store_plaintext(
        &self,
        id: &RecordId,
    ) -> Result<Vec<u8>, RecordError<L::Error>> {
        let store = self.read_store(id).await?;
        if let Err(e) =
            check_content::<L::Error>(store.byte_length, &store.content_digest, &store.content.bytes)
        {
            tracing::warn!(id = %id, error = %e, "byte store failed integrity check");
            return Err(e);
        }
        self.open_content(store.is_encrypted, store.content)
    }
}
