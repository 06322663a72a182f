use std::collections::BTreeMap;

use super::ledger::{LedgerStore, ScanFilter};
use super::store::{RecordError, RecordStore};
use super::types::{ByteStore, Payload, RecordMetadata, VersionCounter};
use crate::address::{AddressError, DerivedAddress};
use crate::crypto::PublicKey;

/// Owner-wide listings
///
/// The ledger is scanned for payloads carrying `owner` at the offset of the
/// owner field. A hit only counts if it decodes and its address re-derives
/// from its own contents, which tells the payload kinds apart.
impl<L: LedgerStore> RecordStore<L> {
    /// Every stored version of every record of `owner`, by id then version
    ///
    /// Versions whose counter is gone are included.
    pub async fn list_metadata(
        &self,
        owner: &PublicKey,
    ) -> Result<Vec<RecordMetadata>, RecordError<L::Error>> {
        let mut found = self
            .scan_owned::<RecordMetadata>(owner, RecordMetadata::OWNER_OFFSET, |m| {
                self.deriver().metadata(&m.owner, &m.id, m.version)
            })
            .await?;
        found.sort_by_key(|m| (m.id, m.version));
        Ok(found)
    }

    /// Every version counter of `owner`, by id
    pub async fn list_counters(
        &self,
        owner: &PublicKey,
    ) -> Result<Vec<VersionCounter>, RecordError<L::Error>> {
        let mut found = self
            .scan_owned::<VersionCounter>(owner, VersionCounter::OWNER_OFFSET, |c| {
                self.deriver().version_counter(&c.owner, &c.id)
            })
            .await?;
        found.sort_by_key(|c| c.id);
        Ok(found)
    }

    /// Every byte store of `owner`, by id
    pub async fn list_stores(
        &self,
        owner: &PublicKey,
    ) -> Result<Vec<ByteStore>, RecordError<L::Error>> {
        let mut found = self
            .scan_owned::<ByteStore>(owner, ByteStore::OWNER_OFFSET, |s| {
                self.deriver().store(&s.owner, &s.id)
            })
            .await?;
        found.sort_by_key(|s| s.id);
        Ok(found)
    }

    /// Stored versions of `owner` that no counter accounts for
    ///
    /// Either the counter of their id was deleted, or it sits below the
    /// version. Nothing can reach these by id any more, only by listing.
    pub async fn list_orphans(
        &self,
        owner: &PublicKey,
    ) -> Result<Vec<RecordMetadata>, RecordError<L::Error>> {
        let counters: BTreeMap<_, _> = self
            .list_counters(owner)
            .await?
            .into_iter()
            .map(|c| (c.id, c.current_version))
            .collect();

        Ok(self
            .list_metadata(owner)
            .await?
            .into_iter()
            .filter(|m| {
                counters
                    .get(&m.id)
                    .map_or(true, |current| m.version > *current)
            })
            .collect())
    }

    async fn scan_owned<P: Payload>(
        &self,
        owner: &PublicKey,
        offset: usize,
        address_of: impl Fn(&P) -> Result<DerivedAddress, AddressError>,
    ) -> Result<Vec<P>, RecordError<L::Error>> {
        let filter = ScanFilter::new(offset, owner.to_bytes());
        let mut found = Vec::new();
        for (address, payload) in self.ledger().scan(&filter).await? {
            let Ok(candidate) = P::decode(&payload) else {
                continue;
            };
            if address_of(&candidate)?.address == address {
                found.push(candidate);
            }
        }
        tracing::debug!(owner = %owner, offset, found = found.len(), "scanned ledger");
        Ok(found)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::RecordId;
    use crate::crypto::SecretKey;
    use crate::record::clock::ManualClock;
    use crate::record::memory::MemoryLedgerStore;
    use crate::record::store::{RecordStoreConfig, WriteOptions};

    fn store_for(ledger: MemoryLedgerStore, secret: u8) -> RecordStore<MemoryLedgerStore> {
        RecordStore::new(
            ledger,
            SecretKey::from([secret; 32]),
            RecordStoreConfig {
                program_id: PublicKey::from([9u8; 32]),
                strict_counter_delete: false,
            },
        )
        .with_clock(ManualClock::ticking(1_000, 1))
    }

    #[tokio::test]
    async fn test_listing_is_per_owner_and_per_kind() {
        let ledger = MemoryLedgerStore::new();
        let alice = store_for(ledger.clone(), 5);
        let bob = store_for(ledger, 6);
        let doc = RecordId::try_from("doc1").unwrap();
        let notes = RecordId::try_from("notes").unwrap();

        alice.create(&notes, b"n1", WriteOptions::plain()).await.unwrap();
        alice.create(&doc, b"d1", WriteOptions::encrypted()).await.unwrap();
        alice.create(&doc, b"d2", WriteOptions::plain()).await.unwrap();
        alice.create_store(&doc, b"s", false).await.unwrap();
        bob.create(&doc, b"other", WriteOptions::plain()).await.unwrap();

        let metadata = alice.list_metadata(&alice.owner()).await.unwrap();
        let keys: Vec<_> = metadata.iter().map(|m| (m.id, m.version)).collect();
        assert_eq!(keys, vec![(doc, 1), (doc, 2), (notes, 1)]);
        assert!(metadata.iter().all(|m| m.owner == alice.owner()));

        let counters = alice.list_counters(&alice.owner()).await.unwrap();
        let keys: Vec<_> = counters.iter().map(|c| (c.id, c.current_version)).collect();
        assert_eq!(keys, vec![(doc, 2), (notes, 1)]);

        let stores = alice.list_stores(&alice.owner()).await.unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].id, doc);

        // any store can list any owner
        let theirs = alice.list_metadata(&bob.owner()).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].owner, bob.owner());
        assert!(alice.list_stores(&bob.owner()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counterless_versions_are_orphans() {
        let store = store_for(MemoryLedgerStore::new(), 5);
        let doc = RecordId::try_from("doc1").unwrap();
        let kept = RecordId::try_from("kept").unwrap();

        store.create(&doc, b"a", WriteOptions::plain()).await.unwrap();
        store.create(&doc, b"b", WriteOptions::plain()).await.unwrap();
        store.create(&kept, b"c", WriteOptions::plain()).await.unwrap();
        assert!(store.list_orphans(&store.owner()).await.unwrap().is_empty());

        store.delete_counter(&doc).await.unwrap();
        assert_eq!(store.read_latest(&doc).await.unwrap(), None);

        let orphans = store.list_orphans(&store.owner()).await.unwrap();
        let keys: Vec<_> = orphans.iter().map(|m| (m.id, m.version)).collect();
        assert_eq!(keys, vec![(doc, 1), (doc, 2)]);

        // a fresh counter would start over at 1, on top of the orphaned version
        store.create(&doc, b"d", WriteOptions::plain()).await.unwrap_err();
        let orphans = store.list_orphans(&store.owner()).await.unwrap();
        assert_eq!(orphans.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_owner_lists_nothing() {
        let store = store_for(MemoryLedgerStore::new(), 5);
        let owner = store.owner();
        assert!(store.list_metadata(&owner).await.unwrap().is_empty());
        assert!(store.list_counters(&owner).await.unwrap().is_empty());
        assert!(store.list_orphans(&owner).await.unwrap().is_empty());
    }
}
