/**
 * Deterministic ledger addresses.
 *  Every account a record occupies is found by
 *  hashing its owner, id, version and a domain
 *  label under the ledger program id.
 */
pub mod address;
/**
 * Cryptographic types and operations.
 *  - Ed25519 identities
 *  - Deterministic RSA keypairs derived from them
 *  - AES-GCM envelopes with RSA-wrapped session keys
 */
pub mod crypto;
/**
 * Content digests binding metadata to stored bytes.
 */
pub mod integrity;
/**
 * Versioned record lifecycle on top of an
 *  abstract ledger store.
 */
pub mod record;

pub mod prelude {
    pub use crate::address::{Address, AddressDeriver, Domain, RecordId};
    pub use crate::crypto::{DerivedKeyPair, Envelope, PublicKey, SecretKey};
    pub use crate::integrity::Digest;
    pub use crate::record::{
        ByteStore, LedgerStore, MemoryLedgerStore, Record, RecordError, RecordMetadata,
        RecordStore, RecordStoreConfig, VersionCounter, WriteOptions,
    };
}
