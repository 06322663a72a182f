//! Versioned records on the ledger
//!
//! A record is identified by `(owner, id)`. Each `create` adds a new version
//! with its own metadata and content accounts; a per-record version counter
//! tracks the newest version ever created. Content is stored either as-is or
//! sealed in an [`crate::crypto::Envelope`] for the owner.
//!
//! Next to versioned records an owner can keep unversioned byte stores, one
//! per id, rewritten in place. Everything an owner holds can be listed by
//! scanning the ledger for their key.
//!
//! The ledger itself sits behind [`LedgerStore`], so the same lifecycle runs
//! against the in-memory store in tests and a file-backed one in the CLI.

mod byte_store;
mod clock;
mod ledger;
mod memory;
mod query;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{Expect, LedgerError, LedgerOp, LedgerStore, ScanFilter};
pub use memory::{MemoryLedgerStore, MemoryLedgerStoreError};
pub use store::{RecordError, RecordStore, RecordStoreConfig, WriteOptions};
pub use types::{
    ByteStore, Payload, PayloadError, Record, RecordMetadata, StoredContent, VersionCounter,
};
