//! Shared test utilities for record store integration tests
#![allow(dead_code)]

use common::crypto::{PublicKey, SecretKey};
use common::record::{ManualClock, MemoryLedgerStore, RecordStore, RecordStoreConfig};

/// Route store logs to the test output, honouring RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const START: u64 = 1_700_000_000_000;

pub fn program_id() -> PublicKey {
    PublicKey::from([7u8; 32])
}

/// Set up a store over a fresh in-memory ledger with a clock that ticks one
///  millisecond per reading
pub fn setup_store() -> (RecordStore<MemoryLedgerStore>, ManualClock) {
    setup_store_with(SecretKey::from([3u8; 32]), RecordStoreConfig::new(program_id()))
}

pub fn setup_store_with(
    identity: SecretKey,
    config: RecordStoreConfig,
) -> (RecordStore<MemoryLedgerStore>, ManualClock) {
    init_tracing();
    let clock = ManualClock::ticking(START, 1);
    let store = RecordStore::new(MemoryLedgerStore::new(), identity, config)
        .with_clock(clock.clone());
    (store, clock)
}

/// A second owner sharing the ledger of `store`
pub fn second_owner(store: &RecordStore<MemoryLedgerStore>) -> RecordStore<MemoryLedgerStore> {
    RecordStore::new(
        store.ledger().clone(),
        SecretKey::from([4u8; 32]),
        RecordStoreConfig::new(program_id()),
    )
    .with_clock(ManualClock::ticking(START, 1))
}
