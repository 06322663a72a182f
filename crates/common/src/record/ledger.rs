use async_trait::async_trait;

use crate::address::Address;
use crate::integrity::Digest;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError<T> {
    /// Backend-specific failure
    #[error("unhandled ledger provider error: {0}")]
    Provider(#[from] T),
    /// Nothing is stored at the address
    #[error("nothing stored at {0}")]
    NotFound(Address),
    /// A write precondition did not hold, i.e. another
    ///  writer got there first
    #[error("conflicting write at {0}")]
    Conflict(Address),
}

/// Precondition on the payload currently stored at an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Nothing may be stored there yet
    Absent,
    /// The stored payload must hash to this digest
    Matches(Digest),
}

/// Byte pattern a stored payload must carry at a fixed offset
///
/// Payload layouts are fixed width up to their owner field, so this is enough
/// to select every payload of one owner without decoding the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl ScanFilter {
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    pub fn matches(&self, payload: &[u8]) -> bool {
        self.offset
            .checked_add(self.bytes.len())
            .and_then(|end| payload.get(self.offset..end))
            .is_some_and(|window| window == self.bytes.as_slice())
    }
}

/// One step of an atomic ledger transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    Write {
        address: Address,
        payload: Vec<u8>,
        expected: Option<Expect>,
    },
    Delete {
        address: Address,
    },
}

impl LedgerOp {
    pub fn address(&self) -> &Address {
        match self {
            LedgerOp::Write { address, .. } => address,
            LedgerOp::Delete { address } => address,
        }
    }
}

/// The ledger program and its storage, seen from the client
///
/// Implementations own all durable state. Every write or delete goes through
/// [`LedgerStore::commit`], which applies a batch of operations atomically:
/// either every operation lands or none does.
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the payload stored at an address
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The stored payload
    /// * `Err(LedgerError::NotFound)` - Nothing is stored there
    async fn read(&self, address: Address) -> Result<Vec<u8>, LedgerError<Self::Error>>;

    /// Every stored payload accepted by `filter`, with its address
    ///
    /// Order is unspecified.
    async fn scan(
        &self,
        filter: &ScanFilter,
    ) -> Result<Vec<(Address, Vec<u8>)>, LedgerError<Self::Error>>;

    /// Apply a batch of operations atomically
    ///
    /// Should fail with the following errors to be considered
    ///  correct:
    /// * `Err(LedgerError::Conflict)` - A write precondition did not hold
    /// * `Err(LedgerError::NotFound)` - A delete targeted an empty address
    async fn commit(&self, ops: Vec<LedgerOp>) -> Result<(), LedgerError<Self::Error>>;

    /// Write a single payload
    async fn write(
        &self,
        address: Address,
        payload: Vec<u8>,
        expected: Option<Expect>,
    ) -> Result<(), LedgerError<Self::Error>> {
        self.commit(vec![LedgerOp::Write {
            address,
            payload,
            expected,
        }])
        .await
    }

    /// Delete a single payload
    async fn delete(&self, address: Address) -> Result<(), LedgerError<Self::Error>> {
        self.commit(vec![LedgerOp::Delete { address }]).await
    }

    async fn exists(&self, address: Address) -> Result<bool, LedgerError<Self::Error>> {
        match self.read(address).await {
            Ok(_) => Ok(true),
            Err(LedgerError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scan_filter_window() {
        let filter = ScanFilter::new(2, vec![7, 8]);
        assert!(filter.matches(&[0, 0, 7, 8, 9]));
        assert!(!filter.matches(&[0, 0, 7, 9, 9]));
        // too short to hold the window
        assert!(!filter.matches(&[0, 0, 7]));
        assert!(ScanFilter::new(0, Vec::new()).matches(&[]));
    }
}
