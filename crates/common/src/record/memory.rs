use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::ledger::{Expect, LedgerError, LedgerOp, LedgerStore, ScanFilter};
use crate::address::Address;
use crate::integrity;

/// In-memory ledger store using a HashMap
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<RwLock<HashMap<Address, Vec<u8>>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryLedgerStoreError {
    #[error("memory provider error: {0}")]
    Internal(String),
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of addresses currently holding a payload
    pub fn len(&self) -> Result<usize, LedgerError<MemoryLedgerStoreError>> {
        let inner = self.inner.read().map_err(|e| {
            LedgerError::Provider(MemoryLedgerStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;
        Ok(inner.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError<MemoryLedgerStoreError>> {
        Ok(self.len()? == 0)
    }
}

/// Check a precondition against what is stored, taking earlier
///  operations of the same batch into account
fn check_expected(
    address: &Address,
    current: Option<&Vec<u8>>,
    expected: &Expect,
) -> Result<(), LedgerError<MemoryLedgerStoreError>> {
    let holds = match (expected, current) {
        (Expect::Absent, None) => true,
        (Expect::Absent, Some(_)) => false,
        (Expect::Matches(_), None) => false,
        (Expect::Matches(digest), Some(payload)) => integrity::digest(payload) == *digest,
    };
    if holds {
        Ok(())
    } else {
        Err(LedgerError::Conflict(*address))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Error = MemoryLedgerStoreError;

    async fn read(&self, address: Address) -> Result<Vec<u8>, LedgerError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            LedgerError::Provider(MemoryLedgerStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        inner
            .get(&address)
            .cloned()
            .ok_or(LedgerError::NotFound(address))
    }

    async fn scan(
        &self,
        filter: &ScanFilter,
    ) -> Result<Vec<(Address, Vec<u8>)>, LedgerError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            LedgerError::Provider(MemoryLedgerStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        Ok(inner
            .iter()
            .filter(|(_, payload)| filter.matches(payload))
            .map(|(address, payload)| (*address, payload.clone()))
            .collect())
    }

    async fn commit(&self, ops: Vec<LedgerOp>) -> Result<(), LedgerError<Self::Error>> {
        let mut inner = self.inner.write().map_err(|e| {
            LedgerError::Provider(MemoryLedgerStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        // Stage every operation first so a failure leaves the store untouched
        let mut staged: HashMap<Address, Option<Vec<u8>>> = HashMap::new();
        for op in ops {
            let address = *op.address();
            let current = match staged.get(&address) {
                Some(value) => value.as_ref(),
                None => inner.get(&address),
            };

            match op {
                LedgerOp::Write {
                    payload, expected, ..
                } => {
                    if let Some(expected) = &expected {
                        check_expected(&address, current, expected)?;
                    }
                    staged.insert(address, Some(payload));
                }
                LedgerOp::Delete { .. } => {
                    if current.is_none() {
                        return Err(LedgerError::NotFound(address));
                    }
                    staged.insert(address, None);
                }
            }
        }

        for (address, value) in staged {
            match value {
                Some(payload) => {
                    inner.insert(address, payload);
                }
                None => {
                    inner.remove(&address);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> Address {
        Address::from([byte; 32])
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let store = MemoryLedgerStore::new();

        store.write(address(1), vec![1, 2, 3], None).await.unwrap();
        assert_eq!(store.read(address(1)).await.unwrap(), vec![1, 2, 3]);
        assert!(store.exists(address(1)).await.unwrap());

        store.delete(address(1)).await.unwrap();
        assert!(matches!(
            store.read(address(1)).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(address(1)).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expect_absent_conflicts() {
        let store = MemoryLedgerStore::new();

        store
            .write(address(1), vec![1], Some(Expect::Absent))
            .await
            .unwrap();

        let result = store
            .write(address(1), vec![2], Some(Expect::Absent))
            .await;
        assert_eq!(result, Err(LedgerError::Conflict(address(1))));
        assert_eq!(store.read(address(1)).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_expect_matches() {
        let store = MemoryLedgerStore::new();
        store.write(address(1), vec![1], None).await.unwrap();

        let stale = integrity::digest(&[0]);
        let result = store
            .write(address(1), vec![2], Some(Expect::Matches(stale)))
            .await;
        assert_eq!(result, Err(LedgerError::Conflict(address(1))));

        let fresh = integrity::digest(&[1]);
        store
            .write(address(1), vec![2], Some(Expect::Matches(fresh)))
            .await
            .unwrap();
        assert_eq!(store.read(address(1)).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_commit_is_atomic() {
        let store = MemoryLedgerStore::new();
        store.write(address(2), vec![9], None).await.unwrap();

        let result = store
            .commit(vec![
                LedgerOp::Write {
                    address: address(1),
                    payload: vec![1],
                    expected: Some(Expect::Absent),
                },
                LedgerOp::Write {
                    address: address(2),
                    payload: vec![2],
                    expected: Some(Expect::Absent),
                },
            ])
            .await;
        assert_eq!(result, Err(LedgerError::Conflict(address(2))));

        // first write of the failed batch must not have landed
        assert!(!store.exists(address(1)).await.unwrap());
        assert_eq!(store.read(address(2)).await.unwrap(), vec![9]);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scan_by_prefix() {
        let store = MemoryLedgerStore::new();
        store.write(address(1), vec![1, 9, 9], None).await.unwrap();
        store.write(address(2), vec![2, 9, 9], None).await.unwrap();
        store.write(address(3), vec![1, 0], None).await.unwrap();

        let mut hits = store.scan(&ScanFilter::new(1, vec![9, 9])).await.unwrap();
        hits.sort();
        assert_eq!(
            hits,
            vec![(address(1), vec![1, 9, 9]), (address(2), vec![2, 9, 9])]
        );
    }
}
