use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use common::address::Address;
use common::integrity;
use common::record::{Expect, LedgerError, LedgerOp, LedgerStore, ScanFilter};

#[derive(Debug, thiserror::Error)]
pub enum FileLedgerStoreError {
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local stand-in for the ledger program
///
/// Every payload lives in its own file named after the hex address. Commits
/// are serialized through a lock and all preconditions are checked before the
/// first file is touched; each write lands through a rename.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

fn io_error(e: std::io::Error) -> LedgerError<FileLedgerStoreError> {
    LedgerError::Provider(FileLedgerStoreError::Io(e))
}

impl FileLedgerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn path(&self, address: &Address) -> PathBuf {
        self.root.join(address.to_hex())
    }

    async fn load(
        &self,
        address: &Address,
    ) -> Result<Option<Vec<u8>>, LedgerError<FileLedgerStoreError>> {
        match tokio::fs::read(self.path(address)).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    type Error = FileLedgerStoreError;

    async fn read(&self, address: Address) -> Result<Vec<u8>, LedgerError<Self::Error>> {
        self.load(&address)
            .await?
            .ok_or(LedgerError::NotFound(address))
    }

    async fn scan(
        &self,
        filter: &ScanFilter,
    ) -> Result<Vec<(Address, Vec<u8>)>, LedgerError<Self::Error>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            // leftover `.tmp` files and anything else not named by an address
            let Some(address) = entry
                .file_name()
                .to_str()
                .and_then(|name| Address::from_hex(name).ok())
            else {
                continue;
            };
            if let Some(payload) = self.load(&address).await? {
                if filter.matches(&payload) {
                    found.push((address, payload));
                }
            }
        }
        Ok(found)
    }

    async fn commit(&self, ops: Vec<LedgerOp>) -> Result<(), LedgerError<Self::Error>> {
        let _guard = self.lock.lock().await;

        let mut staged: HashMap<Address, Option<Vec<u8>>> = HashMap::new();
        let mut order = Vec::new();
        for op in ops {
            let address = *op.address();
            let current = match staged.get(&address) {
                Some(value) => value.clone(),
                None => self.load(&address).await?,
            };

            match op {
                LedgerOp::Write {
                    payload, expected, ..
                } => {
                    let holds = match (expected, &current) {
                        (None, _) => true,
                        (Some(Expect::Absent), current) => current.is_none(),
                        (Some(Expect::Matches(_)), None) => false,
                        (Some(Expect::Matches(digest)), Some(stored)) => {
                            integrity::digest(stored) == digest
                        }
                    };
                    if !holds {
                        tracing::debug!(%address, "ledger precondition failed");
                        return Err(LedgerError::Conflict(address));
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
            if !order.contains(&address) {
                order.push(address);
            }
        }

        for address in order {
            let path = self.path(&address);
            match staged.remove(&address).flatten() {
                Some(payload) => {
                    let tmp = path.with_extension("tmp");
                    tokio::fs::write(&tmp, payload).await.map_err(io_error)?;
                    tokio::fs::rename(&tmp, &path).await.map_err(io_error)?;
                }
                None => {
                    tokio::fs::remove_file(&path).await.map_err(io_error)?;
                }
            }
        }

        Ok(())
    }
}
