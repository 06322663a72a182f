use std::collections::HashSet;

use clap::Args;

use common::crypto::PublicKey;

use super::input::parse_public_key;
use super::StoreError;
use crate::state::StateError;

/// List everything an owner holds on the ledger
#[derive(Args, Debug, Clone)]
pub struct List {
    /// Owner key as hex (defaults to our own)
    #[arg(long, value_parser = parse_public_key)]
    pub owner: Option<PublicKey>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("list failed: {0}")]
    State(#[from] StateError),
    #[error("list failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for List {
    type Error = ListError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        let owner = self.owner.unwrap_or_else(|| store.owner());

        let orphans: HashSet<_> = store
            .list_orphans(&owner)
            .await?
            .into_iter()
            .map(|m| (m.id, m.version))
            .collect();

        let mut lines = Vec::new();
        for metadata in store.list_metadata(&owner).await? {
            let mut line = format!(
                "record {} v{}: {} bytes",
                metadata.id, metadata.version, metadata.byte_length
            );
            if metadata.is_encrypted {
                line.push_str(", encrypted");
            }
            if orphans.contains(&(metadata.id, metadata.version)) {
                line.push_str(", orphaned");
            }
            lines.push(line);
        }
        for counter in store.list_counters(&owner).await? {
            lines.push(format!(
                "counter {}: v{}",
                counter.id, counter.current_version
            ));
        }
        for byte_store in store.list_stores(&owner).await? {
            let mut line = format!("store {}: {} bytes", byte_store.id, byte_store.byte_length);
            if byte_store.is_encrypted {
                line.push_str(", encrypted");
            }
            lines.push(line);
        }

        if lines.is_empty() {
            return Ok(format!("nothing stored for {}", owner));
        }
        Ok(lines.join("\n"))
    }
}
