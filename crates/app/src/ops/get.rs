use clap::Args;

use common::address::RecordId;

use super::input::{parse_record_id, render};
use super::{describe, StoreError};
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    /// Version to read (defaults to the newest)
    #[arg(long)]
    pub version: Option<u64>,

    /// Show metadata and the stored bytes as-is, without verifying or decrypting
    #[arg(long)]
    pub raw: bool,

    /// Always print content as base64
    #[arg(long)]
    pub base64: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("get failed: {0}")]
    State(#[from] StateError),
    #[error("get failed: {0}")]
    Record(#[from] StoreError),
    #[error("get failed: {0} has no versions")]
    NoVersions(RecordId),
}

#[async_trait::async_trait]
impl crate::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;

        let version = match self.version {
            Some(version) => version,
            None => store
                .current_version(&self.id)
                .await?
                .ok_or(GetError::NoVersions(self.id))?,
        };

        if self.raw {
            let record = store.read(&self.id, version).await?;
            let content = &record.content;
            return Ok(format!(
                "{}\ncontent: {}\nwrapped key: {}\nnonce: {}\nauth tag: {}",
                describe(&record.metadata),
                render(&content.bytes, true),
                render(&content.wrapped_key, true),
                render(&content.nonce, true),
                render(&content.auth_tag, true),
            ));
        }

        let plaintext = store.read_plaintext(&self.id, version).await?;
        Ok(render(&plaintext, self.base64))
    }
}
