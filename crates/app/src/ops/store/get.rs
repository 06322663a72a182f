use clap::Args;

use common::address::RecordId;

use super::describe_store;
use crate::ops::input::{parse_record_id, render};
use crate::ops::StoreError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    /// Show the store and its bytes as-is, without verifying or decrypting
    #[arg(long)]
    pub raw: bool,

    /// Always print content as base64
    #[arg(long)]
    pub base64: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("store get failed: {0}")]
    State(#[from] StateError),
    #[error("store get failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;

        if self.raw {
            let stored = store.read_store(&self.id).await?;
            return Ok(format!(
                "{}\ncontent: {}",
                describe_store(&stored),
                render(&stored.content.bytes, true),
            ));
        }

        let plaintext = store.read_store_plaintext(&self.id).await?;
        Ok(render(&plaintext, self.base64))
    }
}
