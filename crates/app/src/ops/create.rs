use clap::Args;

use common::address::RecordId;
use common::record::WriteOptions;

use super::input::{parse_record_id, Content, InputError};
use super::{describe, StoreError};
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Record id, at most 32 bytes
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    #[command(flatten)]
    pub content: Content,

    /// Encrypt the content for the owner
    #[arg(long)]
    pub encrypt: bool,

    /// Unix timestamp (milliseconds) after which the version may be dropped
    #[arg(long)]
    pub expires_at: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("create failed: {0}")]
    State(#[from] StateError),
    #[error("create failed: {0}")]
    Input(#[from] InputError),
    #[error("create failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Create {
    type Error = CreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        let bytes = self.content.bytes().await?;

        let options = WriteOptions {
            encrypt: self.encrypt,
            expires_at: self.expires_at,
        };
        let metadata = store.create(&self.id, &bytes, options).await?;

        Ok(describe(&metadata))
    }
}
