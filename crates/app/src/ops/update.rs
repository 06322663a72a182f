use clap::Args;

use common::address::RecordId;
use common::record::WriteOptions;

use super::input::{parse_record_id, Content, InputError};
use super::{describe, StoreError};
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Update {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    #[arg(long)]
    pub version: u64,

    #[command(flatten)]
    pub content: Content,

    /// Encrypt the new content; without it the version is stored in plaintext
    #[arg(long)]
    pub encrypt: bool,

    /// New expiry in unix milliseconds; omitting it clears any existing one
    #[arg(long)]
    pub expires_at: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("update failed: {0}")]
    State(#[from] StateError),
    #[error("update failed: {0}")]
    Input(#[from] InputError),
    #[error("update failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Update {
    type Error = UpdateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        let bytes = self.content.bytes().await?;

        let options = WriteOptions {
            encrypt: self.encrypt,
            expires_at: self.expires_at,
        };
        let metadata = store.update(&self.id, self.version, &bytes, options).await?;

        Ok(describe(&metadata))
    }
}
