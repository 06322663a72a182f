use clap::Args;

use common::address::RecordId;

use super::describe_store;
use crate::ops::input::{parse_record_id, Content, InputError};
use crate::ops::StoreError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Update {
    /// Store id, at most 32 bytes
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    #[command(flatten)]
    pub content: Content,

    /// Encrypt the new content for the owner
    #[arg(long)]
    pub encrypt: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("store update failed: {0}")]
    State(#[from] StateError),
    #[error("store update failed: {0}")]
    Input(#[from] InputError),
    #[error("store update failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Update {
    type Error = UpdateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        let bytes = self.content.bytes().await?;
        let updated = store.update_store(&self.id, &bytes, self.encrypt).await?;
        Ok(describe_store(&updated))
    }
}
