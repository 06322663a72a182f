use clap::Args;

use common::address::RecordId;

use super::describe_store;
use crate::ops::input::{parse_record_id, Content, InputError};
use crate::ops::StoreError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Store id, at most 32 bytes
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    #[command(flatten)]
    pub content: Content,

    /// Encrypt the content for the owner
    #[arg(long)]
    pub encrypt: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("store create failed: {0}")]
    State(#[from] StateError),
    #[error("store create failed: {0}")]
    Input(#[from] InputError),
    #[error("store create failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Create {
    type Error = CreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        let bytes = self.content.bytes().await?;
        let created = store.create_store(&self.id, &bytes, self.encrypt).await?;
        Ok(describe_store(&created))
    }
}
