use clap::Args;

use common::address::RecordId;

use super::input::{parse_record_id, Content, InputError};
use super::{describe, StoreError};
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Append {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    #[arg(long)]
    pub version: u64,

    #[command(flatten)]
    pub content: Content,
}

#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    #[error("append failed: {0}")]
    State(#[from] StateError),
    #[error("append failed: {0}")]
    Input(#[from] InputError),
    #[error("append failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Append {
    type Error = AppendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        let bytes = self.content.bytes().await?;
        let metadata = store.append(&self.id, self.version, &bytes).await?;
        Ok(describe(&metadata))
    }
}
