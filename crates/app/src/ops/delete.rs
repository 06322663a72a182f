use clap::Args;

use common::address::RecordId;

use super::input::parse_record_id;
use super::StoreError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Delete {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    #[arg(long)]
    pub version: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("delete failed: {0}")]
    State(#[from] StateError),
    #[error("delete failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Delete {
    type Error = DeleteError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        store.delete(&self.id, self.version).await?;
        Ok(format!("deleted {} version {}", self.id, self.version))
    }
}
