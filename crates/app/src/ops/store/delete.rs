use clap::Args;

use common::address::RecordId;

use crate::ops::input::parse_record_id;
use crate::ops::StoreError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Delete {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("store delete failed: {0}")]
    State(#[from] StateError),
    #[error("store delete failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Delete {
    type Error = DeleteError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        store.delete_store(&self.id).await?;
        Ok(format!("deleted byte store {}", self.id))
    }
}
