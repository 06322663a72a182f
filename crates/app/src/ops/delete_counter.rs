use clap::Args;

use common::address::RecordId;

use super::input::parse_record_id;
use super::StoreError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct DeleteCounter {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteCounterError {
    #[error("delete-counter failed: {0}")]
    State(#[from] StateError),
    #[error("delete-counter failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for DeleteCounter {
    type Error = DeleteCounterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        store.delete_counter(&self.id).await?;
        Ok(format!("deleted version counter of {}", self.id))
    }
}
