use clap::Args;

use common::address::RecordId;

use super::input::{parse_record_id, render};
use super::StoreError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Versions {
    #[arg(long, value_parser = parse_record_id)]
    pub id: RecordId,

    /// How many of the newest versions to show
    #[arg(long, default_value_t = 10)]
    pub limit: u64,

    /// Always print content as base64
    #[arg(long)]
    pub base64: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionsError {
    #[error("versions failed: {0}")]
    State(#[from] StateError),
    #[error("versions failed: {0}")]
    Record(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Versions {
    type Error = VersionsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.record_store()?;
        let versions = store.read_plaintext_versions(&self.id, self.limit).await?;

        if versions.is_empty() {
            return Ok(format!("{} has no stored versions", self.id));
        }

        let lines: Vec<String> = versions
            .iter()
            .map(|(version, bytes)| format!("v{}: {}", version, render(bytes, self.base64)))
            .collect();
        Ok(lines.join("\n"))
    }
}
