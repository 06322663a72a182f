use clap::{Args, Subcommand};

pub mod create;
pub mod delete;
pub mod get;
pub mod update;

use common::record::ByteStore;

use crate::op::Op;

crate::command_enum! {
    (Create, create::Create),
    (Update, update::Update),
    (Delete, delete::Delete),
    (Get, get::Get),
}

// Rename the generated Command to StoreCommand for clarity
pub type StoreCommand = Command;

/// Unversioned byte stores, one per id
#[derive(Args, Debug, Clone)]
pub struct Store {
    #[command(subcommand)]
    pub command: StoreCommand,
}

#[async_trait::async_trait]
impl Op for Store {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Human readable summary of a byte store, without its content
pub fn describe_store(store: &ByteStore) -> String {
    format!(
        "id: {}\n\
         owner: {}\n\
         bytes: {}\n\
         digest: {}\n\
         encrypted: {}\n\
         created at: {}\n\
         updated at: {}",
        store.id,
        store.owner,
        store.byte_length,
        store.content_digest,
        store.is_encrypted,
        store.created_at,
        store.updated_at,
    )
}
