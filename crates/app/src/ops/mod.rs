pub mod append;
pub mod create;
pub mod delete;
pub mod delete_counter;
pub mod get;
pub mod init;
pub mod input;
pub mod list;
pub mod store;
pub mod update;
pub mod versions;
pub mod whoami;

pub use append::Append;
pub use create::Create;
pub use delete::Delete;
pub use delete_counter::DeleteCounter;
pub use get::Get;
pub use init::Init;
pub use list::List;
pub use store::Store;
pub use update::Update;
pub use versions::Versions;
pub use whoami::Whoami;

use common::record::{RecordError, RecordMetadata};

use crate::ledger::FileLedgerStoreError;

/// Record errors as surfaced by the local ledger
pub type StoreError = RecordError<FileLedgerStoreError>;

/// Human readable summary of one version's metadata
pub fn describe(metadata: &RecordMetadata) -> String {
    let expires_at = match metadata.expires_at {
        Some(ts) => ts.to_string(),
        None => "never".to_string(),
    };
    format!(
        "id: {}\n\
         version: {}\n\
         owner: {}\n\
         bytes: {}\n\
         digest: {}\n\
         encrypted: {}\n\
         content address: {}\n\
         created at: {}\n\
         updated at: {}\n\
         expires at: {}",
        metadata.id,
        metadata.version,
        metadata.owner,
        metadata.byte_length,
        metadata.content_digest,
        metadata.is_encrypted,
        metadata.content_address,
        metadata.created_at,
        metadata.updated_at,
        expires_at
    )
}
