use std::path::PathBuf;

use base64::Engine;
use clap::Args;

use common::address::{AddressError, RecordId};
use common::crypto::{KeyError, PublicKey};

/// Where the bytes of a write come from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Content {
    /// Literal text, stored as its UTF-8 bytes
    #[arg(long)]
    pub data: Option<String>,

    /// Base64 encoded bytes
    #[arg(long)]
    pub base64: Option<String>,

    /// Read the bytes from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to read {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no content given; pass --data, --base64 or --file")]
    Missing,
}

impl Content {
    pub async fn bytes(&self) -> Result<Vec<u8>, InputError> {
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(encoded) = &self.base64 {
            return Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?);
        }
        if let Some(path) = &self.file {
            return tokio::fs::read(path).await.map_err(|source| InputError::File {
                path: path.clone(),
                source,
            });
        }
        Err(InputError::Missing)
    }
}

/// Parse a record id given on the command line
pub fn parse_record_id(raw: &str) -> Result<RecordId, AddressError> {
    RecordId::try_from(raw)
}

/// Parse an owner key given on the command line as hex
pub fn parse_public_key(raw: &str) -> Result<PublicKey, KeyError> {
    PublicKey::from_hex(raw)
}

/// Show bytes as text when they are UTF-8, base64 otherwise
pub fn render(bytes: &[u8], force_base64: bool) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) if !force_base64 => text.to_string(),
        _ => base64::engine::general_purpose::STANDARD.encode(bytes),
    }
}
