use clap::Args;

use crate::state::{AppConfig, AppState, DEFAULT_PROGRAM_ID};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Ledger program id to derive record addresses under (hex)
    #[arg(long, default_value = DEFAULT_PROGRAM_ID)]
    pub program_id: String,

    /// Allow deleting a version counter while versions are still stored
    #[arg(long)]
    pub lenient_counter_delete: bool,

    /// Default log level for the log file
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            program_id: self.program_id.clone(),
            strict_counter_delete: !self.lenient_counter_delete,
            log_level: self.log_level.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let owner = state.load_key()?.public();

        let output = format!(
            "Initialized byte-store directory at: {}\n\
             - Key: {}\n\
             - Ledger: {}\n\
             - Logs: {}\n\
             - Config: {}\n\
             - Owner: {}\n\
             - Program id: {}\n\
             - Strict counter delete: {}",
            state.app_dir.display(),
            state.key_path.display(),
            state.ledger_path.display(),
            state.log_path.display(),
            state.config_path.display(),
            owner,
            state.config.program_id,
            state.config.strict_counter_delete
        );

        Ok(output)
    }
}
