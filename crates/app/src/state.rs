use std::{fs, path::PathBuf};

use common::crypto::{KeyError, PublicKey, SecretKey};
use common::record::RecordStoreConfig;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "byte-store";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const LEDGER_DIR_NAME: &str = "ledger";
pub const LOG_DIR_NAME: &str = "logs";

/// Id of the deployed byte store ledger program
pub const DEFAULT_PROGRAM_ID: &str =
    "c6dd8f18916ecf4edda58a8b5ac427ec2918b90fa3a38bba52852ef6067f5c2d";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Ledger program the record addresses are derived under (hex)
    #[serde(default = "default_program_id")]
    pub program_id: String,
    /// Refuse to delete a version counter while versions are still stored
    #[serde(default = "default_strict_counter_delete")]
    pub strict_counter_delete: bool,
    /// Default log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_program_id() -> String {
    DEFAULT_PROGRAM_ID.to_string()
}

fn default_strict_counter_delete() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            strict_counter_delete: default_strict_counter_delete(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn record_store_config(&self) -> Result<RecordStoreConfig, StateError> {
        let program_id = PublicKey::from_hex(&self.program_id)
            .map_err(|e| StateError::InvalidProgramId(e.to_string()))?;
        Ok(RecordStoreConfig {
            program_id,
            strict_counter_delete: self.strict_counter_delete,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the app directory (~/.byte-store)
    pub app_dir: PathBuf,
    /// Path to the signing key PEM file
    pub key_path: PathBuf,
    /// Path to the local ledger directory
    pub ledger_path: PathBuf,
    /// Path to the log directory
    pub log_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the app directory path (custom or default ~/.byte-store)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new app directory with a fresh signing key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if app_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let config = config.unwrap_or_default();
        // fail before touching the disk
        config.record_store_config()?;

        fs::create_dir_all(&app_dir)?;

        let ledger_path = app_dir.join(LEDGER_DIR_NAME);
        fs::create_dir_all(&ledger_path)?;
        let log_path = app_dir.join(LOG_DIR_NAME);
        fs::create_dir_all(&log_path)?;

        let key = SecretKey::generate()?;
        let key_path = app_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config_path = app_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            app_dir,
            key_path,
            ledger_path,
            log_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the app directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if !app_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = app_dir.join(KEY_FILE_NAME);
        let ledger_path = app_dir.join(LEDGER_DIR_NAME);
        let log_path = app_dir.join(LOG_DIR_NAME);
        let config_path = app_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !ledger_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", LEDGER_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            app_dir,
            key_path,
            ledger_path,
            log_path,
            config_path,
            config,
        })
    }

    /// Load the signing key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("byte-store directory not initialized. Run 'byte-store init' first")]
    NotInitialized,

    #[error("byte-store directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid program id: {0}")]
    InvalidProgramId(String),

    #[error("key generation failed: {0}")]
    Key(#[from] KeyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");

        let state = AppState::init(Some(path.clone()), None).unwrap();
        assert!(state.ledger_path.is_dir());
        assert_eq!(state.config, AppConfig::default());

        let loaded = AppState::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.config, state.config);
        assert_eq!(
            loaded.load_key().unwrap().public(),
            state.load_key().unwrap().public()
        );

        assert!(matches!(
            AppState::init(Some(path), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: AppConfig = toml::from_str("strict_counter_delete = false").unwrap();
        assert!(!config.strict_counter_delete);
        assert_eq!(config.program_id, DEFAULT_PROGRAM_ID);
        assert_eq!(config.log_level, "info");

        let store_config = config.record_store_config().unwrap();
        assert!(!store_config.strict_counter_delete);
    }

    #[test]
    fn test_invalid_program_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            program_id: "not hex".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            AppState::init(Some(dir.path().to_path_buf()), Some(config)),
            Err(StateError::InvalidProgramId(_))
        ));
    }
}
