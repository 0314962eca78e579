use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;

pub const FILE_PATH_VAR: &str = "DIUSD_FILE_PATH";
pub const FRED_API_KEY_VAR: &str = "FRED_API_KEY";
const SGS_BASE_URL_VAR: &str = "DIUSD_SGS_BASE_URL";
const FRED_BASE_URL_VAR: &str = "DIUSD_FRED_BASE_URL";

pub const DEFAULT_SGS_BASE_URL: &str = "https://api.bcb.gov.br";
pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org";

/// Runtime configuration, read once from the environment and passed down
/// explicitly. The base URLs exist so tests can point the providers at a
/// local server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub snapshot_path: PathBuf,
    pub fred_api_key: Option<String>,
    pub sgs_base_url: String,
    pub fred_base_url: String,
}

impl AppConfig {
    /// Fails with `ConfigError` when `DIUSD_FILE_PATH` is unset. The FRED
    /// key is only required for `sync`, so its absence is checked there.
    pub fn from_env() -> Result<Self, ConfigError> {
        let snapshot_path: PathBuf = env::var(FILE_PATH_VAR)
            .map_err(|_| ConfigError::MissingEnv(FILE_PATH_VAR))?
            .into();

        Ok(AppConfig {
            snapshot_path,
            fred_api_key: env::var(FRED_API_KEY_VAR).ok(),
            sgs_base_url: env::var(SGS_BASE_URL_VAR)
                .unwrap_or_else(|_| DEFAULT_SGS_BASE_URL.to_string()),
            fred_base_url: env::var(FRED_BASE_URL_VAR)
                .unwrap_or_else(|_| DEFAULT_FRED_BASE_URL.to_string()),
        })
    }

    pub fn fred_api_key(&self) -> Result<&str, ConfigError> {
        self.fred_api_key
            .as_deref()
            .ok_or(ConfigError::MissingEnv(FRED_API_KEY_VAR))
    }
}
