use std::env;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const BACKEND_URL_VAR: &str = "TASKMARKET_BACKEND_URL";
pub const LOG_DIR_VAR: &str = "TASKMARKET_LOG_DIR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TASKMARKET_BACKEND_URL must be set (or pass --backend-url, or run with --offline)")]
    MissingBackendUrl,

    #[error("invalid backend url '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },
}

/// Where tasks come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Remote { base_url: String },
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub log_dir: PathBuf,
}

/// Values given on the command line; each one wins over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub offline: bool,
}

impl Config {
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok(), overrides)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let log_dir = overrides
            .log_dir
            .or_else(|| lookup(LOG_DIR_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        let backend = if overrides.offline {
            Backend::Offline
        } else {
            let raw = overrides
                .backend_url
                .or_else(|| lookup(BACKEND_URL_VAR))
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::MissingBackendUrl)?;
            Backend::Remote {
                base_url: validate_base_url(raw.trim())?,
            }
        };

        Ok(Self { backend, log_dir })
    }
}

fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBackendUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
