use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::IdentityRef;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid identities file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Identity listed in the identities file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentityEntry {
    pub provider: String,
    pub identity: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl IdentityEntry {
    pub fn identity_ref(&self) -> IdentityRef {
        IdentityRef::new(self.provider.clone(), self.identity.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdentitiesFile {
    #[serde(default)]
    identity: Vec<IdentityEntry>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Option<Duration>,
    pub poll_interval: u64,
    pub provider: Option<String>,
    pub identity: Option<String>,
    pub identities_file: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("QUOTABOARD_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            api_url: env::var("QUOTABOARD_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            api_token: env::var("QUOTABOARD_API_TOKEN").ok().filter(|s| !s.is_empty()),
            // 0 disables the timeout
            request_timeout: env::var("QUOTABOARD_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map_or(Some(30), |secs| (secs > 0).then_some(secs))
                .map(Duration::from_secs),
            poll_interval: env::var("QUOTABOARD_POLL_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            provider: env::var("QUOTABOARD_PROVIDER").ok().filter(|s| !s.is_empty()),
            identity: env::var("QUOTABOARD_IDENTITY").ok().filter(|s| !s.is_empty()),
            identities_file: env::var("QUOTABOARD_IDENTITIES_FILE").map(PathBuf::from).ok(),
            log_level: env::var("QUOTABOARD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Identity whose collections are kept in the local stores
    pub fn selected_identity(&self) -> Option<IdentityRef> {
        match (&self.provider, &self.identity) {
            (Some(provider), Some(identity)) => Some(IdentityRef::new(provider.clone(), identity.clone())),
            _ => None,
        }
    }

    /// Copy safe to log: the API token is masked
    pub fn redacted(&self) -> Self {
        Self {
            api_token: self.api_token.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }

    /// Identities from the identities file, empty when none is configured
    pub fn load_identities(&self) -> Result<Vec<IdentityEntry>, ConfigError> {
        match &self.identities_file {
            Some(path) => read_identities(path),
            None => Ok(Vec::new()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn read_identities(path: &Path) -> Result<Vec<IdentityEntry>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_identities(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_identities(content: &str) -> Result<Vec<IdentityEntry>, toml::de::Error> {
    let file: IdentitiesFile = toml::from_str(content)?;
    Ok(file.identity)
}
