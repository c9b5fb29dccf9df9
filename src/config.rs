use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Bridge server configuration, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the Horizon server used for account queries and submission
    pub horizon: String,

    pub network_passphrase: String,

    /// Base URL of the compliance service. Without it every payment is
    /// assembled directly, even when it carries an extra memo.
    #[serde(default)]
    pub compliance: Option<String>,

    /// Fee per operation, in stroops
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,

    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Scheme used to fetch `stellar.toml` during federation lookups
    #[serde(default = "default_federation_scheme")]
    pub federation_scheme: String,
}

fn default_port() -> u16 {
    8001
}
fn default_base_fee() -> u32 {
    100
}
fn default_federation_scheme() -> String {
    "https".to_string()
}

impl BridgeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BridgeConfig = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon.trim().is_empty() {
            return Err(ConfigError::Invalid("horizon must not be empty"));
        }
        if self.network_passphrase.is_empty() {
            return Err(ConfigError::Invalid("network_passphrase must not be empty"));
        }
        if self.base_fee == 0 {
            return Err(ConfigError::Invalid("base_fee must be positive"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl std::str::FromStr for BridgeConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
