//! Node configuration
//!
//! Read from a JSON file; every section and field has a default, so an empty
//! object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("Config I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("Invalid config in {path}: {source}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
}

/// Settings for one node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Legal name the node is known by on the network map
    #[serde(default = "default_legal_name")]
    pub legal_name: String,
    /// Key file; the platform data directory when absent
    #[serde(default)]
    pub identity_path: Option<PathBuf>,
    #[serde(default)]
    pub flow: FlowConfig,
}

fn default_legal_name() -> String {
    "O=Accord Node, L=Manila, C=PH".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            legal_name: default_legal_name(),
            identity_path: None,
            flow: FlowConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if it exists, otherwise the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Pretty JSON, as written by `accord init`
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Bounds on every suspend point of a flow, in milliseconds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Wait for a counterparty's signature or decline
    #[serde(default = "default_counterparty_timeout")]
    pub counterparty_timeout_ms: u64,
    /// Wait for the notary's answer
    #[serde(default = "default_notary_timeout")]
    pub notary_timeout_ms: u64,
    /// Wait for each participant's recorded acknowledgement
    #[serde(default = "default_distribution_timeout")]
    pub distribution_timeout_ms: u64,
    /// How long a responder waits for a proposal or for finality
    #[serde(default = "default_responder_wait")]
    pub responder_wait_ms: u64,
}

fn default_counterparty_timeout() -> u64 {
    30_000
}

fn default_notary_timeout() -> u64 {
    10_000
}

fn default_distribution_timeout() -> u64 {
    10_000
}

fn default_responder_wait() -> u64 {
    120_000
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            counterparty_timeout_ms: default_counterparty_timeout(),
            notary_timeout_ms: default_notary_timeout(),
            distribution_timeout_ms: default_distribution_timeout(),
            responder_wait_ms: default_responder_wait(),
        }
    }
}

impl FlowConfig {
    pub fn counterparty_timeout(&self) -> Duration {
        Duration::from_millis(self.counterparty_timeout_ms)
    }

    pub fn notary_timeout(&self) -> Duration {
        Duration::from_millis(self.notary_timeout_ms)
    }

    pub fn distribution_timeout(&self) -> Duration {
        Duration::from_millis(self.distribution_timeout_ms)
    }

    pub fn responder_wait(&self) -> Duration {
        Duration::from_millis(self.responder_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config: NodeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NodeConfig::default());
    }

    #[test]
    fn test_partial_flow_section() {
        let config: NodeConfig =
            serde_json::from_str(r#"{"legal_name":"O=Bank","flow":{"notary_timeout_ms":250}}"#).unwrap();

        assert_eq!(config.legal_name, "O=Bank");
        assert_eq!(config.flow.notary_timeout(), Duration::from_millis(250));
        assert_eq!(config.flow.counterparty_timeout_ms, default_counterparty_timeout());
    }

    #[test]
    fn test_load_reports_path() {
        let missing = std::env::temp_dir().join("accord-no-such-config.json");
        let err = NodeConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("accord-no-such-config.json"));
        assert_eq!(NodeConfig::load_or_default(&missing).unwrap(), NodeConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = NodeConfig {
            identity_path: Some(PathBuf::from("/tmp/id.key")),
            ..NodeConfig::default()
        };
        let back: NodeConfig = serde_json::from_str(&config.to_json()).unwrap();
        assert_eq!(back, config);
    }
}
