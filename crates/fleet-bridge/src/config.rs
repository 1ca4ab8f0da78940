// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML configuration for the bridge.
//!
//! Missing or unreadable configuration is fatal and reported before the
//! pipeline starts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MQTT broker connection settings.
    pub mqtt: MqttConfig,
    /// Document store settings.
    pub database: DatabaseConfig,
}

/// MQTT broker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker hostname or IP.
    pub host: String,

    /// Broker port (8883 for TLS deployments).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Client identifier presented to the broker.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Keep-alive interval in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// TLS material for mutual authentication. None = plain TCP
    /// (development brokers).
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// Paths to TLS material for mutual authentication with the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Trusted CA certificate bundle (PEM).
    pub ca: PathBuf,
    /// Client certificate (PEM).
    pub cert: PathBuf,
    /// Client private key (PEM).
    pub key: PathBuf,
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path.
    pub path: String,
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "fleet-bridge".to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig {
                host: "localhost".to_string(),
                port: default_port(),
                client_id: default_client_id(),
                keep_alive_secs: default_keep_alive_secs(),
                tls: None,
            },
            database: DatabaseConfig {
                path: "fleet.db".to_string(),
            },
        }
    }
}

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Config {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Create a new config builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Config builder for fluent construction (tests, embedding).
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    client_id: Option<String>,
    keep_alive_secs: Option<u64>,
    tls: Option<TlsConfig>,
    database_path: Option<String>,
}

impl ConfigBuilder {
    /// Set the broker host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the broker port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the client identifier.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the keep-alive interval in seconds.
    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive_secs = Some(secs);
        self
    }

    /// Set the TLS material paths.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Set the SQLite database path.
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Build the configuration, filling unset fields from defaults.
    pub fn build(self) -> Config {
        let defaults = Config::default();

        Config {
            mqtt: MqttConfig {
                host: self.host.unwrap_or(defaults.mqtt.host),
                port: self.port.unwrap_or(defaults.mqtt.port),
                client_id: self.client_id.unwrap_or(defaults.mqtt.client_id),
                keep_alive_secs: self.keep_alive_secs.unwrap_or(defaults.mqtt.keep_alive_secs),
                tls: self.tls,
            },
            database: DatabaseConfig {
                path: self.database_path.unwrap_or(defaults.database.path),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r#"
mqtt:
  host: "broker.local"
database:
  path: "fleet.db"
"#;

    const FULL_YAML: &str = r#"
mqtt:
  host: "broker.fleet.example.com"
  port: 8883
  client_id: "bridge-01"
  keep_alive_secs: 60
  tls:
    ca: "/etc/bridge/ca.crt"
    cert: "/etc/bridge/client.crt"
    key: "/etc/bridge/client.key"
database:
  path: "/var/lib/bridge/fleet.db"
"#;

    #[test]
    fn test_config_parse_minimal() {
        let config = Config::from_yaml(MINIMAL_YAML).expect("parse minimal yaml");

        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.client_id, "fleet-bridge");
        assert_eq!(config.mqtt.keep_alive_secs, 30);
        assert!(config.mqtt.tls.is_none());
        assert_eq!(config.database.path, "fleet.db");
    }

    #[test]
    fn test_config_parse_all_fields() {
        let config = Config::from_yaml(FULL_YAML).expect("parse full yaml");

        assert_eq!(config.mqtt.host, "broker.fleet.example.com");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.client_id, "bridge-01");
        assert_eq!(config.mqtt.keep_alive_secs, 60);

        let tls = config.mqtt.tls.expect("tls section");
        assert_eq!(tls.ca, PathBuf::from("/etc/bridge/ca.crt"));
        assert_eq!(tls.cert, PathBuf::from("/etc/bridge/client.crt"));
        assert_eq!(tls.key, PathBuf::from("/etc/bridge/client.key"));

        assert_eq!(config.database.path, "/var/lib/bridge/fleet.db");
    }

    #[test]
    fn test_config_rejects_garbage() {
        assert!(Config::from_yaml("mqtt: [not, a, mapping]").is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder()
            .host("127.0.0.1")
            .port(1884)
            .client_id("test-bridge")
            .database_path(":memory:")
            .build();

        assert_eq!(config.mqtt.host, "127.0.0.1");
        assert_eq!(config.mqtt.port, 1884);
        assert_eq!(config.mqtt.client_id, "test-bridge");
        assert_eq!(config.mqtt.keep_alive_secs, 30);
        assert_eq!(config.database.path, ":memory:");
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/bridge.yaml")).expect_err("must fail");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
