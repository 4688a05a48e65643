//! Configuration management for odin-bridge.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Command line flags and environment variables (ODIN_BRIDGE_*)
//! 2. Config file (`--config`, else <config dir>/odin-bridge/config.toml)
//! 3. Default values

use odin_core::BridgeSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BridgeError;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control server location
    pub server: ServerConfig,

    /// Discovery and polling settings
    pub bridge: BridgeSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("odin-bridge").join("config.toml"))
    }

    /// Load from `path`, or the default location. A missing file yields the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, BridgeError> {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, BridgeError> {
        let content = std::fs::read_to_string(path).map_err(|source| BridgeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| BridgeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command line and environment overrides
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odin_core::builder::AdapterKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.bridge.api_prefix, "api/0.1");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "odin-server"

[bridge]
update_period_ms = 1000

[bridge.adapter_kinds]
fp2 = "frame_processor"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.host, "odin-server");
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.bridge.update_period_ms, 1000);
        assert_eq!(config.bridge.adapter_kind("fp2"), AdapterKind::FrameProcessor);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a port\"").unwrap();

        assert!(matches!(
            Config::load(Some(file.path())),
            Err(BridgeError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(Some("detector".to_string()), None);
        assert_eq!(config.server.host, "detector");
        assert_eq!(config.server.port, 8888);

        let config = config.with_overrides(None, Some(9000));
        assert_eq!(config.server.port, 9000);
    }
}
