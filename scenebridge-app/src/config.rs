use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use scenebridge_core::directory::Directory;
use scenebridge_rpc::{BRIDGE_BASE_PORT, MCP_BASE_PORT, PORT_ATTEMPTS};
use serde::Deserialize;

pub const APP_CONFIG_FILE: &str = "app.toml";
pub const APP_ENV_PREFIX: &str = "SCENEBRIDGE_APP";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mcp_base_port: u16,
    pub bridge_base_port: u16,
    /// Ports tried above each base port, the base included
    pub port_attempts: u16,
    /// How long the bridge waits for the host to answer one command
    pub command_timeout_secs: u64,
    /// Upper bound for a whole `tools/call`
    pub tool_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mcp_base_port: MCP_BASE_PORT,
            bridge_base_port: BRIDGE_BASE_PORT,
            port_attempts: PORT_ATTEMPTS,
            command_timeout_secs: 30,
            tool_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `SCENEBRIDGE_APP_*` variables.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let file: Option<(PathBuf, bool)> = match file {
            Some(file) => Some((file.to_path_buf(), true)),
            None => Directory::config_directory().map(|dir| (dir.join(APP_CONFIG_FILE), false)),
        };

        let mut builder = Config::builder();
        if let Some((path, required)) = &file {
            tracing::debug!("[Config] Reading {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        builder = builder.add_source(
            Environment::with_prefix(APP_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.mcp_base_port, 27030);
        assert_eq!(config.bridge_base_port, 27020);
        assert_eq!(config.command_timeout(), Duration::from_secs(30));
        assert_eq!(config.tool_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_file_overrides_some_keys() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "mcp_base_port = 28030\ntool_timeout_secs = 5").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.mcp_base_port, 28030);
        assert_eq!(config.tool_timeout_secs, 5);
        assert_eq!(config.bridge_base_port, 27020);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
