use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use scenebridge_core::assets::DEFAULT_IGNORE;
use scenebridge_core::directory::Directory;
use scenebridge_rpc::{BRIDGE_BASE_PORT, PORT_ATTEMPTS};
use serde::Deserialize;

pub const HOST_CONFIG_FILE: &str = "host.toml";
pub const HOST_ENV_PREFIX: &str = "SCENEBRIDGE_HOST";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory that scene, template and asset paths are relative to.
    pub project_root: PathBuf,
    /// Scene file opened at startup. Without one the host starts with an
    /// empty untitled scene.
    pub scene: Option<String>,
    /// Extra type catalogs, relative to the project root unless absolute.
    pub type_catalogs: Vec<PathBuf>,
    /// Glob patterns excluded from the asset index.
    pub asset_ignore: Vec<String>,
    pub bridge_base_port: u16,
    pub port_attempts: u16,
    pub undo_limit: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            scene: None,
            type_catalogs: Vec::new(),
            asset_ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            bridge_base_port: BRIDGE_BASE_PORT,
            port_attempts: PORT_ATTEMPTS,
            undo_limit: 256,
        }
    }
}

impl HostConfig {
    /// Layer, lowest first: built-in defaults, the config file, then
    /// `SCENEBRIDGE_HOST_*` environment variables.
    ///
    /// Without an explicit `file`, `host.toml` in the config directory is used
    /// if it exists.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let file = match file {
            Some(file) => Some((file.to_path_buf(), true)),
            None => Directory::config_directory().map(|dir| (dir.join(HOST_CONFIG_FILE), false)),
        };

        let mut builder = Config::builder();
        if let Some((path, required)) = &file {
            tracing::debug!("[Config] Reading {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        builder = builder.add_source(
            Environment::with_prefix(HOST_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.bridge_base_port, 27020);
        assert_eq!(config.port_attempts, 10);
        assert!(config.asset_ignore.iter().any(|p| p == ".git/**"));
    }

    #[test]
    fn test_load_file_over_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
project_root = "/work/city"
scene = "Assets/Scenes/Main.scene"
type_catalogs = ["types/game.toml"]
undo_limit = 16
"#
        )
        .unwrap();

        let config = HostConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.project_root, PathBuf::from("/work/city"));
        assert_eq!(config.scene.as_deref(), Some("Assets/Scenes/Main.scene"));
        assert_eq!(config.type_catalogs, vec![PathBuf::from("types/game.toml")]);
        assert_eq!(config.undo_limit, 16);
        // Untouched keys keep their defaults
        assert_eq!(config.bridge_base_port, 27020);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(HostConfig::load(Some(&temp.path().join("nope.toml"))).is_err());
    }
}
