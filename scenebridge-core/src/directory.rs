use std::path::PathBuf;

use directories::ProjectDirs;

pub struct Directory {}

impl Directory {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "scenebridge", "SceneBridge")
    }

    /// Config directory, created on first use.
    pub fn config_directory() -> Option<PathBuf> {
        let dir = Self::project_dirs()?.config_dir().to_path_buf();
        if !dir.exists() {
            let _ = std::fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    /// Directory for rolling log files
    pub fn logs_directory() -> Option<PathBuf> {
        let dir = Self::project_dirs()?.data_local_dir().join("logs");
        if !dir.exists() {
            let _ = std::fs::create_dir_all(&dir);
        }
        Some(dir)
    }
}
