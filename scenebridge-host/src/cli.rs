use std::path::PathBuf;

use clap::Parser;

use crate::config::HostConfig;

#[derive(Parser, Debug)]
#[clap(name = "scenebridge-host")]
#[clap(version)]
#[clap(about = "Scene host: owns the scene graph and executes bridge commands")]
pub struct Cli {
    /// Config file to use instead of host.toml in the config directory
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Project root directory
    #[clap(long)]
    pub project: Option<PathBuf>,

    /// Scene file to open at startup, relative to the project root
    #[clap(long)]
    pub scene: Option<String>,

    /// First bridge port to try
    #[clap(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Command-line flags win over everything in the config.
    pub fn apply(&self, config: &mut HostConfig) {
        if let Some(project) = &self.project {
            config.project_root = project.clone();
        }
        if let Some(scene) = &self.scene {
            config.scene = Some(scene.clone());
        }
        if let Some(port) = self.port {
            config.bridge_base_port = port;
        }
    }
}
