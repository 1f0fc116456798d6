pub mod toml_config;

pub use toml_config::{GlusterConfig, StackConfig};

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Without arguments the built-in defaults are used; flags override the
/// defaults or the values of `--config`.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "gluster-stacks")]
#[command(about = "Convert Docker stack volumes to the GlusterFS driver")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    #[arg(long)]
    pub destination_dir: Option<PathBuf>,

    /// GlusterFS node addresses, comma separated
    #[arg(long, value_delimiter = ',')]
    pub nodes: Vec<String>,

    #[arg(long)]
    pub base_path: Option<String>,

    /// Directory for the per-run log file
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Require the whole volume name to match, not just its prefix
    #[arg(long)]
    pub strict_volume_names: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn resolve(&self) -> Result<StackConfig> {
        let mut config = match &self.config {
            Some(path) => StackConfig::from_file(path)?,
            None => StackConfig::default(),
        };

        if let Some(dir) = &self.source_dir {
            config.source_dir = dir.clone();
        }
        if let Some(dir) = &self.destination_dir {
            config.destination_dir = dir.clone();
        }
        if !self.nodes.is_empty() {
            config.gluster.nodes = self.nodes.clone();
        }
        if let Some(base_path) = &self.base_path {
            config.gluster.base_path = base_path.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
        }
        if self.strict_volume_names {
            config.gluster.strict_volume_names = true;
        }

        Ok(config)
    }
}
