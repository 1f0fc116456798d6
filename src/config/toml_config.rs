use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything one run needs. Defaults match the production cluster layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackConfig {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub file_suffix: String,
    pub log_dir: PathBuf,
    pub gluster: GlusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlusterConfig {
    pub nodes: Vec<String>,
    pub base_path: String,
    pub driver: String,
    pub replicate: u32,
    pub read_only: bool,
    pub strict_volume_names: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("/mnt/glusterfs/stacks/stacks/"),
            destination_dir: PathBuf::from("/mnt/glusterfs/prod/"),
            file_suffix: ".yml".to_string(),
            log_dir: PathBuf::from("."),
            gluster: GlusterConfig::default(),
        }
    }
}

impl Default for GlusterConfig {
    fn default() -> Self {
        Self {
            nodes: vec![
                "172.30.230.1".to_string(),
                "172.30.230.2".to_string(),
                "172.30.230.3".to_string(),
            ],
            base_path: "/data/gluster".to_string(),
            driver: "glusterfs".to_string(),
            replicate: 3,
            read_only: false,
            strict_volume_names: false,
        }
    }
}

impl StackConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，未設定的欄位使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("source_dir", &self.source_dir)?;
        validation::validate_path("destination_dir", &self.destination_dir)?;
        validation::validate_path("log_dir", &self.log_dir)?;
        validation::validate_non_empty_string("file_suffix", &self.file_suffix)?;
        validation::validate_node_addresses("gluster.nodes", &self.gluster.nodes)?;
        validation::validate_non_empty_string("gluster.base_path", &self.gluster.base_path)?;
        validation::validate_non_empty_string("gluster.driver", &self.gluster.driver)?;
        validation::validate_positive_number("gluster.replicate", self.gluster.replicate, 1)?;
        Ok(())
    }
}

impl ConfigProvider for StackConfig {
    fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    fn file_suffix(&self) -> &str {
        &self.file_suffix
    }

    fn nodes(&self) -> &[String] {
        &self.gluster.nodes
    }

    fn base_path(&self) -> &str {
        &self.gluster.base_path
    }

    fn driver(&self) -> &str {
        &self.gluster.driver
    }

    fn replicate(&self) -> u32 {
        self.gluster.replicate
    }

    fn read_only(&self) -> bool {
        self.gluster.read_only
    }

    fn strict_volume_names(&self) -> bool {
        self.gluster.strict_volume_names
    }
}

impl Validate for StackConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
