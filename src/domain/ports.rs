use crate::domain::model::{StackFile, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    /// Files directly inside `dir` whose name ends with `suffix`, sorted.
    fn list_files(
        &self,
        dir: &Path,
        suffix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<PathBuf>>> + Send;
    fn read_file(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Returns `true` when the directory had to be created.
    fn ensure_dir(&self, path: &Path) -> impl std::future::Future<Output = Result<bool>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_dir(&self) -> &Path;
    fn destination_dir(&self) -> &Path;
    fn file_suffix(&self) -> &str;
    fn nodes(&self) -> &[String];
    fn base_path(&self) -> &str;
    fn driver(&self) -> &str;
    fn replicate(&self) -> u32;
    fn read_only(&self) -> bool;
    fn strict_volume_names(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn discover(&self) -> Result<Vec<PathBuf>>;
    async fn prepare(&self) -> Result<()>;
    async fn extract(&self, path: &Path) -> Result<StackFile>;
    async fn transform(&self, file: StackFile) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<PathBuf>;
}
