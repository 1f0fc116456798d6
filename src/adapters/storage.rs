use crate::core::Storage;
use crate::utils::error::{Result, StackError};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    async fn list_files(&self, dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
        if !fs::try_exists(dir).await? {
            return Err(StackError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut entries = fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(suffix));
            if matches && fs::metadata(entry.path()).await?.is_file() {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let data = fs::read(path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(path, data).await?;
        Ok(())
    }

    async fn ensure_dir(&self, path: &Path) -> Result<bool> {
        if fs::try_exists(path).await? {
            return Ok(false);
        }
        fs::create_dir_all(path).await?;
        Ok(true)
    }
}
