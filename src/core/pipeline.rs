use crate::core::annotate;
use crate::core::document::StackDocument;
use crate::core::volumes::VolumeConverter;
use crate::core::{ConfigProvider, Pipeline, StackFile, Storage, TransformResult};
use crate::utils::error::{Result, StackError};
use std::path::{Path, PathBuf};

/// Converts the stack files of one source directory.
pub struct StackPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    converter: VolumeConverter,
}

impl<S: Storage, C: ConfigProvider> StackPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let converter = VolumeConverter::new(&config)?;
        Ok(Self {
            storage,
            config,
            converter,
        })
    }
}

fn reparse(file_name: &str, text: &str) -> Result<StackDocument> {
    StackDocument::parse(text).map_err(|e| StackError::ReparseError {
        file: file_name.to_string(),
        message: e.to_string(),
    })
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for StackPipeline<S, C> {
    async fn discover(&self) -> Result<Vec<PathBuf>> {
        tracing::info!(
            "Processing all stack files in directory: {}",
            self.config.source_dir().display()
        );
        self.storage
            .list_files(self.config.source_dir(), self.config.file_suffix())
            .await
    }

    async fn prepare(&self) -> Result<()> {
        let destination = self.config.destination_dir();
        if self.storage.ensure_dir(destination).await? {
            tracing::info!("Created destination directory: {}", destination.display());
        } else {
            tracing::info!(
                "Destination directory already exists: {}",
                destination.display()
            );
        }
        Ok(())
    }

    async fn extract(&self, path: &Path) -> Result<StackFile> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StackError::ConfigError {
                message: format!("{} has no usable file name", path.display()),
            })?
            .to_string();

        let bytes = self.storage.read_file(path).await?;
        let raw = String::from_utf8(bytes)?;
        let document = StackDocument::parse(&raw)?;

        Ok(StackFile {
            path: path.to_path_buf(),
            file_name,
            raw,
            document,
        })
    }

    async fn transform(&self, file: StackFile) -> Result<TransformResult> {
        let StackFile {
            path,
            file_name,
            raw,
            mut document,
        } = file;

        let converted_volumes = self.converter.apply(&mut document)?;
        tracing::info!(
            "Processed {} volume(s) for file: {}",
            converted_volumes.len(),
            path.display()
        );

        let mut document = reparse(&file_name, &document.render())?;

        let dynamic_values = annotate::annotate(&mut document, &raw);
        tracing::debug!(
            "Found {} dynamic value(s) in {}",
            dynamic_values.len(),
            file_name
        );
        annotate::reorder(&mut document);

        // 寫出前再確認一次輸出可被解析
        let content = document.render();
        reparse(&file_name, &content)?;

        Ok(TransformResult {
            source: path,
            file_name,
            content,
            converted_volumes,
            dynamic_values,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<PathBuf> {
        let destination = self.config.destination_dir().join(&result.file_name);
        self.storage
            .write_file(&destination, result.content.as_bytes())
            .await?;

        tracing::info!(
            "Copied and processed file: {} to {}",
            result.source.display(),
            destination.display()
        );
        Ok(destination)
    }
}
