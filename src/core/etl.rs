use crate::core::{Pipeline, RunSummary};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// A missing source directory aborts the run; a file that fails is
    /// logged and the next one is processed.
    pub async fn run(&self) -> Result<RunSummary> {
        let files = self.pipeline.discover().await?;
        self.pipeline.prepare().await?;

        let mut summary = RunSummary {
            discovered: files.len(),
            ..RunSummary::default()
        };

        for path in files {
            tracing::info!("Processing file: {}", path.display());
            match self.process_file(&path).await {
                Some(written) => summary.written.push(written),
                None => summary.failed.push(path),
            }
        }

        tracing::info!(
            "Completed processing all stack files ({} written, {} failed).",
            summary.written.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    async fn process_file(&self, path: &Path) -> Option<PathBuf> {
        let file = match self.pipeline.extract(path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("Error reading or parsing {}: {}", path.display(), e);
                return None;
            }
        };

        let result = match self.pipeline.transform(file).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Error transforming {}: {}", path.display(), e);
                return None;
            }
        };

        let file_name = result.file_name.clone();
        match self.pipeline.load(result).await {
            Ok(written) => Some(written),
            Err(e) => {
                tracing::error!("Error writing {}: {}", file_name, e);
                None
            }
        }
    }
}
