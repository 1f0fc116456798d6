use crate::utils::error::Result;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 每次執行的日誌檔名，例如 `glusterfs_volume_update_20241006_142501.log`
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!(
        "glusterfs_volume_update_{}.log",
        now.format("%Y%m%d_%H%M%S")
    )
}

pub fn init_file_logger(verbose: bool, log_path: &Path) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gluster_stacks=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gluster_stacks=info"))
    };

    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    Ok(())
}
