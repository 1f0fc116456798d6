use anyhow::Context;
use chrono::Local;
use clap::Parser;
use gluster_stacks::utils::{logger, validation::Validate};
use gluster_stacks::{CliConfig, EtlEngine, LocalStorage, StackError, StackPipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    // 初始化日誌
    let log_path = config.log_dir.join(logger::log_file_name(Local::now()));
    logger::init_file_logger(cli.verbose, &log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    tracing::info!("Starting GlusterFS volume and Docker stack automation...");
    tracing::debug!("Configuration: {:?}", config);

    let pipeline = match StackPipeline::new(LocalStorage::new(), config) {
        Ok(pipeline) => pipeline,
        Err(e) => exit_with(&e),
    };
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!(
                "GlusterFS volume automation complete: {} of {} file(s) written",
                summary.written.len(),
                summary.discovered
            );
            println!("Processing complete. Logs saved to {}", log_path.display());
        }
        Err(e) => {
            tracing::error!("❌ Run aborted: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            exit_with(&e);
        }
    }

    Ok(())
}

fn exit_with(e: &StackError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(1);
}
