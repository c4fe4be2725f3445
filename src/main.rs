use anyhow::{Context, Result};
use clap::Parser;
use skin_analysis::{config::Config, web::serve, ModelSet, SkinTypeMode};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skin-analysis")]
#[command(about = "Facial skin analysis inference service")]
struct Args {
    /// Server bind address
    #[arg(long, env = "SKIN_BIND", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Directory holding disease.onnx, acne.onnx and skin_type.onnx
    #[arg(long, env = "SKIN_MODELS_DIR", default_value = "final_models")]
    models_dir: String,

    /// ONNX Runtime intra-op threads (defaults to 75% of CPU cores)
    #[arg(long)]
    intra_threads: Option<usize>,

    /// How skin type inference is scheduled relative to the response
    #[arg(long, value_enum, default_value_t = SkinTypeMode::Joined)]
    skin_type_mode: SkinTypeMode,

    /// Maximum request body size in MiB
    #[arg(long, default_value_t = 20)]
    max_request_mb: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting skin analysis service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Models directory: {}", args.models_dir);

    let config = Config::new(
        args.bind,
        args.models_dir,
        args.intra_threads,
        args.skin_type_mode,
        args.max_request_mb,
    )?;

    // 模型加载失败则不启动服务
    let models = match ModelSet::load(&config) {
        Ok(models) => Arc::new(models),
        Err(e) => {
            tracing::error!("Error loading models: {}", e);
            return Err(e).context("Failed to load models");
        }
    };

    serve(config, models).await?;

    Ok(())
}
