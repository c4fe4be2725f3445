pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::analysis::AnalysisPipeline;
use crate::config::ServerConfig;
use crate::models::ModelSet;
use crate::utils::error::AnalysisError;
use crate::{Config, Result};
use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// 处理器共享的应用上下文，启动时构建一次
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnalysisPipeline,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline) -> Self {
        Self { pipeline }
    }
}

pub async fn serve(config: Config, models: Arc<ModelSet>) -> Result<()> {
    let addr = config.socket_addr()?;

    let stats = models.stats();
    tracing::info!("Execution device: {}", stats.device);
    for model in &stats.models {
        tracing::info!("Model ready: {} ({:?} input)", model.name, model.input_layout);
    }

    let pipeline = AnalysisPipeline::new(models, config.analysis_config.clone());
    let app = create_app(AppState::new(pipeline), &config.server_config);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict   - base64 image (query image_base64 or JSON body)");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AnalysisError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AnalysisError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState, server_config: &ServerConfig) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict_handler))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        // 超限由提取器转换为 PAYLOAD_TOO_LARGE
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        // 任意来源、方法、请求头，允许携带凭据
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
