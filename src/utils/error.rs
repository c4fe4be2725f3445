use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Empty image payload")]
    EmptyPayload,

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// 请求路径上的错误一律返回500；ModelLoad只在启动阶段出现
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AnalysisError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            AnalysisError::InvalidInput(_) => "INVALID_INPUT",
            AnalysisError::EmptyPayload => "EMPTY_PAYLOAD",
            AnalysisError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AnalysisError::Base64(_) => "BASE64_DECODE_ERROR",
            AnalysisError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            AnalysisError::Inference(_) => "INFERENCE_ERROR",
            AnalysisError::Ort(_) => "INFERENCE_ERROR",
            AnalysisError::Config(_) => "CONFIG_ERROR",
            AnalysisError::Io(_) => "IO_ERROR",
            AnalysisError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回给客户端的通用描述，不包含底层错误文本
    pub fn public_message(&self) -> &'static str {
        match self {
            AnalysisError::ModelLoad(_) => "Models are not available",
            AnalysisError::InvalidInput(_) => "Request is missing a valid image_base64 parameter",
            AnalysisError::EmptyPayload => "Image payload is empty",
            AnalysisError::PayloadTooLarge(_) => "Image payload is too large",
            AnalysisError::Base64(_) => "Image is not valid base64",
            AnalysisError::ImageDecode(_) => "Image could not be decoded",
            AnalysisError::Inference(_) | AnalysisError::Ort(_) => "Prediction failed",
            _ => "Internal server error",
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 完整错误只写日志
        tracing::error!("Request failed: {} ({})", self, status);

        let body = serde_json::json!({
            "detail": self.public_message(),
            "code": self.error_code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
