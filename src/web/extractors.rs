use crate::utils::error::AnalysisError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Query, Request},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

/// 查询参数形式（原始接口的传输方式）
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub image_base64: Option<String>,
}

/// JSON请求体形式
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Base64编码的图像数据
    #[serde(alias = "image")]
    pub image_base64: String,
}

/// 验证trait
pub trait Validate {
    fn validate(&self) -> Result<(), AnalysisError>;
}

impl Validate for PredictRequest {
    fn validate(&self) -> Result<(), AnalysisError> {
        if self.image_base64.trim().is_empty() {
            return Err(AnalysisError::EmptyPayload);
        }
        Ok(())
    }
}

/// 从查询参数或JSON请求体中取出base64图像，查询参数优先
pub struct ImagePayload(pub String);

#[async_trait]
impl<S> FromRequest<S> for ImagePayload
where
    S: Send + Sync,
{
    type Rejection = AnalysisError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PredictQuery>::try_from_uri(req.uri())
            .map_err(|err| AnalysisError::InvalidInput(err.body_text()))?;

        let request = match query.image_base64 {
            Some(image_base64) => PredictRequest { image_base64 },
            None => {
                let Json(body) = Json::<PredictRequest>::from_request(req, state)
                    .await
                    .map_err(json_rejection)?;
                body
            }
        };

        request.validate()?;

        Ok(ImagePayload(request.image_base64))
    }
}

fn json_rejection(err: JsonRejection) -> AnalysisError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AnalysisError::PayloadTooLarge(err.body_text())
    } else {
        AnalysisError::InvalidInput(err.body_text())
    }
}
