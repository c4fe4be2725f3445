use crate::analysis::PredictResponse;
use crate::web::extractors::ImagePayload;
use crate::web::AppState;
use crate::Result;
use axum::{extract::State, response::Json};

/// POST /predict
pub async fn predict_handler(
    State(state): State<AppState>,
    ImagePayload(image_base64): ImagePayload,
) -> Result<Json<PredictResponse>> {
    tracing::info!(
        "Processing prediction request: payload={} chars, skin_type_mode={:?}",
        image_base64.len(),
        state.pipeline.skin_type_mode()
    );

    let predictions = state.pipeline.analyze_base64(image_base64).await?;

    Ok(Json(PredictResponse { predictions }))
}
