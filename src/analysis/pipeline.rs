use crate::analysis::types::{
    AcnePrediction, DiseasePrediction, Predictions, SkinTypeMode, SkinTypePrediction,
};
use crate::config::AnalysisConfig;
use crate::image::{prepare, ImageLoader, PreparedImage};
use crate::models::ModelSet;
use crate::utils::error::AnalysisError;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// 单次请求的分析流水线：解码 -> 预处理 -> 疾病 -> 痤疮 -> 肤质
#[derive(Clone)]
pub struct AnalysisPipeline {
    models: Arc<ModelSet>,
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(models: Arc<ModelSet>, config: AnalysisConfig) -> Self {
        Self { models, config }
    }

    pub fn models(&self) -> &Arc<ModelSet> {
        &self.models
    }

    pub fn skin_type_mode(&self) -> SkinTypeMode {
        self.config.skin_type_mode
    }

    /// 处理base64图像
    pub async fn analyze_base64(&self, base64_data: String) -> Result<Predictions> {
        let start_time = Instant::now();
        let max_bytes = self.config.max_image_bytes;

        let prepared = tokio::task::spawn_blocking(move || -> Result<PreparedImage> {
            tracing::info!("Decoding image...");
            let image = ImageLoader::from_base64(&base64_data, max_bytes)?;

            tracing::info!("Preprocessing image...");
            Ok(prepare(&image))
        })
        .await
        .map_err(join_error)??;
        let prepared = Arc::new(prepared);

        let predictions = match self.config.skin_type_mode {
            SkinTypeMode::Joined => {
                let (core, skin_type) = tokio::join!(
                    self.spawn_core(Arc::clone(&prepared)),
                    self.spawn_skin_type(Arc::clone(&prepared)),
                );
                let (disease, acne) = core.map_err(join_error)??;

                let skin_type = match skin_type.map_err(join_error) {
                    Ok(Ok(prediction)) => Some(prediction),
                    Ok(Err(e)) | Err(e) => {
                        tracing::warn!("Skin type prediction omitted: {}", e);
                        None
                    }
                };

                Predictions { disease, acne, skin_type }
            }
            SkinTypeMode::Detached => {
                let (disease, acne) = self
                    .spawn_core(Arc::clone(&prepared))
                    .await
                    .map_err(join_error)??;

                let predictions = Predictions {
                    disease,
                    acne,
                    skin_type: None,
                };
                self.schedule_detached_skin_type(prepared);

                predictions
            }
        };

        tracing::info!(
            "Prediction completed in {:.2} seconds.",
            start_time.elapsed().as_secs_f32()
        );

        Ok(predictions)
    }

    /// 疾病与痤疮推理，同一张归一化张量
    pub fn predict_core(
        models: &ModelSet,
        prepared: &PreparedImage,
    ) -> Result<(DiseasePrediction, AcnePrediction)> {
        tracing::info!("Predicting disease...");
        let disease = models.disease().predict(&prepared.normalized)?;

        tracing::info!("Predicting acne severity...");
        let acne = models.acne().predict(&prepared.normalized)?;

        Ok((disease, acne))
    }

    pub fn predict_skin_type(
        models: &ModelSet,
        prepared: &PreparedImage,
    ) -> Result<SkinTypePrediction> {
        tracing::info!("Predicting skin type...");
        models.skin_type().predict(&prepared.scaled)
    }

    fn spawn_core(
        &self,
        prepared: Arc<PreparedImage>,
    ) -> JoinHandle<Result<(DiseasePrediction, AcnePrediction)>> {
        let models = Arc::clone(&self.models);
        tokio::task::spawn_blocking(move || Self::predict_core(&models, &prepared))
    }

    fn spawn_skin_type(&self, prepared: Arc<PreparedImage>) -> JoinHandle<Result<SkinTypePrediction>> {
        let models = Arc::clone(&self.models);
        tokio::task::spawn_blocking(move || Self::predict_skin_type(&models, &prepared))
    }

    /// 后台执行，结果不会回到调用方
    fn schedule_detached_skin_type(&self, prepared: Arc<PreparedImage>) {
        let task = self.spawn_skin_type(prepared);

        tokio::spawn(async move {
            match task.await.map_err(join_error) {
                Ok(Ok(prediction)) => match prediction.top() {
                    Some((label, probability)) => tracing::info!(
                        "Detached skin type prediction: {} ({:.3})",
                        label,
                        probability
                    ),
                    None => tracing::info!("Detached skin type prediction is empty"),
                },
                Ok(Err(e)) | Err(e) => {
                    tracing::error!("Detached skin type prediction failed: {}", e)
                }
            }
        });
    }
}

fn join_error(err: tokio::task::JoinError) -> AnalysisError {
    AnalysisError::Internal(format!("Inference task failed: {}", err))
}
