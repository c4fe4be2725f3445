use crate::analysis::types::{DiseasePrediction, LabeledScores};
use crate::models::backend::{flatten_output, InferenceModel};
use crate::Result;
use ndarray::Array4;
use std::sync::Arc;

/// 疾病标签，顺序与模型输出头一致
pub const DISEASES: &[&str] = &["eczema", "seborrheic_keratosis"];

/// 共享骨干网络 + 每种疾病一个 sigmoid 头
pub struct DiseasePredictor {
    model: Arc<dyn InferenceModel>,
}

impl DiseasePredictor {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn InferenceModel {
        self.model.as_ref()
    }

    /// 输入为 ImageNet 归一化的 NCHW 张量
    pub fn predict(&self, input: &Array4<f32>) -> Result<DiseasePrediction> {
        let output = self.model.run(input.clone())?;
        let probabilities = flatten_output(self.model.name(), &output, DISEASES.len())?
            .into_iter()
            .map(|p| p.clamp(0.0, 1.0))
            .collect();

        LabeledScores::new(DISEASES, probabilities)
    }
}
