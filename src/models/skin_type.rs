use crate::analysis::types::{LabeledScores, SkinTypePrediction};
use crate::models::backend::{flatten_output, InferenceModel};
use crate::Result;
use ndarray::Array4;
use std::sync::Arc;

pub const SKIN_TYPES: &[&str] = &["dry", "normal", "oily"];

/// 肤质分类器，输入为 [0,1] 缩放的 NHWC 数组
pub struct SkinTypePredictor {
    model: Arc<dyn InferenceModel>,
}

impl SkinTypePredictor {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn InferenceModel {
        self.model.as_ref()
    }

    /// 概率和不做强制校验
    pub fn predict(&self, input: &Array4<f32>) -> Result<SkinTypePrediction> {
        let output = self.model.run(input.clone())?;
        let probabilities = flatten_output(self.model.name(), &output, SKIN_TYPES.len())?;

        LabeledScores::new(SKIN_TYPES, probabilities)
    }
}
