use crate::analysis::types::AcnePrediction;
use crate::models::backend::{flatten_output, InferenceModel};
use crate::Result;
use ndarray::Array4;
use std::sync::Arc;

/// 骨干网络 + 单个回归头，输出严重程度
pub struct AcnePredictor {
    model: Arc<dyn InferenceModel>,
}

impl AcnePredictor {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn InferenceModel {
        self.model.as_ref()
    }

    pub fn predict(&self, input: &Array4<f32>) -> Result<AcnePrediction> {
        let output = self.model.run(input.clone())?;
        let values = flatten_output(self.model.name(), &output, 1)?;

        Ok(AcnePrediction(values[0].clamp(0.0, 1.0)))
    }
}
