use crate::config::OnnxConfig;
use crate::utils::error::AnalysisError;
use crate::Result;
use ndarray::{Array4, ArrayD};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 模型期望的输入布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// `[N, C, H, W]`
    Nchw,
    /// `[N, H, W, C]`
    Nhwc,
}

impl InputLayout {
    /// 单张 224x224 RGB 图像对应的输入形状
    pub fn input_shape(self, size: usize) -> (usize, usize, usize, usize) {
        match self {
            InputLayout::Nchw => (1, 3, size, size),
            InputLayout::Nhwc => (1, size, size, 3),
        }
    }
}

/// 推理后端。实现必须是只读的：同一输入总是得到同一输出。
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    fn input_layout(&self) -> InputLayout;

    fn run(&self, input: Array4<f32>) -> Result<ArrayD<f32>>;
}

/// 基于 ONNX Runtime 的推理后端
pub struct OnnxModel {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    layout: InputLayout,
}

impl OnnxModel {
    pub fn load(
        name: &str,
        model_path: &Path,
        layout: InputLayout,
        onnx_config: &OnnxConfig,
    ) -> Result<Self> {
        if !model_path.exists() {
            return Err(AnalysisError::ModelLoad(format!(
                "{} model not found: {}",
                name,
                model_path.display()
            )));
        }

        tracing::info!("Loading {} model from: {}", name, model_path.display());

        let builder = Session::builder()
            .map_err(|e| load_error(name, "session setup", e))?
            .with_optimization_level(optimization_level(onnx_config.optimization_level))
            .map_err(|e| load_error(name, "optimization level", e))?
            .with_intra_threads(onnx_config.intra_threads)
            .map_err(|e| load_error(name, "intra threads", e))?;

        #[cfg(feature = "cuda")]
        let builder = builder
            .with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build(),
            ])
            .map_err(|e| load_error(name, "execution provider", e))?;

        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| load_error(name, "weights", e))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(AnalysisError::ModelLoad(format!("{} model has no inputs", name)));
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(AnalysisError::ModelLoad(format!("{} model has no outputs", name)));
            }
        };

        tracing::info!("{} model input: '{}', output: '{}'", name, input_name, output_name);

        // 记录所有可用输出用于调试
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("{} output[{}]: '{}'", name, i, output.name);
        }

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
            layout,
        })
    }
}

impl InferenceModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_layout(&self) -> InputLayout {
        self.layout
    }

    fn run(&self, input: Array4<f32>) -> Result<ArrayD<f32>> {
        let input_tensor = Tensor::from_array(input)?;

        // 立即提取数据避免生命周期冲突
        let prediction = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            let extracted = match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(AnalysisError::Inference(format!(
                        "{} output '{}' not found. Available outputs: {:?}",
                        self.name, self.output_name, available_outputs
                    )));
                }
            };
            extracted
        };

        Ok(prediction)
    }
}

/// 展平模型输出并校验元素个数与有限性
pub(crate) fn flatten_output(model: &str, output: &ArrayD<f32>, expected: usize) -> Result<Vec<f32>> {
    if output.len() != expected {
        return Err(AnalysisError::Inference(format!(
            "{} model produced shape {:?}, expected {} values",
            model,
            output.shape(),
            expected
        )));
    }

    let values: Vec<f32> = output.iter().copied().collect();
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(AnalysisError::Inference(format!(
            "{} model produced a non-finite value: {}",
            model, bad
        )));
    }

    Ok(values)
}

fn load_error(name: &str, stage: &str, err: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::ModelLoad(format!("{} {}: {}", name, stage, err))
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
