use crate::image::IMG_SIZE;
use crate::models::backend::{InferenceModel, InputLayout, OnnxModel};
use crate::models::{AcnePredictor, DiseasePredictor, SkinTypePredictor};
use crate::utils::error::AnalysisError;
use crate::{Config, Result};
use ndarray::Array4;
use std::sync::Arc;

/// 启动时加载一次的三个模型，之后只读共享
pub struct ModelSet {
    disease: DiseasePredictor,
    acne: AcnePredictor,
    skin_type: SkinTypePredictor,
}

impl ModelSet {
    /// 从模型目录加载全部模型，任何一个失败都返回错误
    pub fn load(config: &Config) -> Result<Self> {
        tracing::info!("Initializing models...");
        tracing::info!("Using device: {}", execution_device());

        let onnx = &config.onnx_config;
        let disease = OnnxModel::load("disease", &config.disease_model_path(), InputLayout::Nchw, onnx)?;
        tracing::info!("Disease model loaded.");

        let acne = OnnxModel::load("acne", &config.acne_model_path(), InputLayout::Nchw, onnx)?;
        tracing::info!("Acne model loaded.");

        let skin_type = OnnxModel::load(
            "skin_type",
            &config.skin_type_model_path(),
            InputLayout::Nhwc,
            onnx,
        )?;
        tracing::info!("Skin type model loaded.");

        Self::from_models(Arc::new(disease), Arc::new(acne), Arc::new(skin_type))
    }

    /// 由任意推理后端组装，并用零输入做一次预热校验
    pub fn from_models(
        disease: Arc<dyn InferenceModel>,
        acne: Arc<dyn InferenceModel>,
        skin_type: Arc<dyn InferenceModel>,
    ) -> Result<Self> {
        expect_layout(disease.as_ref(), InputLayout::Nchw)?;
        expect_layout(acne.as_ref(), InputLayout::Nchw)?;
        expect_layout(skin_type.as_ref(), InputLayout::Nhwc)?;

        let models = Self {
            disease: DiseasePredictor::new(disease),
            acne: AcnePredictor::new(acne),
            skin_type: SkinTypePredictor::new(skin_type),
        };
        models.warm_up()?;

        tracing::info!("Models initialized successfully");
        Ok(models)
    }

    /// 输出形状不符的模型在这里被拒绝，而不是在第一个请求上
    fn warm_up(&self) -> Result<()> {
        let size = IMG_SIZE as usize;
        let nchw = Array4::<f32>::zeros(InputLayout::Nchw.input_shape(size));
        let nhwc = Array4::<f32>::zeros(InputLayout::Nhwc.input_shape(size));

        self.disease.predict(&nchw).map_err(warm_up_error("disease"))?;
        self.acne.predict(&nchw).map_err(warm_up_error("acne"))?;
        self.skin_type.predict(&nhwc).map_err(warm_up_error("skin_type"))?;

        tracing::debug!("Model warm-up passed");
        Ok(())
    }

    pub fn disease(&self) -> &DiseasePredictor {
        &self.disease
    }

    pub fn acne(&self) -> &AcnePredictor {
        &self.acne
    }

    pub fn skin_type(&self) -> &SkinTypePredictor {
        &self.skin_type
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            device: execution_device(),
            models: vec![
                ModelInfo::of(self.disease.model()),
                ModelInfo::of(self.acne.model()),
                ModelInfo::of(self.skin_type.model()),
            ],
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone)]
pub struct ModelStats {
    pub device: &'static str,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub input_layout: InputLayout,
}

impl ModelInfo {
    fn of(model: &dyn InferenceModel) -> Self {
        Self {
            name: model.name().to_string(),
            input_layout: model.input_layout(),
        }
    }
}

fn expect_layout(model: &dyn InferenceModel, expected: InputLayout) -> Result<()> {
    if model.input_layout() != expected {
        return Err(AnalysisError::ModelLoad(format!(
            "{} model expects {:?} input, pipeline provides {:?}",
            model.name(),
            model.input_layout(),
            expected
        )));
    }
    Ok(())
}

fn warm_up_error(name: &'static str) -> impl Fn(AnalysisError) -> AnalysisError {
    move |e| AnalysisError::ModelLoad(format!("{} model failed warm-up: {}", name, e))
}

fn execution_device() -> &'static str {
    if cfg!(feature = "cuda") {
        "cuda (cpu fallback)"
    } else {
        "cpu"
    }
}
