use crate::utils::error::AnalysisError;
use crate::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// 固定标签集合上的分数，按标签顺序序列化为 JSON 对象
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledScores {
    labels: &'static [&'static str],
    scores: Vec<f32>,
}

impl LabeledScores {
    pub fn new(labels: &'static [&'static str], scores: Vec<f32>) -> Result<Self> {
        if labels.len() != scores.len() {
            return Err(AnalysisError::Inference(format!(
                "Expected {} scores for labels {:?}, got {}",
                labels.len(),
                labels,
                scores.len()
            )));
        }

        Ok(Self { labels, scores })
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.labels
            .iter()
            .position(|l| *l == label)
            .map(|i| self.scores[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.labels.iter().copied().zip(self.scores.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// 分数最高的标签
    pub fn top(&self) -> Option<(&'static str, f32)> {
        self.iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl Serialize for LabeledScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scores.len()))?;
        for (label, score) in self.iter() {
            map.serialize_entry(label, &score)?;
        }
        map.end()
    }
}

/// 每种疾病一个独立概率（多标签）
pub type DiseasePrediction = LabeledScores;

/// 三种肤质上的概率分布
pub type SkinTypePrediction = LabeledScores;

/// 痤疮严重程度，[0,1]
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct AcnePrediction(pub f32);

/// 接口返回的预测结果
#[derive(Debug, Clone, serde::Serialize)]
pub struct Predictions {
    pub disease: DiseasePrediction,
    pub acne: AcnePrediction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<SkinTypePrediction>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PredictResponse {
    pub predictions: Predictions,
}

/// 肤质推理的调度方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SkinTypeMode {
    /// 与疾病、痤疮推理并发执行，响应前汇合
    #[default]
    Joined,
    /// 响应组装完成后在后台执行，结果只写日志
    Detached,
}
