pub mod pipeline;
pub mod types;

pub use pipeline::AnalysisPipeline;
pub use types::{
    AcnePrediction, DiseasePrediction, LabeledScores, PredictResponse, Predictions, SkinTypeMode,
    SkinTypePrediction,
};
