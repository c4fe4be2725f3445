pub mod analysis;
pub mod config;
pub mod image;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use analysis::{AnalysisPipeline, Predictions, SkinTypeMode};
pub use config::Config;
pub use models::ModelSet;
pub use utils::error::AnalysisError;

pub type Result<T> = std::result::Result<T, AnalysisError>;
