use crate::analysis::SkinTypeMode;
use crate::utils::error::AnalysisError;
use crate::Result;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 分析流程配置
    pub analysis_config: AnalysisConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub skin_type_mode: SkinTypeMode,

    /// 解码后图像的最大字节数
    pub max_image_bytes: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        intra_threads: Option<usize>,
        skin_type_mode: SkinTypeMode,
        max_request_mb: usize,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: intra_threads.unwrap_or((cpu_cores * 3 / 4).max(1)),
            optimization_level: 3,
        };

        let max_request_size = max_request_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            AnalysisError::Config(format!(
                "Maximum request size of {} MiB overflows usize",
                max_request_mb
            ))
        })?;
        let server_config = ServerConfig { max_request_size };

        // 解码后的图像上限与请求体上限一致
        let analysis_config = AnalysisConfig {
            skin_type_mode,
            max_image_bytes: max_request_size,
        };

        let config = Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            onnx_config,
            server_config,
            analysis_config,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.server_config.max_request_size == 0 {
            return Err(AnalysisError::Config(
                "Maximum request size must be greater than zero".to_string(),
            ));
        }
        if self.onnx_config.intra_threads == 0 {
            return Err(AnalysisError::Config(
                "Intra-op thread count must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            AnalysisError::Config(format!("Invalid bind address {}: {}", self.bind_addr, e))
        })
    }

    /// 获取疾病模型路径
    pub fn disease_model_path(&self) -> PathBuf {
        self.models_dir.join("disease.onnx")
    }

    /// 获取痤疮模型路径
    pub fn acne_model_path(&self) -> PathBuf {
        self.models_dir.join("acne.onnx")
    }

    /// 获取肤质模型路径
    pub fn skin_type_model_path(&self) -> PathBuf {
        self.models_dir.join("skin_type.onnx")
    }
}
