use crate::utils::error::AnalysisError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str, max_bytes: usize) -> Result<DynamicImage> {
        let trimmed = base64_data.trim();

        // 检测并移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = if trimmed.starts_with("data:") {
            trimmed.split_once(',').map(|(_, data)| data).unwrap_or(trimmed)
        } else {
            trimmed
        };

        // 按行折断的base64（MIME每76列换行）中间带有空白
        let base64_clean: String = base64_clean
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if base64_clean.is_empty() {
            return Err(AnalysisError::EmptyPayload);
        }

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(&base64_clean)?;

        Self::from_bytes(&image_bytes, max_bytes)
    }

    /// 从字节加载图像，格式由内容推断
    pub fn from_bytes(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(AnalysisError::EmptyPayload);
        }

        if bytes.len() > max_bytes {
            return Err(AnalysisError::PayloadTooLarge(format!(
                "{} bytes, max allowed: {} bytes",
                bytes.len(),
                max_bytes
            )));
        }

        tracing::debug!(
            "Decoding image: {} bytes, format={:?}",
            bytes.len(),
            Self::detect_format(bytes)
        );

        let image = image::load_from_memory(bytes)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 转换为RGB，丢弃alpha通道与调色板
    pub fn to_rgb(image: &DynamicImage) -> RgbImage {
        image.to_rgb8()
    }
}
