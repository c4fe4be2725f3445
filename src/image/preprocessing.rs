//! 两套互相独立的预处理流水线。
//!
//! 疾病模型与痤疮模型使用 ImageNet 统计量归一化的 NCHW 张量，
//! 肤质模型使用缩放到 [0,1] 的 NHWC 数组。两者的常量不共享。

use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;

/// 模型输入边长
pub const IMG_SIZE: u32 = 224;

/// 训练时使用的通道均值
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// 训练时使用的通道标准差
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 两种模型输入
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// `[1, 3, 224, 224]`，ImageNet 归一化
    pub normalized: Array4<f32>,
    /// `[1, 224, 224, 3]`，像素值 / 255
    pub scaled: Array4<f32>,
}

/// 解码后图像 -> RGB -> 224x224 -> 两种张量
pub fn prepare(image: &DynamicImage) -> PreparedImage {
    let resized = resize_exact(&image.to_rgb8());

    PreparedImage {
        normalized: normalized_tensor(&resized),
        scaled: scaled_array(&resized),
    }
}

/// 强制缩放到 224x224，不保持宽高比
pub fn resize_exact(image: &RgbImage) -> RgbImage {
    if image.dimensions() == (IMG_SIZE, IMG_SIZE) {
        return image.clone();
    }

    image::imageops::resize(image, IMG_SIZE, IMG_SIZE, FilterType::CatmullRom)
}

/// NCHW，`(x / 255 - mean[c]) / std[c]`
pub fn normalized_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    tensor
}

/// NHWC，`x / 255`
pub fn scaled_array(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array4::<f32>::zeros((1, height as usize, width as usize, 3));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            array[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
        }
    }

    array
}
