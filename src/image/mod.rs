pub mod loader;
pub mod preprocessing;

pub use loader::ImageLoader;
pub use preprocessing::{prepare, PreparedImage, IMAGENET_MEAN, IMAGENET_STD, IMG_SIZE};
