use crate::model::Region;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Invalid atlas dimensions: {width}x{height} with depth {depth}")]
    InvalidDimension { width: u32, height: u32, depth: u32 },
    #[error(
        "Region ({}, {}) {}x{} lies outside the {width}x{height} canvas",
        .region.x, .region.y, .region.width, .region.height
    )]
    OutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Texture atlas used after release")]
    UseAfterRelease,
    #[error("Unsupported pixel depth for image conversion: {0}")]
    UnsupportedDepth(u32),
    #[error("Texture upload failed: {0}")]
    Upload(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
