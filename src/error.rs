use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("SVG error: {0}")]
    Svg(#[from] resvg::usvg::Error),
}

pub type Result<T> = std::result::Result<T, BrandError>;
