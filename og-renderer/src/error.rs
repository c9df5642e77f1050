//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The generated SVG could not be parsed.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Rasterization failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(String),

    /// An image source could not be decoded.
    #[error("Failed to load image {src}: {message}")]
    Image {
        /// The element's `src`, truncated for data URIs.
        src: String,
        /// What went wrong.
        message: String,
    },

    /// An image file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
