//! # OG Studio Renderer
//!
//! Turns templates into shareable images.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────┐   ┌──────────────┐
//! │ Template │──▶│ PlacedVisual │──▶│   SVG   │──▶│ PNG (resvg)  │
//! └──────────┘   └──────────────┘   └─────────┘   └──────────────┘
//!   og-core        og_core::render    export.rs     feature "png"
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod css;
pub mod error;
pub mod export;
pub mod image;

pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, TemplateRasterizer, DEFAULT_PIXEL_RATIO};

/// OG Studio renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
