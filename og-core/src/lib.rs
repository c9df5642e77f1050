//! # OG Studio Core
//!
//! Editor logic for Open Graph image templates on a fixed 1200×630 canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Editor                    │
//! ├─────────────────────────────────────────────┤
//! │  Templates       │  Runtime state           │
//! │  - Elements      │  - Current / selected    │
//! │  - Variables     │  - Variable values, zoom │
//! ├─────────────────────────────────────────────┤
//! │  Fonts           │  Persistence / Exchange  │
//! │  - Registry      │  - Storage snapshots     │
//! │  - FontLoader    │  - JSON import/export    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Rendering is split in two: [`render`] maps elements to backend-neutral
//! visuals here, and the `og-renderer` crate rasterizes them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod editor;
pub mod element;
pub mod error;
pub mod exchange;
pub mod fonts;
pub mod grid;
pub mod persist;
pub mod render;
pub mod template;
pub mod variables;

pub use editor::{Direction, Editor};
pub use element::{
    BadgeContent, ContainerContent, Element, ElementContent, ElementId, ElementKind,
    ElementPatch, ImageContent, ObjectFit, Position, Size, TextAlign, TextContent,
};
pub use error::{EditorError, EditorResult, FontError, ImportError, StorageError};
pub use exchange::{export_file_name, parse_template_json, template_to_json, ImportedTemplate};
pub use fonts::{
    Font, FontLoadOutcome, FontLoader, FontRegistry, FontRequest, FontSource, LoadedFont,
    DEFAULT_WEIGHTS,
};
pub use grid::GridSettings;
pub use persist::{FileStorage, MemoryStorage, PersistedState, Storage};
pub use render::{render_element, render_template, PlacedVisual, Visual};
pub use template::{
    resolve_background, Template, TemplateId, TemplatePatch, Variable, VariablePatch,
    BACKGROUND_PRESETS, CANVAS_HEIGHT, CANVAS_WIDTH,
};
pub use variables::{
    interpolate, lint_placeholders, StalePlaceholder, ValueSource, VariableScope,
};

/// OG Studio core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
