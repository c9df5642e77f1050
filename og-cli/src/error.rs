//! CLI error type.

use og_core::{EditorError, FontError, ImportError, StorageError};
use og_renderer::RenderError;
use thiserror::Error;

/// Errors surfaced by studio commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// An editor command was rejected.
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// A template file could not be imported.
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Export rendering failed.
    #[error("Export failed: {0}")]
    Render(#[from] RenderError),

    /// A font could not be fetched.
    #[error("Font loading failed: {0}")]
    Font(#[from] FontError),

    /// Some fonts could not be reloaded.
    #[error("{0} font(s) failed to load")]
    FontsFailed(usize),

    /// The data directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// An element patch is not valid JSON for a patch.
    #[error("Invalid element patch: {0}")]
    InvalidPatch(#[source] serde_json::Error),

    /// A template could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading input or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
