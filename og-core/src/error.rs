//! Error types for editor operations.

use thiserror::Error;

use crate::element::ElementKind;
use crate::{ElementId, TemplateId};

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Template not found in the store.
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),

    /// Element not found in the current template.
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    /// An element operation was issued with no current template.
    #[error("No template selected")]
    NoTemplateSelected,

    /// Replacement content would change the element's kind.
    #[error("Content kind {content} does not match element kind {element}")]
    ContentKindMismatch {
        /// Kind of the element being updated.
        element: ElementKind,
        /// Kind of the offered content.
        content: ElementKind,
    },

    /// A numeric edit was NaN or infinite.
    #[error("Element {element}: {field} must be a finite number")]
    NonFiniteValue {
        /// Element being edited.
        element: ElementId,
        /// Wire name of the offending field.
        field: &'static str,
    },

    /// A variable with this key already exists in the template.
    #[error("Duplicate variable key: {0}")]
    DuplicateVariable(String),

    /// Variable key is not made of word characters.
    #[error("Invalid variable key: {0:?}")]
    InvalidVariableKey(String),

    /// Variable not found in the current template.
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// Persisted state could not be read.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised by a [`crate::persist::Storage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while validating an imported template document.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Input is not well-formed JSON.
    #[error("Malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Root of the document is not a JSON object.
    #[error("Template document must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A field is missing or has the wrong shape.
    #[error("Invalid template at {path}: {message}")]
    Schema {
        /// Dotted path of the offending field.
        path: String,
        /// Parser message.
        message: String,
    },

    /// An element declares one kind but carries content of another.
    #[error("Element {index} declares type {declared} but has {content} content")]
    KindMismatch {
        /// Position of the element in the template.
        index: usize,
        /// The element's declared `type`.
        declared: ElementKind,
        /// The `content.type` actually present.
        content: ElementKind,
    },

    /// Two variables share a key.
    #[error("Duplicate variable key: {0}")]
    DuplicateVariable(String),

    /// Variable key is not made of word characters.
    #[error("Invalid variable key: {0:?}")]
    InvalidVariableKey(String),
}

/// Errors raised by a [`crate::fonts::FontLoader`].
#[derive(Debug, Error)]
pub enum FontError {
    /// Transport failure while fetching the stylesheet or a face.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status.
    #[error("Font request for {family} failed with status {status}")]
    Status {
        /// Requested family.
        family: String,
        /// HTTP status code.
        status: u16,
    },

    /// Stylesheet was fetched but declared no font faces.
    #[error("No font faces found for {0}")]
    NoFaces(String),

    /// Downloaded faces could not be stored.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
