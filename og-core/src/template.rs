//! Templates: a background, an ordered list of elements and the variables they reference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Element;

/// Width of every OG image, in pixels.
pub const CANVAS_WIDTH: f32 = 1200.0;

/// Height of every OG image, in pixels.
pub const CANVAS_HEIGHT: f32 = 630.0;

/// Background given to new templates.
pub const DEFAULT_BACKGROUND: &str = "linear-gradient(135deg, hsl(0 0% 0%), hsl(0 0% 7%))";

/// Named canvas backgrounds offered by the editor.
pub const BACKGROUND_PRESETS: [(&str, &str); 6] = [
    ("Dark", DEFAULT_BACKGROUND),
    ("Light", "linear-gradient(135deg, #f5f5f5, #e0e0e0)"),
    ("Blue", "linear-gradient(135deg, #1e3a5f, #0d1b2a)"),
    ("Purple", "linear-gradient(135deg, #2d1b4e, #1a0f2e)"),
    ("Green", "linear-gradient(135deg, #1b4332, #0d2818)"),
    ("Orange", "linear-gradient(135deg, #5c3d2e, #2d1e17)"),
];

/// Resolve a preset name (case-insensitive) to its CSS value. Anything else is
/// returned unchanged as a raw CSS background.
#[must_use]
pub fn resolve_background(input: &str) -> &str {
    BACKGROUND_PRESETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(input.trim()))
        .map_or(input, |(_, css)| css)
}

/// Unique identifier for a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(Uuid);

impl TemplateId {
    /// Create a new unique template ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A named placeholder, referenced from text as `{{key}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Key used inside `{{...}}`. Unique within a template.
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// Value used when no runtime override is set.
    pub default_value: String,
    /// Optional help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Variable {
    /// Create a variable whose label is its key.
    #[must_use]
    pub fn new(key: impl Into<String>, default_value: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            default_value: default_value.into(),
            description: None,
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Sparse update for a variable. Only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablePatch {
    /// New label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// New default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VariablePatch {
    pub(crate) fn apply(&self, variable: &mut Variable) {
        if let Some(ref label) = self.label {
            variable.label.clone_from(label);
        }
        if let Some(ref default_value) = self.default_value {
            variable.default_value.clone_from(default_value);
        }
        if let Some(ref description) = self.description {
            variable.description = Some(description.clone());
        }
    }
}

/// A saved OG-image composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique identifier.
    pub id: TemplateId,
    /// Display name, also used for export file names.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Time of the last mutation.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Elements in draw order; the last one is on top.
    pub elements: Vec<Element>,
    /// CSS background value.
    pub canvas_background: String,
    /// Variable definitions, unique by key.
    pub variables: Vec<Variable>,
}

impl Template {
    /// Create an empty template stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: TemplateId::new(),
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
            elements: Vec::new(),
            canvas_background: DEFAULT_BACKGROUND.to_string(),
            variables: Vec::new(),
        }
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Deep copy with fresh template and element ids and fresh timestamps.
    #[must_use]
    pub fn rekeyed(&self) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: TemplateId::new(),
            created_at: now,
            updated_at: now,
            elements: self.elements.iter().map(Element::rekeyed).collect(),
            ..self.clone()
        }
    }

    /// Look up an element by id.
    #[must_use]
    pub fn element(&self, id: crate::ElementId) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    /// Index of an element in draw order.
    #[must_use]
    pub fn element_index(&self, id: crate::ElementId) -> Option<usize> {
        self.elements.iter().position(|el| el.id == id)
    }

    /// Look up a variable definition by key.
    #[must_use]
    pub fn variable(&self, key: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.key == key)
    }
}

/// Sparse update for template metadata. Only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New CSS background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_background: Option<String>,
}

impl TemplatePatch {
    pub(crate) fn apply(&self, template: &mut Template) {
        if let Some(ref name) = self.name {
            template.name.clone_from(name);
        }
        if let Some(ref description) = self.description {
            template.description.clone_from(description);
        }
        if let Some(ref background) = self.canvas_background {
            template.canvas_background.clone_from(background);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementKind;

    #[test]
    fn test_new_template_defaults() {
        let template = Template::new("Launch", "");
        assert_eq!(template.canvas_background, DEFAULT_BACKGROUND);
        assert!(template.elements.is_empty());
        assert_eq!(template.created_at, template.updated_at);
    }

    #[test]
    fn test_rekeyed_replaces_every_id() {
        let mut template = Template::new("Launch", "");
        template
            .elements
            .push(Element::with_default_content(ElementKind::Text));
        template
            .elements
            .push(Element::with_default_content(ElementKind::Badge));

        let copy = template.rekeyed();
        assert_ne!(copy.id, template.id);
        assert_eq!(copy.elements.len(), 2);
        for (a, b) in copy.elements.iter().zip(&template.elements) {
            assert_ne!(a.id, b.id);
            assert_eq!(a.content, b.content);
        }
    }

    #[test]
    fn test_json_field_names() {
        let template = Template::new("Launch", "Blog header");
        let value = serde_json::to_value(&template).expect("serialize");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("canvasBackground").is_some());
        let back: Template = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, template);
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut template = Template::new("Launch", "keep me");
        TemplatePatch {
            name: Some("Renamed".into()),
            ..Default::default()
        }
        .apply(&mut template);
        assert_eq!(template.name, "Renamed");
        assert_eq!(template.description, "keep me");
    }

    #[test]
    fn test_resolve_background() {
        assert_eq!(resolve_background("dark"), DEFAULT_BACKGROUND);
        assert_eq!(
            resolve_background("Blue"),
            "linear-gradient(135deg, #1e3a5f, #0d1b2a)"
        );
        assert_eq!(resolve_background("#123"), "#123");
    }
}
