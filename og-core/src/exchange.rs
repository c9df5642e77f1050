//! Template JSON export and validated import.
//!
//! Exported files are a single pretty-printed [`Template`]. Imports are checked
//! field by field so a bad file reports where it went wrong; ids and timestamps
//! in the file are ignored because the editor re-keys everything on import.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::element::ElementKind;
use crate::error::ImportError;
use crate::template::DEFAULT_BACKGROUND;
use crate::variables::is_valid_key;
use crate::{Element, ElementId, Template, Variable};

/// File name used when a template has no name.
pub const FALLBACK_FILE_STEM: &str = "og-image";

/// A template document that passed validation, ready to be re-keyed and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTemplate {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Elements in draw order.
    pub elements: Vec<Element>,
    /// CSS background.
    pub canvas_background: String,
    /// Variable definitions.
    pub variables: Vec<Variable>,
}

impl From<Template> for ImportedTemplate {
    fn from(template: Template) -> Self {
        Self {
            name: template.name,
            description: template.description,
            elements: template.elements,
            canvas_background: template.canvas_background,
            variables: template.variables,
        }
    }
}

impl ImportedTemplate {
    /// Turn into a stored template with fresh ids and timestamps.
    #[must_use]
    pub fn into_template(self) -> Template {
        let mut template = Template::new(self.name, self.description);
        template.elements = self.elements.iter().map(Element::rekeyed).collect();
        template.canvas_background = self.canvas_background;
        template.variables = self.variables;
        template
    }
}

/// Parse and validate a template JSON document.
///
/// # Errors
///
/// Returns an [`ImportError`] describing the first problem found.
pub fn parse_template_json(json: &str) -> Result<ImportedTemplate, ImportError> {
    let value: Value = serde_json::from_str(json).map_err(ImportError::Parse)?;
    let root = match value {
        Value::Object(root) => root,
        other => return Err(ImportError::NotAnObject(json_type_name(&other))),
    };

    let name: String = required(&root, "name")?;
    let description: String = optional(&root, "description")?.unwrap_or_default();
    let canvas_background: String =
        optional(&root, "canvasBackground")?.unwrap_or_else(|| DEFAULT_BACKGROUND.to_string());

    let raw_elements: Vec<Value> = required(&root, "elements")?;
    let mut elements = Vec::with_capacity(raw_elements.len());
    for (index, mut raw) in raw_elements.into_iter().enumerate() {
        check_kinds(index, &raw)?;
        // Foreign ids may not be UUIDs; they are replaced on import anyway.
        if let Value::Object(ref mut fields) = raw {
            fields.insert("id".to_string(), Value::String(ElementId::new().to_string()));
        }
        let element: Element = decode(raw, &format!("elements[{index}]"))?;
        if let Some(field) = element.non_finite_field() {
            return Err(ImportError::Schema {
                path: format!("elements[{index}].{field}"),
                message: "number out of range".to_string(),
            });
        }
        elements.push(element);
    }

    let raw_variables: Vec<Value> = optional(&root, "variables")?.unwrap_or_default();
    let mut variables = Vec::with_capacity(raw_variables.len());
    let mut seen = HashSet::new();
    for (index, raw) in raw_variables.into_iter().enumerate() {
        let variable: Variable = decode(raw, &format!("variables[{index}]"))?;
        if !is_valid_key(&variable.key) {
            return Err(ImportError::InvalidVariableKey(variable.key));
        }
        if !seen.insert(variable.key.clone()) {
            return Err(ImportError::DuplicateVariable(variable.key));
        }
        variables.push(variable);
    }

    Ok(ImportedTemplate {
        name,
        description,
        elements,
        canvas_background,
        variables,
    })
}

/// Serialize a template as pretty-printed JSON.
///
/// # Errors
///
/// Returns a serialization error, which only happens for non-finite numbers.
pub fn template_to_json(template: &Template) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(template)
}

/// Download name for a template export, e.g. `Launch.png`.
#[must_use]
pub fn export_file_name(template_name: &str, extension: &str) -> String {
    let stem = template_name.trim();
    let stem = if stem.is_empty() {
        FALLBACK_FILE_STEM
    } else {
        stem
    };
    let stem: String = stem
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("{stem}.{extension}")
}

fn check_kinds(index: usize, raw: &Value) -> Result<(), ImportError> {
    let declared = raw.get("type").and_then(kind_of);
    let content = raw
        .get("content")
        .and_then(|c| c.get("type"))
        .and_then(kind_of);
    match (declared, content) {
        (Some(declared), Some(content)) if declared != content => Err(ImportError::KindMismatch {
            index,
            declared,
            content,
        }),
        _ => Ok(()),
    }
}

fn kind_of(value: &Value) -> Option<ElementKind> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn required<T: DeserializeOwned>(root: &Map<String, Value>, key: &str) -> Result<T, ImportError> {
    match root.get(key) {
        Some(value) => decode(value.clone(), key),
        None => Err(ImportError::Schema {
            path: key.to_string(),
            message: "missing field".to_string(),
        }),
    }
}

fn optional<T: DeserializeOwned>(
    root: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, ImportError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode(value.clone(), key).map(Some),
    }
}

fn decode<T: DeserializeOwned>(value: Value, path: &str) -> Result<T, ImportError> {
    serde_json::from_value(value).map_err(|e| ImportError::Schema {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn browser_editor_file() -> Value {
        json!({
            "id": "V1StGXR8_Z5jdHi6B-myT",
            "name": "Blog post",
            "description": "",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-01T10:00:00.000Z",
            "canvasBackground": "#000",
            "elements": [{
                "id": "abc",
                "type": "text",
                "position": { "x": 96, "y": 96 },
                "size": { "width": 400, "height": 60 },
                "tailwindClasses": "",
                "locked": false,
                "visible": true,
                "content": {
                    "type": "text",
                    "text": "{{title}}",
                    "fontFamily": "Inter",
                    "fontSize": 32,
                    "fontWeight": 500,
                    "lineHeight": 1.2,
                    "textAlign": "left",
                    "color": "#ffffff"
                }
            }],
            "variables": [{ "key": "title", "label": "Title", "defaultValue": "Hello" }]
        })
    }

    #[test]
    fn test_accepts_browser_editor_files() {
        let imported =
            parse_template_json(&browser_editor_file().to_string()).expect("valid file");
        assert_eq!(imported.name, "Blog post");
        assert_eq!(imported.elements.len(), 1);
        assert_eq!(imported.elements[0].kind(), ElementKind::Text);
        assert_eq!(imported.variables[0].default_value, "Hello");
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_template_json("{\"name\": "),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn test_non_object_root() {
        assert!(matches!(
            parse_template_json("[1, 2]"),
            Err(ImportError::NotAnObject("an array"))
        ));
    }

    #[test]
    fn test_missing_elements_field() {
        let mut file = browser_editor_file();
        file.as_object_mut().expect("object").remove("elements");
        let err = parse_template_json(&file.to_string()).expect_err("missing elements");
        assert!(matches!(err, ImportError::Schema { ref path, .. } if path == "elements"));
    }

    #[test]
    fn test_bad_element_reports_index() {
        let mut file = browser_editor_file();
        file["elements"][0]["size"] = json!("huge");
        let err = parse_template_json(&file.to_string()).expect_err("bad size");
        assert!(matches!(err, ImportError::Schema { ref path, .. } if path == "elements[0]"));
    }

    #[test]
    fn test_out_of_range_number_is_rejected() {
        let text = browser_editor_file().to_string();
        let overflowing = text.replace("\"fontSize\":32", "\"fontSize\":1e39");
        assert_ne!(text, overflowing);
        let err = parse_template_json(&overflowing).expect_err("infinite font size");
        assert!(matches!(
            err,
            ImportError::Schema { ref path, .. } if path == "elements[0].fontSize"
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let mut file = browser_editor_file();
        file["elements"][0]["type"] = json!("badge");
        let err = parse_template_json(&file.to_string()).expect_err("mismatch");
        assert!(matches!(
            err,
            ImportError::KindMismatch {
                index: 0,
                declared: ElementKind::Badge,
                content: ElementKind::Text
            }
        ));
    }

    #[test]
    fn test_duplicate_and_invalid_variables() {
        let mut file = browser_editor_file();
        file["variables"] = json!([
            { "key": "title", "label": "A", "defaultValue": "" },
            { "key": "title", "label": "B", "defaultValue": "" }
        ]);
        assert!(matches!(
            parse_template_json(&file.to_string()),
            Err(ImportError::DuplicateVariable(ref k)) if k == "title"
        ));

        file["variables"] = json!([{ "key": "bad key", "label": "A", "defaultValue": "" }]);
        assert!(matches!(
            parse_template_json(&file.to_string()),
            Err(ImportError::InvalidVariableKey(_))
        ));
    }

    #[test]
    fn test_into_template_rekeys() {
        let imported = parse_template_json(&browser_editor_file().to_string()).expect("valid");
        let file_id = imported.elements[0].id;
        let template = imported.into_template();
        assert_ne!(template.elements[0].id, file_id);
        assert_eq!(template.canvas_background, "#000");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Launch", "png"), "Launch.png");
        assert_eq!(export_file_name("  ", "png"), "og-image.png");
        assert_eq!(export_file_name("a/b", "json"), "a_b.json");
    }
}
