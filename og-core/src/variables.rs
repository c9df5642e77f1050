//! `{{key}}` placeholder substitution and stale-placeholder lint.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::{ElementId, Template, Variable};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"));

static VALID_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("key pattern is valid"));

/// Anything that can resolve a placeholder key to a value.
pub trait ValueSource {
    /// Value for `key`, or `None` if the key is unknown.
    fn value(&self, key: &str) -> Option<&str>;
}

impl ValueSource for HashMap<String, String> {
    fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Runtime overrides layered over a template's variable defaults.
#[derive(Debug, Clone, Copy)]
pub struct VariableScope<'a> {
    overrides: &'a HashMap<String, String>,
    definitions: &'a [Variable],
}

impl<'a> VariableScope<'a> {
    /// Build a scope from runtime overrides and variable definitions.
    #[must_use]
    pub fn new(overrides: &'a HashMap<String, String>, definitions: &'a [Variable]) -> Self {
        Self {
            overrides,
            definitions,
        }
    }
}

impl ValueSource for VariableScope<'_> {
    fn value(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str).or_else(|| {
            self.definitions
                .iter()
                .find(|v| v.key == key)
                .map(|v| v.default_value.as_str())
        })
    }
}

/// Replace every `{{key}}` with its value. Unknown keys are left in place, braces included.
#[must_use]
pub fn interpolate<'t>(text: &'t str, values: &impl ValueSource) -> Cow<'t, str> {
    PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| match values.value(&caps[1]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    })
}

/// Keys referenced by `{{key}}` placeholders, in order of appearance.
pub fn placeholder_keys(text: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Whether `key` can be used as a variable key (word characters only).
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    VALID_KEY.is_match(key)
}

/// A placeholder whose key has no variable definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StalePlaceholder {
    /// Element containing the placeholder.
    pub element_id: ElementId,
    /// The undefined key.
    pub key: String,
}

/// Find placeholders in text and badge content that reference undefined variables.
///
/// Text is never edited; callers decide how to surface the findings.
#[must_use]
pub fn lint_placeholders(template: &Template) -> Vec<StalePlaceholder> {
    let mut stale = Vec::new();
    for element in &template.elements {
        let Some(text) = element.content.placeholder_text() else {
            continue;
        };
        for key in placeholder_keys(text) {
            if template.variable(key).is_none() {
                stale.push(StalePlaceholder {
                    element_id: element.id,
                    key: key.to_string(),
                });
            }
        }
    }
    stale
}

/// Count placeholders referencing `key` across a template's elements.
#[must_use]
pub fn count_references(template: &Template, key: &str) -> usize {
    template
        .elements
        .iter()
        .filter_map(|el| el.content.placeholder_text())
        .map(|text| placeholder_keys(text).filter(|k| *k == key).count())
        .sum()
}
