//! The editor: the single owner of template state.
//!
//! [`Editor`] holds the template collection together with the runtime selection,
//! font registry, variable values, zoom and grid settings. Every mutating command
//! edits a copy of the affected template and swaps it in only when the whole
//! command succeeds, then writes a persistence snapshot if storage is attached.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::element::{ElementPatch, Position, Size};
use crate::error::{EditorError, EditorResult, FontError, ImportError};
use crate::exchange::{parse_template_json, ImportedTemplate};
use crate::fonts::{load_font, FontLoadOutcome, FontLoader, FontRegistry, FontRequest};
use crate::grid::GridSettings;
use crate::persist::{load_state, save_state, PersistedState, Storage};
use crate::template::{TemplatePatch, VariablePatch, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::variables::{
    count_references, is_valid_key, lint_placeholders, StalePlaceholder, VariableScope,
};
use crate::{Element, ElementId, ElementKind, Template, TemplateId, Variable};

/// Smallest zoom factor.
pub const MIN_ZOOM: f32 = 0.25;

/// Largest zoom factor.
pub const MAX_ZOOM: f32 = 2.0;

/// Offset applied to a duplicated element.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Suffix appended to the name of a duplicated template.
const COPY_SUFFIX: &str = " (Copy)";

/// Direction for [`Editor::reorder_element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One step toward the front (drawn later).
    Up,
    /// One step toward the back (drawn earlier).
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "forward" => Ok(Self::Up),
            "down" | "backward" => Ok(Self::Down),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Template editor state.
///
/// # Example
///
/// ```
/// use og_core::{Editor, ElementKind};
///
/// let mut editor = Editor::new();
/// editor.create_template("Launch", None);
/// let id = editor.add_element(ElementKind::Text).unwrap();
/// assert_eq!(editor.selected_element().map(|el| el.id), Some(id));
/// ```
#[derive(Debug)]
pub struct Editor {
    templates: Vec<Template>,
    current_template_id: Option<TemplateId>,
    selected_element_id: Option<ElementId>,
    fonts: FontRegistry,
    variable_values: HashMap<String, String>,
    zoom: f32,
    grid: GridSettings,
    storage: Option<Arc<dyn Storage>>,
}

impl Default for Editor {
    fn default() -> Self {
        Self {
            templates: Vec::new(),
            current_template_id: None,
            selected_element_id: None,
            fonts: FontRegistry::default(),
            variable_values: HashMap::new(),
            zoom: 1.0,
            grid: GridSettings::default(),
            storage: None,
        }
    }
}

impl Editor {
    /// Create an empty editor without persistence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an editor backed by `storage`, restoring any previously saved state.
    ///
    /// Google fonts come back marked as not loaded so they are fetched again.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Storage`] if the saved state cannot be read or parsed.
    pub fn with_storage(storage: Arc<dyn Storage>) -> EditorResult<Self> {
        let mut editor = Self::default();
        if let Some(state) = load_state(storage.as_ref())? {
            tracing::debug!("Restored {} templates from storage", state.templates.len());
            editor.grid = state.grid();
            editor.templates = state.templates;
            editor.fonts = state.fonts;
            editor.fonts.reset_google_loaded();
        }
        editor.storage = Some(storage);
        Ok(editor)
    }

    /// Snapshot of the persisted subset of state.
    #[must_use]
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            templates: self.templates.clone(),
            fonts: self.fonts.clone(),
            grid_enabled: self.grid.enabled,
            grid_size: self.grid.size(),
            show_grid: self.grid.show,
        }
    }

    fn persist(&self) {
        let Some(ref storage) = self.storage else {
            return;
        };
        if let Err(e) = save_state(storage.as_ref(), &self.persisted()) {
            tracing::warn!("Failed to persist editor state: {e}");
        }
    }

    /// All templates in creation order.
    #[must_use]
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Look up a template.
    #[must_use]
    pub fn template(&self, id: TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Id of the current template.
    #[must_use]
    pub fn current_template_id(&self) -> Option<TemplateId> {
        self.current_template_id
    }

    /// The current template, if any.
    #[must_use]
    pub fn current_template(&self) -> Option<&Template> {
        self.current_template_id.and_then(|id| self.template(id))
    }

    /// Id of the selected element.
    #[must_use]
    pub fn selected_element_id(&self) -> Option<ElementId> {
        self.selected_element_id
    }

    /// The selected element of the current template, if any.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        let id = self.selected_element_id?;
        self.current_template()?.element(id)
    }

    /// The font registry.
    #[must_use]
    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Grid settings.
    #[must_use]
    pub fn grid(&self) -> GridSettings {
        self.grid
    }

    /// Current zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Runtime variable values.
    #[must_use]
    pub fn variable_values(&self) -> &HashMap<String, String> {
        &self.variable_values
    }

    /// Values used to render `template`: runtime values first, then its defaults.
    #[must_use]
    pub fn variable_scope<'a>(&'a self, template: &'a Template) -> VariableScope<'a> {
        VariableScope::new(&self.variable_values, &template.variables)
    }

    /// Create a template and make it current.
    pub fn create_template(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> TemplateId {
        let template = Template::new(name, description.unwrap_or_default());
        let id = template.id;
        tracing::debug!("Created template {id} ({})", template.name);
        self.templates.push(template);
        self.current_template_id = Some(id);
        self.selected_element_id = None;
        self.persist();
        id
    }

    /// Delete a template. Clears the selection if it was current.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::TemplateNotFound`] if the id is unknown.
    pub fn delete_template(&mut self, id: TemplateId) -> EditorResult<()> {
        let index = self.template_index(id)?;
        self.templates.remove(index);
        if self.current_template_id == Some(id) {
            self.current_template_id = None;
            self.selected_element_id = None;
        }
        tracing::debug!("Deleted template {id}");
        self.persist();
        Ok(())
    }

    /// Deep-copy a template under fresh ids. The copy is not selected.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::TemplateNotFound`] if the id is unknown.
    pub fn duplicate_template(&mut self, id: TemplateId) -> EditorResult<TemplateId> {
        let source = &self.templates[self.template_index(id)?];
        let mut copy = source.rekeyed();
        copy.name = format!("{}{COPY_SUFFIX}", source.name);
        let copy_id = copy.id;
        tracing::debug!("Duplicated template {id} as {copy_id}");
        self.templates.push(copy);
        self.persist();
        Ok(copy_id)
    }

    /// Merge metadata into a template.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::TemplateNotFound`] if the id is unknown.
    pub fn update_template(&mut self, id: TemplateId, patch: &TemplatePatch) -> EditorResult<()> {
        let index = self.template_index(id)?;
        let template = &mut self.templates[index];
        patch.apply(template);
        template.touch();
        tracing::debug!("Updated template {id}");
        self.persist();
        Ok(())
    }

    /// Change the current template and clear the element selection.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::TemplateNotFound`] if `id` is set but unknown.
    pub fn set_current_template(&mut self, id: Option<TemplateId>) -> EditorResult<()> {
        if let Some(id) = id {
            self.template_index(id)?;
        }
        self.current_template_id = id;
        self.selected_element_id = None;
        Ok(())
    }

    /// Store an imported template under fresh ids and make it current.
    pub fn import_template(&mut self, imported: ImportedTemplate) -> TemplateId {
        let template = imported.into_template();
        let id = template.id;
        tracing::debug!(
            "Imported template {id} ({}) with {} elements",
            template.name,
            template.elements.len()
        );
        self.templates.push(template);
        self.current_template_id = Some(id);
        self.selected_element_id = None;
        self.persist();
        id
    }

    /// Validate a template JSON document and import it.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] if the document is invalid; the editor is unchanged.
    pub fn import_template_json(&mut self, json: &str) -> Result<TemplateId, ImportError> {
        let imported = parse_template_json(json)?;
        Ok(self.import_template(imported))
    }

    /// The template to export.
    #[must_use]
    pub fn export_template(&self, id: TemplateId) -> Option<&Template> {
        self.template(id)
    }

    fn template_index(&self, id: TemplateId) -> EditorResult<usize> {
        self.templates
            .iter()
            .position(|t| t.id == id)
            .ok_or(EditorError::TemplateNotFound(id))
    }

    fn current_index(&self) -> EditorResult<usize> {
        let id = self
            .current_template_id
            .ok_or(EditorError::NoTemplateSelected)?;
        self.templates
            .iter()
            .position(|t| t.id == id)
            .ok_or(EditorError::NoTemplateSelected)
    }

    /// Run `edit` on a copy of the current template and commit it on success.
    fn edit_current<T>(
        &mut self,
        edit: impl FnOnce(&mut Template) -> EditorResult<T>,
    ) -> EditorResult<T> {
        let index = self.current_index()?;
        let mut draft = self.templates[index].clone();
        let output = edit(&mut draft)?;
        draft.touch();
        self.templates[index] = draft;
        self.persist();
        Ok(output)
    }

    /// Add an element with the kind's defaults and select it.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoTemplateSelected`] without a current template.
    pub fn add_element(&mut self, kind: ElementKind) -> EditorResult<ElementId> {
        let mut element = Element::with_default_content(kind);
        element.position = Position::new(
            self.grid.snap(element.position.x),
            self.grid.snap(element.position.y),
        );
        let id = element.id;
        self.edit_current(|template| {
            template.elements.push(element);
            Ok(())
        })?;
        tracing::debug!("Added {kind} element {id}");
        self.selected_element_id = Some(id);
        Ok(id)
    }

    /// Remove an element, clearing the selection if it was selected.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoTemplateSelected`] or [`EditorError::ElementNotFound`].
    pub fn delete_element(&mut self, id: ElementId) -> EditorResult<()> {
        self.edit_current(|template| {
            let index = template
                .element_index(id)
                .ok_or(EditorError::ElementNotFound(id))?;
            template.elements.remove(index);
            Ok(())
        })?;
        if self.selected_element_id == Some(id) {
            self.selected_element_id = None;
        }
        tracing::debug!("Deleted element {id}");
        Ok(())
    }

    /// Shallow-merge a patch into an element.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoTemplateSelected`], [`EditorError::ElementNotFound`],
    /// [`EditorError::ContentKindMismatch`] if the patch would change the kind, or
    /// [`EditorError::NonFiniteValue`] if a number is NaN or infinite.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> EditorResult<()> {
        if let Some(field) = patch.non_finite_field() {
            return Err(EditorError::NonFiniteValue { element: id, field });
        }
        self.edit_current(|template| {
            let element = template
                .elements
                .iter_mut()
                .find(|el| el.id == id)
                .ok_or(EditorError::ElementNotFound(id))?;
            patch
                .apply(element)
                .map_err(|e| EditorError::ContentKindMismatch {
                    element: e.declared,
                    content: e.content,
                })
        })?;
        tracing::debug!("Updated element {id}");
        Ok(())
    }

    /// Copy an element, offset it and select the copy.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoTemplateSelected`] or [`EditorError::ElementNotFound`].
    pub fn duplicate_element(&mut self, id: ElementId) -> EditorResult<ElementId> {
        let copy_id = self.edit_current(|template| {
            let source = template.element(id).ok_or(EditorError::ElementNotFound(id))?;
            let mut copy = source.rekeyed();
            copy.position.x += DUPLICATE_OFFSET;
            copy.position.y += DUPLICATE_OFFSET;
            let copy_id = copy.id;
            template.elements.push(copy);
            Ok(copy_id)
        })?;
        tracing::debug!("Duplicated element {id} as {copy_id}");
        self.selected_element_id = Some(copy_id);
        Ok(copy_id)
    }

    /// Set an element's position.
    ///
    /// # Errors
    ///
    /// See [`Editor::update_element`].
    pub fn move_element(&mut self, id: ElementId, position: Position) -> EditorResult<()> {
        self.update_element(id, &ElementPatch::position(position))
    }

    /// Set an element's size.
    ///
    /// # Errors
    ///
    /// See [`Editor::update_element`].
    pub fn resize_element(&mut self, id: ElementId, size: Size) -> EditorResult<()> {
        self.update_element(id, &ElementPatch::size(size))
    }

    /// Move an element one step in draw order. Returns `false` at the boundary,
    /// in which case nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoTemplateSelected`] or [`EditorError::ElementNotFound`].
    pub fn reorder_element(&mut self, id: ElementId, direction: Direction) -> EditorResult<bool> {
        let index = self.templates[self.current_index()?]
            .element_index(id)
            .ok_or(EditorError::ElementNotFound(id))?;
        let len = self.templates[self.current_index()?].elements.len();
        let target = match direction {
            Direction::Up if index + 1 < len => index + 1,
            Direction::Down if index > 0 => index - 1,
            _ => return Ok(false),
        };
        self.edit_current(|template| {
            template.elements.swap(index, target);
            Ok(())
        })?;
        tracing::debug!("Moved element {id} {direction}");
        Ok(true)
    }

    /// Select an element of the current template, or clear the selection.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoTemplateSelected`] or [`EditorError::ElementNotFound`]
    /// when selecting an id that is not in the current template.
    pub fn select_element(&mut self, id: Option<ElementId>) -> EditorResult<()> {
        if let Some(id) = id {
            let template = &self.templates[self.current_index()?];
            if template.element(id).is_none() {
                return Err(EditorError::ElementNotFound(id));
            }
        }
        self.selected_element_id = id;
        Ok(())
    }

    /// Drag an element by a screen-space delta.
    ///
    /// The delta is divided by the zoom factor, the result snapped to the grid and
    /// kept inside the canvas. Locked elements stay where they are. Returns the
    /// element's resulting position.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoTemplateSelected`] or [`EditorError::ElementNotFound`].
    pub fn drag_element(&mut self, id: ElementId, dx: f32, dy: f32) -> EditorResult<Position> {
        let element = self.templates[self.current_index()?]
            .element(id)
            .ok_or(EditorError::ElementNotFound(id))?;
        if element.locked {
            tracing::debug!("Ignoring drag on locked element {id}");
            return Ok(element.position);
        }

        let x = self.grid.snap(element.position.x + dx / self.zoom);
        let y = self.grid.snap(element.position.y + dy / self.zoom);
        let position = Position::new(
            x.min(CANVAS_WIDTH - element.size.width).max(0.0),
            y.min(CANVAS_HEIGHT - element.size.height).max(0.0),
        );
        self.move_element(id, position)?;
        Ok(position)
    }

    /// Define a variable on the current template and seed its runtime value.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidVariableKey`], [`EditorError::DuplicateVariable`],
    /// or [`EditorError::NoTemplateSelected`].
    pub fn add_variable(&mut self, variable: Variable) -> EditorResult<()> {
        if !is_valid_key(&variable.key) {
            return Err(EditorError::InvalidVariableKey(variable.key));
        }
        let key = variable.key.clone();
        let default_value = variable.default_value.clone();
        self.edit_current(|template| {
            if template.variable(&variable.key).is_some() {
                return Err(EditorError::DuplicateVariable(variable.key));
            }
            template.variables.push(variable);
            Ok(())
        })?;
        tracing::debug!("Added variable {key}");
        self.variable_values.insert(key, default_value);
        Ok(())
    }

    /// Remove a variable definition and its runtime value.
    ///
    /// Placeholders that still use the key are left in the text.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::VariableNotFound`] or [`EditorError::NoTemplateSelected`].
    pub fn remove_variable(&mut self, key: &str) -> EditorResult<()> {
        let references = self.edit_current(|template| {
            let index = template
                .variables
                .iter()
                .position(|v| v.key == key)
                .ok_or_else(|| EditorError::VariableNotFound(key.to_string()))?;
            template.variables.remove(index);
            Ok(count_references(template, key))
        })?;
        self.variable_values.remove(key);
        if references > 0 {
            tracing::warn!(
                "Removed variable {key} is still referenced by {references} placeholders"
            );
        } else {
            tracing::debug!("Removed variable {key}");
        }
        Ok(())
    }

    /// Merge a patch into a variable definition.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::VariableNotFound`] or [`EditorError::NoTemplateSelected`].
    pub fn update_variable(&mut self, key: &str, patch: &VariablePatch) -> EditorResult<()> {
        self.edit_current(|template| {
            let variable = template
                .variables
                .iter_mut()
                .find(|v| v.key == key)
                .ok_or_else(|| EditorError::VariableNotFound(key.to_string()))?;
            patch.apply(variable);
            Ok(())
        })?;
        tracing::debug!("Updated variable {key}");
        Ok(())
    }

    /// Set a runtime value. Not persisted.
    pub fn set_variable_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variable_values.insert(key.into(), value.into());
    }

    /// Stale placeholders in the current template.
    #[must_use]
    pub fn lint(&self) -> Vec<StalePlaceholder> {
        self.current_template()
            .map(lint_placeholders)
            .unwrap_or_default()
    }

    /// Register a Google font without fetching it. Returns `false` if it already exists.
    pub fn add_google_font(&mut self, family: &str, weights: &[u16]) -> bool {
        let added = self.fonts.add_google(family, weights);
        if added {
            tracing::debug!("Registered font {family}");
            self.persist();
        }
        added
    }

    /// Mark a font as loaded or not. Returns `false` for unknown families.
    pub fn set_font_loaded(&mut self, family: &str, loaded: bool) -> bool {
        let known = self.fonts.set_loaded(family, loaded);
        if known {
            self.persist();
        }
        known
    }

    /// Fetch and register a Google font unless it is already known.
    ///
    /// # Errors
    ///
    /// Returns the loader's [`FontError`]; the registry is unchanged on failure.
    pub async fn load_google_font(
        &mut self,
        loader: &dyn FontLoader,
        family: &str,
        weights: &[u16],
    ) -> Result<FontLoadOutcome, FontError> {
        let outcome = load_font(&mut self.fonts, loader, family, weights).await?;
        if matches!(outcome, FontLoadOutcome::Loaded(_)) {
            self.persist();
        }
        Ok(outcome)
    }

    /// Fetch every registered Google font that is not loaded yet.
    ///
    /// Failures are logged and returned per family; the remaining fonts are still tried.
    pub async fn reload_pending_fonts(
        &mut self,
        loader: &dyn FontLoader,
    ) -> Vec<(String, FontError)> {
        let pending: Vec<_> = self
            .fonts
            .pending_google()
            .map(|f| (f.family.clone(), f.weights.clone()))
            .collect();

        let mut failures = Vec::new();
        let mut loaded_any = false;
        for (family, weights) in pending {
            let request = FontRequest::google(family.as_str(), &weights);
            match loader.load(&request).await {
                Ok(_) => {
                    self.fonts.set_loaded(&family, true);
                    loaded_any = true;
                }
                Err(e) => {
                    tracing::error!("Failed to reload font {family}: {e}");
                    failures.push((family, e));
                }
            }
        }
        if loaded_any {
            self.persist();
        }
        failures
    }

    /// Set the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_nan() {
            1.0
        } else {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        };
    }

    /// Toggle snap-to-grid.
    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.grid.enabled = enabled;
        self.persist();
    }

    /// Set the grid spacing, clamped into range.
    pub fn set_grid_size(&mut self, size: u32) {
        self.grid.set_size(size);
        self.persist();
    }

    /// Toggle the grid overlay.
    pub fn set_show_grid(&mut self, show: bool) {
        self.grid.show = show;
        self.persist();
    }

    /// Snap a coordinate with the current grid settings.
    #[must_use]
    pub fn snap_to_grid(&self, value: f32) -> f32 {
        self.grid.snap(value)
    }
}
