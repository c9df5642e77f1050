//! Editor workflow integration tests
//!
//! Exercises the editor through its public API:
//! - Persistence across sessions on a data directory
//! - Import and export of template files
//! - Async font loading through a mock loader

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use og_core::{
    parse_template_json, render_template, template_to_json, Editor, EditorError, ElementKind,
    ElementPatch, FileStorage, FontError, FontLoadOutcome, FontLoader, FontRequest, LoadedFont,
    Position, Size, Storage, Variable, Visual,
};

/// Loader that counts calls and fails for one family.
#[derive(Default)]
struct MockLoader {
    calls: AtomicUsize,
}

#[async_trait]
impl FontLoader for MockLoader {
    async fn load(&self, request: &FontRequest) -> Result<LoadedFont, FontError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.family == "Missing" {
            return Err(FontError::Status {
                family: request.family.clone(),
                status: 400,
            });
        }
        Ok(LoadedFont {
            family: request.family.clone(),
            weights: request.weights.clone(),
            faces: request.weights.len(),
        })
    }
}

fn open_editor(dir: &std::path::Path) -> Editor {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(dir).expect("open storage"));
    Editor::with_storage(storage).expect("editor")
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");

    let (template_id, element_id) = {
        let mut editor = open_editor(dir.path());
        let template_id = editor.create_template("Launch", Some("Release card".into()));
        let element_id = editor.add_element(ElementKind::Badge).expect("add");
        editor.set_grid_size(48);
        editor.set_show_grid(false);
        editor.set_variable_value("title", "runtime only");
        editor.set_zoom(1.5);
        (template_id, element_id)
    };

    let editor = open_editor(dir.path());
    let template = editor.template(template_id).expect("template persisted");
    assert_eq!(template.description, "Release card");
    assert!(template.element(element_id).is_some());
    assert_eq!(editor.grid().size(), 48);
    assert!(!editor.grid().show);

    // Runtime state starts fresh.
    assert!(editor.current_template().is_none());
    assert!(editor.selected_element().is_none());
    assert!(editor.variable_values().is_empty());
    assert!((editor.zoom() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_deleted_template_stays_deleted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = {
        let mut editor = open_editor(dir.path());
        let keep = editor.create_template("Keep", None);
        let drop = editor.create_template("Drop", None);
        editor.delete_template(drop).expect("delete");
        keep
    };
    let editor = open_editor(dir.path());
    assert_eq!(editor.templates().len(), 1);
    assert_eq!(editor.templates()[0].id, id);
}

#[test]
fn test_non_finite_edit_keeps_storage_readable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (template_id, element_id, position) = {
        let mut editor = open_editor(dir.path());
        let template_id = editor.create_template("Numbers", None);
        let element_id = editor.add_element(ElementKind::Text).expect("add");
        let position = editor
            .current_template()
            .and_then(|t| t.element(element_id))
            .expect("element")
            .position;

        let err = editor
            .move_element(element_id, Position::new(f32::NAN, 0.0))
            .expect_err("NaN x");
        assert!(matches!(err, EditorError::NonFiniteValue { field: "x", .. }));
        let err = editor
            .resize_element(element_id, Size::new(100.0, f32::INFINITY))
            .expect_err("infinite height");
        assert!(matches!(err, EditorError::NonFiniteValue { field: "height", .. }));

        // Drag clamps instead of failing.
        let dragged = editor
            .drag_element(element_id, f32::NAN, f32::NEG_INFINITY)
            .expect("drag");
        assert!(dragged.x.is_finite() && dragged.y.is_finite());
        editor.move_element(element_id, position).expect("move back");
        (template_id, element_id, position)
    };

    let editor = open_editor(dir.path());
    let element = editor
        .template(template_id)
        .and_then(|t| t.element(element_id))
        .expect("element persisted");
    assert_eq!(element.position, position);
    assert!(element.non_finite_field().is_none());
}

// ============================================================================
// Import / Export
// ============================================================================

#[test]
fn test_export_then_import_copies_template() {
    let mut editor = Editor::new();
    let original = editor.create_template("Card", None);
    let text = editor.add_element(ElementKind::Text).expect("add");
    editor
        .update_element(
            text,
            &serde_json::from_str::<ElementPatch>(
                r##"{"content": {"type": "text", "text": "Hi {{name}}", "fontFamily": "Inter",
                    "fontSize": 48, "fontWeight": 700, "lineHeight": 1.1,
                    "textAlign": "center", "color": "#fff"}}"##,
            )
            .expect("patch"),
        )
        .expect("update");
    editor
        .add_variable(Variable::new("name", "there"))
        .expect("variable");

    let json = template_to_json(editor.export_template(original).expect("export")).expect("json");
    let imported = editor.import_template_json(&json).expect("import");

    let copy = editor.template(imported).expect("imported");
    let source = editor.template(original).expect("original");
    assert_ne!(copy.elements[0].id, source.elements[0].id);
    assert_eq!(copy.elements[0].content, source.elements[0].content);
    assert_eq!(copy.variables, source.variables);
    assert_eq!(editor.current_template_id(), Some(imported));
}

#[test]
fn test_rendered_export_uses_scope() {
    let mut editor = Editor::new();
    let id = editor.create_template("Scoped", None);
    let badge = editor.add_element(ElementKind::Badge).expect("add");
    editor
        .update_element(
            badge,
            &serde_json::from_str::<ElementPatch>(
                r#"{"content": {"type": "badge", "text": "{{tag}}"}}"#,
            )
            .expect("patch"),
        )
        .expect("update");
    editor.add_variable(Variable::new("tag", "Rust")).expect("add");
    editor.set_variable_value("tag", "Release");

    let template = editor.template(id).expect("template");
    let placed = render_template(template, &editor.variable_scope(template));
    assert!(matches!(&placed[0].visual, Visual::Pill { text, .. } if text == "Release"));
}

#[test]
fn test_invalid_import_leaves_editor_unchanged() {
    let mut editor = Editor::new();
    editor.create_template("Only", None);
    let file = r#"{"name": "Bad", "elements": [{"type": "text", "content": {"type": "image"},
        "position": {"x": 0, "y": 0}, "size": {"width": 1, "height": 1}}]}"#;
    assert!(parse_template_json(file).is_err());
    assert!(editor.import_template_json(file).is_err());
    assert_eq!(editor.templates().len(), 1);
}

// ============================================================================
// Fonts
// ============================================================================

#[tokio::test]
async fn test_font_loading() {
    let loader = MockLoader::default();
    let mut editor = Editor::new();

    let outcome = editor
        .load_google_font(&loader, "Roboto", &[400, 700])
        .await
        .expect("load");
    assert!(matches!(outcome, FontLoadOutcome::Loaded(ref f) if f.faces == 2));

    let outcome = editor
        .load_google_font(&loader, "Roboto", &[400])
        .await
        .expect("second load");
    assert_eq!(outcome, FontLoadOutcome::AlreadyPresent);
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

    let before = editor.fonts().clone();
    assert!(editor
        .load_google_font(&loader, "Missing", &[400])
        .await
        .is_err());
    assert_eq!(editor.fonts(), &before);
}

#[tokio::test]
async fn test_pending_fonts_reload_after_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut editor = open_editor(dir.path());
        editor
            .load_google_font(&MockLoader::default(), "Lato", &[400])
            .await
            .expect("load");
        editor.add_google_font("Missing", &[400]);
    }

    let mut editor = open_editor(dir.path());
    assert_eq!(editor.fonts().pending_google().count(), 2);

    let loader = MockLoader::default();
    let failures = editor.reload_pending_fonts(&loader).await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Missing");
    assert!(editor.fonts().get("Lato").is_some_and(|f| f.loaded));
    assert!(editor.fonts().get("Missing").is_some_and(|f| !f.loaded));
}
