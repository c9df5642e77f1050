//! Integration tests for template export (og-renderer).
//!
//! Drives the editor to build templates, then exports them through the
//! rasterizer with the editor's variable scope.

use std::collections::HashMap;

use og_core::{
    Editor, ElementContent, ElementKind, ElementPatch, ImageContent, ObjectFit, Template,
    TemplatePatch, TextAlign, TextContent,
};
use og_renderer::export::{ExportConfig, ExportFormat, TemplateRasterizer};
use og_renderer::RenderError;

/// 1x1 red PNG.
const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

fn rasterizer(config: ExportConfig) -> TemplateRasterizer {
    TemplateRasterizer::new(ExportConfig {
        load_system_fonts: false,
        ..config
    })
}

fn text_patch(text: &str, align: TextAlign) -> ElementPatch {
    ElementPatch {
        content: Some(ElementContent::Text(TextContent {
            text: text.into(),
            text_align: align,
            ..TextContent::default()
        })),
        ..ElementPatch::default()
    }
}

fn image_patch(src: &str, fit: ObjectFit) -> ElementPatch {
    ElementPatch {
        content: Some(ElementContent::Image(ImageContent {
            src: src.into(),
            object_fit: fit,
            border_radius: 12.0,
        })),
        ..ElementPatch::default()
    }
}

/// A blog-card template: container, title with a variable, badge.
fn blog_card(editor: &mut Editor) -> og_core::TemplateId {
    let id = editor.create_template("Blog card", None);
    editor.add_element(ElementKind::Container).expect("container");
    let title = editor.add_element(ElementKind::Text).expect("title");
    editor
        .update_element(title, &text_patch("{{title}}", TextAlign::Center))
        .expect("title text");
    editor.add_element(ElementKind::Badge).expect("badge");
    editor
        .add_variable(og_core::Variable::new("title", "Shipping Rust"))
        .expect("variable");
    id
}

// ==========================================================================
// Editor to export
// ==========================================================================

#[test]
fn test_editor_template_png_export() {
    let mut editor = Editor::new();
    let id = blog_card(&mut editor);
    let template = editor.export_template(id).expect("template");

    let png = rasterizer(ExportConfig::default())
        .export(template, &editor.variable_scope(template), ExportFormat::Png)
        .expect("png");
    assert_eq!(&png[0..4], &[137, 80, 78, 71]);

    let decoded = image::load_from_memory(&png).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (2400, 1260));
}

#[test]
fn test_runtime_values_override_defaults() {
    let mut editor = Editor::new();
    let id = blog_card(&mut editor);
    let rasterizer = rasterizer(ExportConfig::default());

    let template = editor.export_template(id).expect("template");
    let svg = rasterizer
        .render_to_svg(template, &editor.variable_scope(template))
        .expect("svg");
    assert!(svg.contains("Shipping Rust"));
    assert!(svg.contains("text-anchor=\"middle\""));

    editor.set_variable_value("title", "Fearless <Concurrency>");
    let template = editor.export_template(id).expect("template");
    let svg = rasterizer
        .render_to_svg(template, &editor.variable_scope(template))
        .expect("svg");
    assert!(svg.contains("Fearless &lt;Concurrency&gt;"));
    assert!(!svg.contains("Shipping Rust"));
}

#[test]
fn test_unknown_placeholder_is_kept() {
    let mut editor = Editor::new();
    let id = editor.create_template("Stale", None);
    let element = editor.add_element(ElementKind::Text).expect("add");
    editor
        .update_element(element, &text_patch("Hi {{missing}}", TextAlign::Left))
        .expect("update");

    let template = editor.template(id).expect("template");
    let svg = rasterizer(ExportConfig::default())
        .render_to_svg(template, &editor.variable_scope(template))
        .expect("svg");
    assert!(svg.contains("Hi {{missing}}"));
    assert_eq!(editor.lint().len(), 1);
}

// ==========================================================================
// Backgrounds
// ==========================================================================

#[test]
fn test_solid_and_preset_backgrounds() {
    let mut editor = Editor::new();
    let id = editor.create_template("Background", None);
    let rasterizer = rasterizer(ExportConfig::default());
    let values: HashMap<String, String> = HashMap::new();

    editor
        .update_template(
            id,
            &TemplatePatch {
                canvas_background: Some("#1e3a5f".into()),
                ..TemplatePatch::default()
            },
        )
        .expect("solid");
    let svg = rasterizer
        .render_to_svg(editor.template(id).expect("template"), &values)
        .expect("svg");
    assert!(svg.contains("fill=\"#1e3a5f\""));
    assert!(!svg.contains("linearGradient"));

    editor
        .update_template(
            id,
            &TemplatePatch {
                canvas_background: Some("linear-gradient(135deg, #f5f5f5, #e0e0e0)".into()),
                ..TemplatePatch::default()
            },
        )
        .expect("gradient");
    let svg = rasterizer
        .render_to_svg(editor.template(id).expect("template"), &values)
        .expect("svg");
    assert!(svg.contains("stop-color=\"#f5f5f5\""));
    assert!(svg.contains("stop-color=\"#e0e0e0\""));
}

#[test]
fn test_unsupported_background_falls_back() {
    let mut template = Template::new("Fallback", "");
    template.canvas_background = "url(bg.png)".into();
    let values: HashMap<String, String> = HashMap::new();
    let svg = rasterizer(ExportConfig::default())
        .render_to_svg(&template, &values)
        .expect("svg");
    assert!(svg.contains("fill=\"#000000\""));
}

// ==========================================================================
// Images
// ==========================================================================

#[test]
fn test_data_uri_image_is_embedded() {
    let mut editor = Editor::new();
    let id = editor.create_template("Image", None);
    let image = editor.add_element(ElementKind::Image).expect("add");
    editor
        .update_element(
            image,
            &image_patch(&format!("data:image/png;base64,{PNG_BASE64}"), ObjectFit::Contain),
        )
        .expect("update");

    let values: HashMap<String, String> = HashMap::new();
    let svg = rasterizer(ExportConfig::default())
        .render_to_svg(editor.template(id).expect("template"), &values)
        .expect("svg");
    assert!(svg.contains("preserveAspectRatio=\"xMidYMid meet\""));
    assert!(svg.contains("href=\"data:image/png;base64,"));
    assert!(svg.contains("clipPath"));
}

#[test]
fn test_relative_image_uses_asset_root() {
    use base64::Engine;

    let dir = tempfile::tempdir().expect("tempdir");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(PNG_BASE64)
        .expect("fixture");
    std::fs::write(dir.path().join("logo.png"), bytes).expect("write");

    let mut editor = Editor::new();
    let id = editor.create_template("Local", None);
    let image = editor.add_element(ElementKind::Image).expect("add");
    editor
        .update_element(image, &image_patch("logo.png", ObjectFit::None))
        .expect("update");
    let template = editor.template(id).expect("template");
    let values: HashMap<String, String> = HashMap::new();

    let svg = rasterizer(ExportConfig {
        asset_root: Some(dir.path().to_path_buf()),
        ..ExportConfig::default()
    })
    .render_to_svg(template, &values)
    .expect("svg");
    // Natural 1x1 size, centered in the 300x200 box at (96, 96).
    assert!(svg.contains("width=\"1\" height=\"1\""));

    let missing = rasterizer(ExportConfig::default()).render_to_svg(template, &values);
    assert!(matches!(missing, Err(RenderError::Io(_))));
}

// ==========================================================================
// Edge cases
// ==========================================================================

#[test]
fn test_custom_pixel_ratio() {
    let template = Template::new("Ratio", "");
    let values: HashMap<String, String> = HashMap::new();
    let png = rasterizer(ExportConfig::default().with_pixel_ratio(1.0))
        .export(&template, &values, ExportFormat::Png)
        .expect("png");
    let decoded = image::load_from_memory(&png).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (1200, 630));
}

#[test]
fn test_special_characters_in_badge() {
    let mut editor = Editor::new();
    let id = editor.create_template("Badge", None);
    let badge = editor.add_element(ElementKind::Badge).expect("add");
    let patch: ElementPatch =
        serde_json::from_str(r#"{"content": {"type": "badge", "text": "R&D \"team\""}}"#)
            .expect("patch");
    editor.update_element(badge, &patch).expect("update");

    let values: HashMap<String, String> = HashMap::new();
    let template = editor.template(id).expect("template");
    let svg_bytes = rasterizer(ExportConfig::default())
        .export(template, &values, ExportFormat::Svg)
        .expect("svg");
    let svg = String::from_utf8(svg_bytes).expect("utf8");
    assert!(svg.contains("R&amp;D &quot;team&quot;"));

    // PNG should still render without error
    let png = rasterizer(ExportConfig::default())
        .export(template, &values, ExportFormat::Png)
        .expect("png");
    assert_eq!(&png[0..4], &[137, 80, 78, 71]);
}
