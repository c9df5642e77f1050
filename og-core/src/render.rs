//! Pure mapping from elements to backend-neutral visuals.
//!
//! Rasterizers consume [`PlacedVisual`]s; nothing here touches pixels.

use crate::element::{ElementContent, ObjectFit, Position, Size, TextAlign};
use crate::variables::{interpolate, ValueSource};
use crate::{Element, ElementId, Template};

/// Label drawn inside an image element that has no source yet.
pub const IMAGE_PLACEHOLDER_LABEL: &str = "No image";

/// What an element looks like, with placeholders already substituted.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// Wrapped, styled text filling the element box.
    TextBlock {
        /// Interpolated text.
        text: String,
        /// CSS font family.
        font_family: String,
        /// Font size in pixels.
        font_size: f32,
        /// Numeric font weight.
        font_weight: u16,
        /// Line height multiple.
        line_height: f32,
        /// Horizontal alignment.
        align: TextAlign,
        /// CSS color.
        color: String,
    },
    /// Dashed box shown while an image has no source.
    ImagePlaceholder {
        /// Corner radius.
        border_radius: f32,
    },
    /// Image scaled into the element box.
    Image {
        /// Source as stored on the element.
        src: String,
        /// Fit mode.
        fit: ObjectFit,
        /// Corner radius.
        border_radius: f32,
    },
    /// Centered label on a rounded, outlined fill.
    Pill {
        /// Interpolated label.
        text: String,
        /// CSS font family.
        font_family: String,
        /// Font size in pixels.
        font_size: f32,
        /// Numeric font weight.
        font_weight: u16,
        /// CSS fill color.
        background: String,
        /// CSS label color.
        text_color: String,
        /// CSS outline color, drawn 1px wide.
        border_color: String,
        /// Corner radius.
        border_radius: f32,
        /// Horizontal padding.
        padding_x: f32,
        /// Vertical padding.
        padding_y: f32,
    },
    /// Plain styled box.
    Panel {
        /// CSS fill color.
        background: String,
        /// CSS outline color.
        border_color: String,
        /// Outline width.
        border_width: f32,
        /// Corner radius.
        border_radius: f32,
        /// Opacity in `[0, 1]`.
        opacity: f32,
    },
}

/// A visual positioned on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedVisual {
    /// Source element.
    pub element_id: ElementId,
    /// Top-left corner.
    pub position: Position,
    /// Box size.
    pub size: Size,
    /// Utility classes carried from the element.
    pub style_classes: String,
    /// The visual itself.
    pub visual: Visual,
}

/// Map one element to its visual.
#[must_use]
pub fn render_element(element: &Element, values: &impl ValueSource) -> Visual {
    match &element.content {
        ElementContent::Text(text) => Visual::TextBlock {
            text: interpolate(&text.text, values).into_owned(),
            font_family: text.font_family.clone(),
            font_size: text.font_size,
            font_weight: text.font_weight,
            line_height: text.line_height,
            align: text.text_align,
            color: text.color.clone(),
        },
        ElementContent::Image(image) if image.src.is_empty() => Visual::ImagePlaceholder {
            border_radius: image.border_radius,
        },
        ElementContent::Image(image) => Visual::Image {
            src: image.src.clone(),
            fit: image.object_fit,
            border_radius: image.border_radius,
        },
        ElementContent::Badge(badge) => Visual::Pill {
            text: interpolate(&badge.text, values).into_owned(),
            font_family: badge.font_family.clone(),
            font_size: badge.font_size,
            font_weight: badge.font_weight,
            background: badge.background_color.clone(),
            text_color: badge.text_color.clone(),
            border_color: badge.border_color.clone(),
            border_radius: badge.border_radius,
            padding_x: badge.padding_x,
            padding_y: badge.padding_y,
        },
        ElementContent::Container(container) => Visual::Panel {
            background: container.background_color.clone(),
            border_color: container.border_color.clone(),
            border_width: container.border_width,
            border_radius: container.border_radius,
            opacity: container.opacity,
        },
    }
}

/// Map every visible element of a template, in draw order.
#[must_use]
pub fn render_template(template: &Template, values: &impl ValueSource) -> Vec<PlacedVisual> {
    template
        .elements
        .iter()
        .filter(|el| el.visible)
        .map(|el| PlacedVisual {
            element_id: el.id,
            position: el.position,
            size: el.size,
            style_classes: el.style_classes.clone(),
            visual: render_element(el, values),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::element::{BadgeContent, ImageContent};
    use crate::ElementKind;

    #[test]
    fn test_text_is_interpolated() {
        let element = Element::new(ElementContent::Text(crate::TextContent {
            text: "Hello {{name}}".into(),
            ..Default::default()
        }));
        let values = HashMap::from([("name".to_string(), "World".to_string())]);
        let Visual::TextBlock { text, font_size, .. } = render_element(&element, &values) else {
            panic!("expected text block");
        };
        assert_eq!(text, "Hello World");
        assert!((font_size - 32.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_image_is_placeholder() {
        let element = Element::with_default_content(ElementKind::Image);
        let values: HashMap<String, String> = HashMap::new();
        assert_eq!(
            render_element(&element, &values),
            Visual::ImagePlaceholder { border_radius: 0.0 }
        );

        let element = Element::new(ElementContent::Image(ImageContent {
            src: "logo.png".into(),
            ..Default::default()
        }));
        assert!(matches!(
            render_element(&element, &values),
            Visual::Image { ref src, fit: ObjectFit::Cover, .. } if src == "logo.png"
        ));
    }

    #[test]
    fn test_badge_keeps_unknown_placeholder() {
        let element = Element::new(ElementContent::Badge(BadgeContent {
            text: "{{tag}}".into(),
            ..Default::default()
        }));
        let values: HashMap<String, String> = HashMap::new();
        let Visual::Pill { text, padding_x, .. } = render_element(&element, &values) else {
            panic!("expected pill");
        };
        assert_eq!(text, "{{tag}}");
        assert!((padding_x - 14.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_hidden_elements_skipped() {
        let mut template = Template::new("Render", "");
        let shown = Element::with_default_content(ElementKind::Container);
        let mut hidden = Element::with_default_content(ElementKind::Text);
        hidden.visible = false;
        let shown_id = shown.id;
        template.elements.push(hidden);
        template.elements.push(shown);

        let values: HashMap<String, String> = HashMap::new();
        let placed = render_template(&template, &values);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].element_id, shown_id);
        assert!(matches!(placed[0].visual, Visual::Panel { .. }));
    }
}
