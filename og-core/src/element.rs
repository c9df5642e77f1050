//! Canvas elements - the positioned building blocks of a template.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ElementId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// The kind of an element. Always derived from its [`ElementContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A block of text.
    Text,
    /// A raster or vector image.
    Image,
    /// A pill-shaped label.
    Badge,
    /// A decorative box with no content.
    Container,
}

impl ElementKind {
    /// All kinds, in toolbar order.
    pub const ALL: [Self; 4] = [Self::Text, Self::Image, Self::Badge, Self::Container];

    /// Lowercase wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Badge => "badge",
            Self::Container => "container",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown element kind: {s}"))
    }
}

/// Top-left corner of an element in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Pixels from the left edge.
    pub x: f32,
    /// Pixels from the top edge.
    pub y: f32,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width and height of an element in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFit {
    /// Scale to cover the box, cropping overflow.
    #[default]
    Cover,
    /// Scale to fit inside the box.
    Contain,
    /// Stretch to the box.
    Fill,
    /// Natural size, centered.
    None,
}

/// Content of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    /// Text, may contain `{{key}}` placeholders.
    pub text: String,
    /// CSS font family.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Numeric font weight (100-900).
    pub font_weight: u16,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// CSS text color.
    pub color: String,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: "New Text".to_string(),
            font_family: "Inter".to_string(),
            font_size: 32.0,
            font_weight: 500,
            line_height: 1.2,
            text_align: TextAlign::Left,
            color: "#ffffff".to_string(),
        }
    }
}

/// Content of an image element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageContent {
    /// Image source: data URI, URL or local path. Empty means no image yet.
    pub src: String,
    /// Fit mode.
    pub object_fit: ObjectFit,
    /// Corner radius in pixels.
    pub border_radius: f32,
}

/// Content of a badge element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BadgeContent {
    /// Label, may contain `{{key}}` placeholders.
    pub text: String,
    /// CSS font family.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Numeric font weight.
    pub font_weight: u16,
    /// CSS fill color.
    pub background_color: String,
    /// CSS label color.
    pub text_color: String,
    /// CSS outline color.
    pub border_color: String,
    /// Corner radius in pixels.
    pub border_radius: f32,
    /// Horizontal padding in pixels.
    pub padding_x: f32,
    /// Vertical padding in pixels.
    pub padding_y: f32,
}

impl Default for BadgeContent {
    fn default() -> Self {
        Self {
            text: "Badge".to_string(),
            font_family: "Inter".to_string(),
            font_size: 16.0,
            font_weight: 500,
            background_color: "rgba(59, 130, 246, 0.9)".to_string(),
            text_color: "#ffffff".to_string(),
            border_color: "rgba(59, 130, 246, 1)".to_string(),
            border_radius: 8.0,
            padding_x: 14.0,
            padding_y: 6.0,
        }
    }
}

/// Content of a container element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerContent {
    /// CSS fill color.
    pub background_color: String,
    /// CSS outline color.
    pub border_color: String,
    /// Outline width in pixels.
    pub border_width: f32,
    /// Corner radius in pixels.
    pub border_radius: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl Default for ContainerContent {
    fn default() -> Self {
        Self {
            background_color: "rgba(0, 0, 0, 0.5)".to_string(),
            border_color: "transparent".to_string(),
            border_width: 0.0,
            border_radius: 0.0,
            opacity: 1.0,
        }
    }
}

/// Kind-specific payload of an element.
///
/// Fields missing from serialized content take the kind's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementContent {
    /// Text block.
    Text(TextContent),
    /// Image.
    Image(ImageContent),
    /// Badge.
    Badge(BadgeContent),
    /// Container box.
    Container(ContainerContent),
}

impl ElementContent {
    /// Default content for a kind.
    #[must_use]
    pub fn default_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Text => Self::Text(TextContent::default()),
            ElementKind::Image => Self::Image(ImageContent::default()),
            ElementKind::Badge => Self::Badge(BadgeContent::default()),
            ElementKind::Container => Self::Container(ContainerContent::default()),
        }
    }

    /// The kind this content belongs to.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Text(_) => ElementKind::Text,
            Self::Image(_) => ElementKind::Image,
            Self::Badge(_) => ElementKind::Badge,
            Self::Container(_) => ElementKind::Container,
        }
    }

    /// Text that may carry placeholders, for kinds that have any.
    #[must_use]
    pub fn placeholder_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(&text.text),
            Self::Badge(badge) => Some(&badge.text),
            Self::Image(_) | Self::Container(_) => None,
        }
    }

    /// Numeric fields by wire name.
    fn numbers(&self) -> Vec<(&'static str, f32)> {
        match self {
            Self::Text(t) => vec![("fontSize", t.font_size), ("lineHeight", t.line_height)],
            Self::Image(i) => vec![("borderRadius", i.border_radius)],
            Self::Badge(b) => vec![
                ("fontSize", b.font_size),
                ("borderRadius", b.border_radius),
                ("paddingX", b.padding_x),
                ("paddingY", b.padding_y),
            ],
            Self::Container(c) => vec![
                ("borderWidth", c.border_width),
                ("borderRadius", c.border_radius),
                ("opacity", c.opacity),
            ],
        }
    }
}

/// Initial placement of a freshly added element.
pub const DEFAULT_POSITION: Position = Position::new(100.0, 100.0);

/// Default size for a kind.
#[must_use]
pub fn default_size(kind: ElementKind) -> Size {
    match kind {
        ElementKind::Text => Size::new(400.0, 60.0),
        ElementKind::Image => Size::new(300.0, 200.0),
        ElementKind::Badge => Size::new(120.0, 40.0),
        ElementKind::Container => Size::new(400.0, 300.0),
    }
}

/// A positioned element on the canvas.
///
/// The element kind is not stored separately: it is read off the content, so the
/// serialized `type` always agrees with `content.type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementRecord", into = "ElementRecord")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Top-left corner.
    pub position: Position,
    /// Box size.
    pub size: Size,
    /// Free-form utility classes carried through from the editor.
    pub style_classes: String,
    /// Locked elements ignore drags.
    pub locked: bool,
    /// Hidden elements are skipped when rendering.
    pub visible: bool,
    /// Kind-specific payload.
    pub content: ElementContent,
}

impl Element {
    /// Create an element with the given content and the kind's default geometry.
    #[must_use]
    pub fn new(content: ElementContent) -> Self {
        let kind = content.kind();
        Self {
            id: ElementId::new(),
            position: DEFAULT_POSITION,
            size: default_size(kind),
            style_classes: String::new(),
            locked: false,
            visible: true,
            content,
        }
    }

    /// Create an element of the given kind with default content.
    #[must_use]
    pub fn with_default_content(kind: ElementKind) -> Self {
        Self::new(ElementContent::default_for(kind))
    }

    /// The element kind.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.content.kind()
    }

    /// Copy of this element under a fresh id.
    #[must_use]
    pub fn rekeyed(&self) -> Self {
        Self {
            id: ElementId::new(),
            ..self.clone()
        }
    }

    /// First geometry or content field holding NaN or an infinity, if any.
    #[must_use]
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let geometry = [
            ("x", self.position.x),
            ("y", self.position.y),
            ("width", self.size.width),
            ("height", self.size.height),
        ];
        first_non_finite(geometry.into_iter().chain(self.content.numbers()))
    }
}

/// Sparse update for an element. Only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    /// New position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// New size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// New utility classes.
    #[serde(skip_serializing_if = "Option::is_none", alias = "tailwindClasses")]
    pub style_classes: Option<String>,
    /// New lock state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// New visibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Replacement content; must be of the element's kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ElementContent>,
}

impl ElementPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Patch that only resizes the element.
    #[must_use]
    pub fn size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// First field holding NaN or an infinity, if any.
    ///
    /// Such values have no JSON representation, so they could never be persisted.
    #[must_use]
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let mut numbers = Vec::new();
        if let Some(position) = self.position {
            numbers.extend([("x", position.x), ("y", position.y)]);
        }
        if let Some(size) = self.size {
            numbers.extend([("width", size.width), ("height", size.height)]);
        }
        if let Some(ref content) = self.content {
            numbers.extend(content.numbers());
        }
        first_non_finite(numbers)
    }

    /// Shallow-merge into `element`. Nothing is applied if the content kind differs.
    ///
    /// # Errors
    ///
    /// Returns [`KindMismatch`] if `content` would change the element's kind.
    pub fn apply(&self, element: &mut Element) -> Result<(), KindMismatch> {
        if let Some(ref content) = self.content {
            if content.kind() != element.kind() {
                return Err(KindMismatch {
                    declared: element.kind(),
                    content: content.kind(),
                });
            }
        }
        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(size) = self.size {
            element.size = size;
        }
        if let Some(ref classes) = self.style_classes {
            element.style_classes.clone_from(classes);
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(visible) = self.visible {
            element.visible = visible;
        }
        if let Some(ref content) = self.content {
            element.content = content.clone();
        }
        Ok(())
    }
}

/// Wire shape of an [`Element`], with the redundant outer `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub(crate) id: ElementId,
    #[serde(rename = "type")]
    pub(crate) kind: ElementKind,
    pub(crate) position: Position,
    pub(crate) size: Size,
    #[serde(default, alias = "tailwindClasses")]
    pub(crate) style_classes: String,
    #[serde(default)]
    pub(crate) locked: bool,
    #[serde(default = "visible_by_default")]
    pub(crate) visible: bool,
    pub(crate) content: ElementContent,
}

fn visible_by_default() -> bool {
    true
}

fn first_non_finite<I>(numbers: I) -> Option<&'static str>
where
    I: IntoIterator<Item = (&'static str, f32)>,
{
    numbers
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(field, _)| field)
}

/// Outer `type` and `content.type` disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    /// The declared element type.
    pub declared: ElementKind,
    /// The content's type.
    pub content: ElementKind,
}

impl fmt::Display for KindMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "element type {} does not match content type {}",
            self.declared, self.content
        )
    }
}

impl TryFrom<ElementRecord> for Element {
    type Error = KindMismatch;

    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        let content_kind = record.content.kind();
        if record.kind != content_kind {
            return Err(KindMismatch {
                declared: record.kind,
                content: content_kind,
            });
        }
        Ok(Self {
            id: record.id,
            position: record.position,
            size: record.size,
            style_classes: record.style_classes,
            locked: record.locked,
            visible: record.visible,
            content: record.content,
        })
    }
}

impl From<Element> for ElementRecord {
    fn from(element: Element) -> Self {
        Self {
            id: element.id,
            kind: element.content.kind(),
            position: element.position,
            size: element.size,
            style_classes: element.style_classes,
            locked: element.locked,
            visible: element.visible,
            content: element.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_per_kind() {
        let text = Element::with_default_content(ElementKind::Text);
        assert_eq!(text.size, Size::new(400.0, 60.0));
        assert_eq!(text.position, DEFAULT_POSITION);

        let badge = Element::with_default_content(ElementKind::Badge);
        assert_eq!(badge.size, Size::new(120.0, 40.0));
        assert!(badge.visible);
        assert!(!badge.locked);
    }

    #[test]
    fn test_kind_follows_content() {
        for kind in ElementKind::ALL {
            assert_eq!(Element::with_default_content(kind).kind(), kind);
        }
    }

    #[test]
    fn test_serialized_type_matches_content() {
        let element = Element::with_default_content(ElementKind::Container);
        let value = serde_json::to_value(&element).expect("serialize");
        assert_eq!(value["type"], "container");
        assert_eq!(value["content"]["type"], "container");
        assert_eq!(value["content"]["backgroundColor"], "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn test_mismatched_type_rejected() {
        let element = Element::with_default_content(ElementKind::Text);
        let mut value = serde_json::to_value(&element).expect("serialize");
        value["type"] = serde_json::json!("badge");
        let result: Result<Element, _> = serde_json::from_value(value);
        let err = result.expect_err("mismatch should fail");
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_legacy_class_field_and_defaults() {
        let json = serde_json::json!({
            "id": ElementId::new(),
            "type": "image",
            "position": { "x": 10.0, "y": 20.0 },
            "size": { "width": 30.0, "height": 40.0 },
            "tailwindClasses": "rounded-xl",
            "content": { "type": "image", "src": "", "objectFit": "contain", "borderRadius": 4.0 }
        });
        let element: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(element.style_classes, "rounded-xl");
        assert!(element.visible);
        assert!(!element.locked);
        assert!(matches!(
            element.content,
            ElementContent::Image(ImageContent { object_fit: ObjectFit::Contain, .. })
        ));
    }

    #[test]
    fn test_rekeyed_keeps_everything_but_id() {
        let original = Element::with_default_content(ElementKind::Badge);
        let copy = original.rekeyed();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.content, original.content);
        assert_eq!(copy.position, original.position);
    }

    #[test]
    fn test_patch_rejects_other_kind() {
        let mut element = Element::with_default_content(ElementKind::Text);
        let patch = ElementPatch {
            visible: Some(false),
            content: Some(ElementContent::default_for(ElementKind::Badge)),
            ..ElementPatch::default()
        };
        let err = patch.apply(&mut element).expect_err("kind change");
        assert_eq!(err.content, ElementKind::Badge);
        assert!(element.visible, "rejected patch must not partially apply");
    }

    #[test]
    fn test_patch_non_finite_field() {
        assert_eq!(ElementPatch::position(Position::new(1.0, 2.0)).non_finite_field(), None);
        assert_eq!(
            ElementPatch::position(Position::new(f32::NAN, 0.0)).non_finite_field(),
            Some("x")
        );
        assert_eq!(
            ElementPatch::size(Size::new(10.0, f32::INFINITY)).non_finite_field(),
            Some("height")
        );
        let patch = ElementPatch {
            content: Some(ElementContent::Container(ContainerContent {
                opacity: f32::NAN,
                ..ContainerContent::default()
            })),
            ..ElementPatch::default()
        };
        assert_eq!(patch.non_finite_field(), Some("opacity"));
        // Negative and degenerate values are still accepted.
        assert_eq!(ElementPatch::size(Size::new(-10.0, 0.0)).non_finite_field(), None);
    }

    #[test]
    fn test_patch_from_json() {
        let mut element = Element::with_default_content(ElementKind::Text);
        let patch: ElementPatch =
            serde_json::from_str(r#"{"position": {"x": 5, "y": 6}, "locked": true}"#)
                .expect("patch json");
        patch.apply(&mut element).expect("apply");
        assert_eq!(element.position, Position::new(5.0, 6.0));
        assert!(element.locked);
        assert_eq!(element.size, default_size(ElementKind::Text));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Badge".parse::<ElementKind>(), Ok(ElementKind::Badge));
        assert!("circle".parse::<ElementKind>().is_err());
    }
}
