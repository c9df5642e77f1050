//! Template export to SVG and PNG.
//!
//! A template is first mapped to positioned visuals by `og_core::render`, then
//! written out as an SVG document in canvas coordinates. PNG output rasterizes
//! that SVG with resvg/tiny-skia at the configured pixel ratio.

use std::fmt::Write;
use std::path::PathBuf;
#[cfg(feature = "png")]
use std::sync::Arc;

use og_core::element::{ObjectFit, Position, Size, TextAlign};
use og_core::render::{IMAGE_PLACEHOLDER_LABEL, PlacedVisual, Visual};
use og_core::{render_template, Template, ValueSource, CANVAS_HEIGHT, CANVAS_WIDTH};

use crate::css::{parse_paint, Color, LinearGradient, Paint};
use crate::error::RenderResult;
use crate::image::load_embedded;

/// Pixel ratio used for PNG export unless configured otherwise.
pub const DEFAULT_PIXEL_RATIO: f32 = 2.0;

/// Smallest accepted pixel ratio.
pub const MIN_PIXEL_RATIO: f32 = 0.25;

/// Largest accepted pixel ratio.
pub const MAX_PIXEL_RATIO: f32 = 4.0;

/// Average glyph advance as a fraction of the font size, used for line wrapping.
const AVERAGE_GLYPH_WIDTH: f32 = 0.55;

/// Baseline offset from the top of a line box, as a fraction of the font size.
const ASCENT: f32 = 0.8;

/// Fallback family appended to every font stack.
const GENERIC_FAMILY: &str = "sans-serif";

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image at the configured pixel ratio.
    #[cfg(feature = "png")]
    Png,
    /// SVG document (returned as UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// File extension for the format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            #[cfg(feature = "png")]
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Configuration for template export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output pixels per canvas pixel.
    pub pixel_ratio: f32,
    /// Directories scanned for font files, e.g. downloaded Google fonts.
    pub font_dirs: Vec<PathBuf>,
    /// Whether installed system fonts are available to text.
    pub load_system_fonts: bool,
    /// Base directory for relative image paths.
    pub asset_root: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: DEFAULT_PIXEL_RATIO,
            font_dirs: Vec::new(),
            load_system_fonts: true,
            asset_root: None,
        }
    }
}

impl ExportConfig {
    /// Set the pixel ratio, clamped to `[MIN_PIXEL_RATIO, MAX_PIXEL_RATIO]`.
    #[must_use]
    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = if pixel_ratio.is_finite() {
            pixel_ratio.clamp(MIN_PIXEL_RATIO, MAX_PIXEL_RATIO)
        } else {
            DEFAULT_PIXEL_RATIO
        };
        self
    }

    /// Output dimensions in pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn output_dimensions(&self) -> (u32, u32) {
        let width = (CANVAS_WIDTH * self.pixel_ratio).round() as u32;
        let height = (CANVAS_HEIGHT * self.pixel_ratio).round() as u32;
        (width.max(1), height.max(1))
    }
}

/// Renders templates to SVG and PNG.
pub struct TemplateRasterizer {
    config: ExportConfig,
    #[cfg(feature = "png")]
    fontdb: Arc<usvg::fontdb::Database>,
}

impl TemplateRasterizer {
    /// Create a rasterizer, loading fonts once up front.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        #[cfg(feature = "png")]
        let fontdb = {
            let mut db = usvg::fontdb::Database::new();
            if config.load_system_fonts {
                db.load_system_fonts();
            }
            for dir in &config.font_dirs {
                if dir.is_dir() {
                    db.load_fonts_dir(dir);
                }
            }
            tracing::debug!("Font database holds {} faces", db.len());
            Arc::new(db)
        };
        Self {
            config,
            #[cfg(feature = "png")]
            fontdb,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export a template to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if an image cannot be embedded or the output cannot be encoded.
    pub fn export(
        &self,
        template: &Template,
        values: &impl ValueSource,
        format: ExportFormat,
    ) -> RenderResult<Vec<u8>> {
        match format {
            #[cfg(feature = "png")]
            ExportFormat::Png => self.render_to_png(template, values),
            ExportFormat::Svg => self
                .render_to_svg(template, values)
                .map(String::into_bytes),
        }
    }

    /// Export the template to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[cfg(feature = "png")]
    pub fn render_to_png(
        &self,
        template: &Template,
        values: &impl ValueSource,
    ) -> RenderResult<Vec<u8>> {
        use crate::error::RenderError;

        let svg_string = self.render_to_svg(template, values)?;
        let pixmap = self.rasterize_svg(&svg_string)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    /// Export the template to an SVG string.
    ///
    /// Hidden elements are skipped and the editor grid is never drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if an image element cannot be embedded.
    pub fn render_to_svg(
        &self,
        template: &Template,
        values: &impl ValueSource,
    ) -> RenderResult<String> {
        let (out_w, out_h) = self.config.output_dimensions();
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {CANVAS_WIDTH} {CANVAS_HEIGHT}\">",
        );

        write_background(&mut svg, &template.canvas_background);

        let placed = render_template(template, values);
        for (index, visual) in placed.iter().enumerate() {
            self.write_visual(&mut svg, index, visual)?;
        }

        svg.push_str("</svg>");
        tracing::debug!(
            "Rendered template {} ({} visible elements) to SVG",
            template.id,
            placed.len()
        );
        Ok(svg)
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[cfg(feature = "png")]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        use crate::error::RenderError;

        let opt = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree =
            usvg::Tree::from_str(svg_string, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Raster(format!("cannot allocate {px_w}x{px_h} pixmap")))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }

    #[allow(clippy::too_many_lines)]
    fn write_visual(
        &self,
        svg: &mut String,
        index: usize,
        placed: &PlacedVisual,
    ) -> RenderResult<()> {
        let Position { x, y } = placed.position;
        let Size { width, height } = placed.size;

        match &placed.visual {
            Visual::TextBlock {
                text,
                font_family,
                font_size,
                font_weight,
                line_height,
                align,
                color,
            } => {
                // Text boxes hide overflow.
                let clip = write_clip(svg, index, placed, 0.0);
                let _ = write!(svg, "<g clip-path=\"url(#{clip})\">");
                let lines = wrap_text(text, *font_size, width);
                let (anchor, text_x) = match align {
                    TextAlign::Left => ("start", x),
                    TextAlign::Center => ("middle", x + width / 2.0),
                    TextAlign::Right => ("end", x + width),
                };
                let line_box = font_size * line_height;
                let first_baseline = y + (line_box - font_size) / 2.0 + font_size * ASCENT;
                let _ = write!(
                    svg,
                    "<text font-family=\"{}\" font-size=\"{font_size}\" font-weight=\"{font_weight}\" text-anchor=\"{anchor}\"{}>",
                    font_stack(font_family),
                    fill_attrs("fill", color),
                );
                for (line_index, line) in lines.iter().enumerate() {
                    #[allow(clippy::cast_precision_loss)]
                    let baseline = first_baseline + line_box * line_index as f32;
                    let _ = write!(
                        svg,
                        "<tspan x=\"{text_x}\" y=\"{baseline}\">{}</tspan>",
                        escape_xml(line)
                    );
                }
                svg.push_str("</text></g>");
            }

            Visual::ImagePlaceholder { border_radius } => {
                let rx = corner_radius(*border_radius, width, height);
                let _ = write!(
                    svg,
                    "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" rx=\"{rx}\" fill=\"#808080\" fill-opacity=\"0.1\" stroke=\"#808080\" stroke-opacity=\"0.3\" stroke-width=\"1\" stroke-dasharray=\"6 4\"/>",
                );
                let _ = write!(
                    svg,
                    "<text x=\"{}\" y=\"{}\" font-family=\"{GENERIC_FAMILY}\" font-size=\"14\" fill=\"#808080\" text-anchor=\"middle\">{IMAGE_PLACEHOLDER_LABEL}</text>",
                    x + width / 2.0,
                    y + height / 2.0 + 5.0,
                );
            }

            Visual::Image {
                src,
                fit,
                border_radius,
            } => {
                let Some(embedded) = load_embedded(src, self.config.asset_root.as_deref())? else {
                    return Ok(());
                };
                let clip = write_clip(svg, index, placed, *border_radius);
                let _ = write!(svg, "<g clip-path=\"url(#{clip})\">");
                let (ix, iy, iw, ih, aspect) = match fit {
                    ObjectFit::Cover => (x, y, width, height, "xMidYMid slice"),
                    ObjectFit::Contain => (x, y, width, height, "xMidYMid meet"),
                    ObjectFit::Fill => (x, y, width, height, "none"),
                    ObjectFit::None => {
                        #[allow(clippy::cast_precision_loss)]
                        let (nw, nh) = (embedded.width as f32, embedded.height as f32);
                        (x + (width - nw) / 2.0, y + (height - nh) / 2.0, nw, nh, "none")
                    }
                };
                let _ = write!(
                    svg,
                    "<image x=\"{ix}\" y=\"{iy}\" width=\"{iw}\" height=\"{ih}\" preserveAspectRatio=\"{aspect}\" href=\"{}\"/></g>",
                    embedded.href,
                );
            }

            Visual::Pill {
                text,
                font_family,
                font_size,
                font_weight,
                background,
                text_color,
                border_color,
                border_radius,
                padding_x: _,
                padding_y: _,
            } => {
                let rx = corner_radius(*border_radius, width, height);
                // The 1px border sits inside the box, like CSS border-box sizing.
                let _ = write!(
                    svg,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{rx}\"{}{} stroke-width=\"1\"/>",
                    x + 0.5,
                    y + 0.5,
                    (width - 1.0).max(0.0),
                    (height - 1.0).max(0.0),
                    fill_attrs("fill", background),
                    fill_attrs("stroke", border_color),
                );
                let clip = write_clip(svg, index, placed, *border_radius);
                let _ = write!(
                    svg,
                    "<g clip-path=\"url(#{clip})\"><text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{font_size}\" font-weight=\"{font_weight}\" text-anchor=\"middle\"{}>{}</text></g>",
                    x + width / 2.0,
                    y + height / 2.0 + font_size * (ASCENT - 0.5),
                    font_stack(font_family),
                    fill_attrs("fill", text_color),
                    escape_xml(&text.replace('\n', " ")),
                );
            }

            Visual::Panel {
                background,
                border_color,
                border_width,
                border_radius,
                opacity,
            } => {
                let rx = corner_radius(*border_radius, width, height);
                let _ = write!(svg, "<g opacity=\"{}\">", opacity.clamp(0.0, 1.0));
                let _ = write!(
                    svg,
                    "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" rx=\"{rx}\"{}/>",
                    fill_attrs("fill", background),
                );
                if *border_width > 0.0 {
                    let inset = border_width / 2.0;
                    let _ = write!(
                        svg,
                        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"none\"{} stroke-width=\"{border_width}\"/>",
                        x + inset,
                        y + inset,
                        (width - border_width).max(0.0),
                        (height - border_width).max(0.0),
                        (rx - inset).max(0.0),
                        fill_attrs("stroke", border_color),
                    );
                }
                svg.push_str("</g>");
            }
        }
        Ok(())
    }
}

/// Paint the full canvas with the template background.
fn write_background(svg: &mut String, background: &str) {
    let paint = parse_paint(background).unwrap_or_else(|| {
        tracing::warn!("Unsupported canvas background {background:?}, using black");
        Paint::Solid(Color::BLACK)
    });
    match paint {
        Paint::Solid(color) => {
            let _ = write!(
                svg,
                "<rect width=\"{CANVAS_WIDTH}\" height=\"{CANVAS_HEIGHT}\" fill=\"{}\" fill-opacity=\"{}\"/>",
                color.to_hex(),
                color.a,
            );
        }
        Paint::Linear(gradient) => {
            write_gradient_def(svg, "background", &gradient);
            let _ = write!(
                svg,
                "<rect width=\"{CANVAS_WIDTH}\" height=\"{CANVAS_HEIGHT}\" fill=\"url(#background)\"/>",
            );
        }
    }
}

fn write_gradient_def(svg: &mut String, id: &str, gradient: &LinearGradient) {
    let (x1, y1, x2, y2) = gradient.line_for(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT);
    let _ = write!(
        svg,
        "<defs><linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\">",
    );
    for stop in &gradient.stops {
        let _ = write!(
            svg,
            "<stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{}\"/>",
            stop.offset,
            stop.color.to_hex(),
            stop.color.a,
        );
    }
    svg.push_str("</linearGradient></defs>");
}

/// Define a clip path for an element box and return its id.
fn write_clip(svg: &mut String, index: usize, placed: &PlacedVisual, radius: f32) -> String {
    let id = format!("clip-{index}");
    let Position { x, y } = placed.position;
    let Size { width, height } = placed.size;
    let rx = corner_radius(radius, width, height);
    let _ = write!(
        svg,
        "<defs><clipPath id=\"{id}\"><rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" rx=\"{rx}\"/></clipPath></defs>",
    );
    id
}

/// CSS clamps radii so opposite corners never overlap.
fn corner_radius(radius: f32, width: f32, height: f32) -> f32 {
    radius.min(width / 2.0).min(height / 2.0).max(0.0)
}

/// `name="#rrggbb" name-opacity="a"` for a CSS color, or `name="none"`.
fn fill_attrs(name: &str, css: &str) -> String {
    match Color::parse(css) {
        Some(color) if !color.is_transparent() => {
            format!(" {name}=\"{}\" {name}-opacity=\"{}\"", color.to_hex(), color.a)
        }
        Some(_) => format!(" {name}=\"none\""),
        None => {
            tracing::warn!("Unsupported color {css:?}, leaving {name} unpainted");
            format!(" {name}=\"none\"")
        }
    }
}

fn font_stack(family: &str) -> String {
    let family = family.trim();
    if family.is_empty() {
        return GENERIC_FAMILY.to_string();
    }
    format!("'{}', {GENERIC_FAMILY}", escape_xml(family))
}

/// Greedy word wrap against an estimated glyph width.
///
/// Explicit newlines always break. Words wider than the box are split.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let glyph = (font_size * AVERAGE_GLYPH_WIDTH).max(1.0);
    let max_chars = ((max_width / glyph).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                let chunk: String = chunk.iter().collect();
                let chunk_len = chunk.chars().count();
                if current_len == 0 {
                    current = chunk;
                    current_len = chunk_len;
                } else if current_len + 1 + chunk_len <= max_chars {
                    current.push(' ');
                    current.push_str(&chunk);
                    current_len += 1 + chunk_len;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current = chunk;
                    current_len = chunk_len;
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
