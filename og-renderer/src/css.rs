//! The small subset of CSS paint syntax that templates use.
//!
//! Colors are anything `csscolorparser` understands: hex, the functional
//! notations and the full named color table. Backgrounds also accept
//! `linear-gradient(...)` with an angle or `to <side>` direction.

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha in `[0, 1]`.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0.0);

    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 1.0);

    /// Build a color from channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color value.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let [r, g, b, a] = csscolorparser::parse(input.trim()).ok()?.to_rgba8();
        Some(Self::rgba(r, g, b, f32::from(a) / 255.0))
    }

    /// `#rrggbb` form, without alpha.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Whether the color is fully transparent.
    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.a <= 0.0
    }
}

/// A color stop with a resolved offset in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Stop color.
    pub color: Color,
    /// Offset along the gradient line.
    pub offset: f32,
}

/// A CSS `linear-gradient`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    /// CSS angle in degrees: 0 points up, increasing clockwise.
    pub angle: f32,
    /// At least two stops, offsets non-decreasing.
    pub stops: Vec<ColorStop>,
}

impl LinearGradient {
    /// Endpoints `(x1, y1, x2, y2)` of the gradient line for a box, following the
    /// CSS rule that the corners land exactly on the first and last stop.
    #[must_use]
    pub fn line_for(&self, x: f32, y: f32, width: f32, height: f32) -> (f32, f32, f32, f32) {
        let radians = self.angle.to_radians();
        let (dx, dy) = (radians.sin(), -radians.cos());
        let length = (width * dx).abs() + (height * dy).abs();
        let (cx, cy) = (x + width / 2.0, y + height / 2.0);
        let half = length / 2.0;
        (cx - dx * half, cy - dy * half, cx + dx * half, cy + dy * half)
    }
}

/// A parsed background value.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// Single color.
    Solid(Color),
    /// Linear gradient.
    Linear(LinearGradient),
}

/// Parse a background value: a color or a `linear-gradient(...)`.
#[must_use]
pub fn parse_paint(input: &str) -> Option<Paint> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    match split_function(&lower) {
        Some(("linear-gradient", args)) => parse_linear_gradient(&args).map(Paint::Linear),
        _ => Color::parse(trimmed).map(Paint::Solid),
    }
}

/// Split `name(args)` into the name and its top-level arguments.
fn split_function(input: &str) -> Option<(&str, Vec<String>)> {
    let open = input.find('(')?;
    let body = input.strip_suffix(')')?;
    let name = input[..open].trim();
    let inner = &body[open + 1..];
    Some((name, split_top_level(inner)))
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn parse_direction(arg: &str) -> Option<f32> {
    let arg = arg.trim().to_ascii_lowercase();
    if let Some(side) = arg.strip_prefix("to ") {
        let mut words: Vec<&str> = side.split_whitespace().collect();
        words.sort_unstable();
        return match words.as_slice() {
            ["top"] => Some(0.0),
            ["right", "top"] => Some(45.0),
            ["right"] => Some(90.0),
            ["bottom", "right"] => Some(135.0),
            ["bottom"] => Some(180.0),
            ["bottom", "left"] => Some(225.0),
            ["left"] => Some(270.0),
            ["left", "top"] => Some(315.0),
            _ => None,
        };
    }
    if let Some(deg) = arg.strip_suffix("deg") {
        return deg.trim().parse().ok();
    }
    if let Some(turn) = arg.strip_suffix("turn") {
        return turn.trim().parse::<f32>().ok().map(|t| t * 360.0);
    }
    if let Some(rad) = arg.strip_suffix("rad") {
        return rad.trim().parse::<f32>().ok().map(f32::to_degrees);
    }
    None
}

/// A stop is `<color> [<percent>]`. Colors may contain spaces inside parentheses.
fn parse_stop(arg: &str) -> Option<(Color, Option<f32>)> {
    if let Some(color) = Color::parse(arg) {
        return Some((color, None));
    }
    let (color, position) = arg.rsplit_once(char::is_whitespace)?;
    let offset = position.trim().strip_suffix('%')?.parse::<f32>().ok()? / 100.0;
    Some((Color::parse(color)?, Some(offset.clamp(0.0, 1.0))))
}

fn parse_linear_gradient(args: &[String]) -> Option<LinearGradient> {
    let (angle, stop_args) = match args.first().and_then(|first| parse_direction(first)) {
        Some(angle) => (angle, &args[1..]),
        None => (180.0, args),
    };
    if stop_args.len() < 2 {
        return None;
    }

    let parsed: Vec<(Color, Option<f32>)> = stop_args
        .iter()
        .map(|arg| parse_stop(arg))
        .collect::<Option<_>>()?;

    let mut offsets: Vec<Option<f32>> = parsed.iter().map(|(_, offset)| *offset).collect();
    let last = offsets.len() - 1;
    if offsets[0].is_none() {
        offsets[0] = Some(0.0);
    }
    if offsets[last].is_none() {
        offsets[last] = Some(1.0);
    }

    // Unpositioned stops are spread evenly between their positioned neighbours.
    let mut index = 0;
    while index < last {
        let start = index;
        let mut end = index + 1;
        while offsets[end].is_none() {
            end += 1;
        }
        let from = offsets[start].unwrap_or(0.0);
        let to = offsets[end].unwrap_or(1.0).max(from);
        #[allow(clippy::cast_precision_loss)]
        let step = (to - from) / (end - start) as f32;
        for (k, slot) in offsets.iter_mut().enumerate().take(end).skip(start + 1) {
            #[allow(clippy::cast_precision_loss)]
            let distance = (k - start) as f32;
            *slot = Some(from + step * distance);
        }
        offsets[end] = Some(to);
        index = end;
    }

    let stops = parsed
        .iter()
        .zip(offsets)
        .map(|((color, _), offset)| ColorStop {
            color: *color,
            offset: offset.unwrap_or(0.0),
        })
        .collect();
    Some(LinearGradient { angle, stops })
}
