//! Font registry and the async loading seam.
//!
//! The registry is global to the editor (not owned by any template) and keeps
//! families unique. Fetching font resources is delegated to a [`FontLoader`]
//! so the registry itself never performs I/O.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FontError;

/// Weights requested when a caller does not specify any.
pub const DEFAULT_WEIGHTS: [u16; 4] = [400, 500, 600, 700];

const GOOGLE_FONTS_CSS: &str = "https://fonts.googleapis.com/css2";

/// Where a font comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSource {
    /// Shipped with the application.
    Bundled,
    /// Fetched from Google Fonts on demand.
    Google,
}

/// A font family known to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    /// CSS family name, unique within the registry.
    pub family: String,
    /// Origin of the font.
    pub source: FontSource,
    /// Available weights.
    pub weights: Vec<u16>,
    /// Whether the font resources are available for rendering.
    pub loaded: bool,
}

impl Font {
    fn bundled(family: &str, weights: &[u16], loaded: bool) -> Self {
        Self {
            family: family.to_string(),
            source: FontSource::Bundled,
            weights: weights.to_vec(),
            loaded,
        }
    }
}

/// Fonts available out of the box.
#[must_use]
pub fn default_fonts() -> Vec<Font> {
    vec![
        Font::bundled("Inter", &DEFAULT_WEIGHTS, true),
        Font::bundled("Against", &[400], false),
        Font::bundled("Pretendard", &DEFAULT_WEIGHTS, false),
        Font::bundled("Zilla Slab", &DEFAULT_WEIGHTS, false),
    ]
}

/// Google Fonts stylesheet URL for a family and weight set.
#[must_use]
pub fn google_stylesheet_url(family: &str, weights: &[u16]) -> String {
    let family: String = url::form_urlencoded::byte_serialize(family.as_bytes()).collect();
    let weights = weights
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(";");
    format!("{GOOGLE_FONTS_CSS}?family={family}:wght@{weights}&display=swap")
}

/// A request to fetch one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRequest {
    /// Family name.
    pub family: String,
    /// Weights to fetch.
    pub weights: Vec<u16>,
    /// Stylesheet describing the faces.
    pub stylesheet_url: String,
}

impl FontRequest {
    /// Build a Google Fonts request.
    #[must_use]
    pub fn google(family: impl Into<String>, weights: &[u16]) -> Self {
        let family = family.into();
        let stylesheet_url = google_stylesheet_url(&family, weights);
        Self {
            family,
            weights: weights.to_vec(),
            stylesheet_url,
        }
    }
}

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFont {
    /// Family name.
    pub family: String,
    /// Weights that were requested.
    pub weights: Vec<u16>,
    /// Number of font faces made available.
    pub faces: usize,
}

/// Fetches font resources. Implementations perform the network and disk work.
#[async_trait]
pub trait FontLoader: Send + Sync {
    /// Fetch the family described by `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`FontError`] when the resources cannot be fetched or stored.
    async fn load(&self, request: &FontRequest) -> Result<LoadedFont, FontError>;
}

/// Outcome of asking the editor to load a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontLoadOutcome {
    /// The family was fetched and registered.
    Loaded(LoadedFont),
    /// The family was already registered; nothing was fetched.
    AlreadyPresent,
}

/// Set of known font families.
///
/// Serializes as a plain list. Deserializing goes through [`FontRegistry::from_fonts`],
/// so a hand-edited list with repeated families still loads with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Font>", into = "Vec<Font>")]
pub struct FontRegistry {
    fonts: Vec<Font>,
}

impl From<Vec<Font>> for FontRegistry {
    fn from(fonts: Vec<Font>) -> Self {
        Self::from_fonts(fonts)
    }
}

impl From<FontRegistry> for Vec<Font> {
    fn from(registry: FontRegistry) -> Self {
        registry.fonts
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self {
            fonts: default_fonts(),
        }
    }
}

impl FontRegistry {
    /// Registry seeded from persisted fonts. Duplicate families keep their first entry.
    #[must_use]
    pub fn from_fonts(fonts: Vec<Font>) -> Self {
        let mut registry = Self { fonts: Vec::new() };
        for font in fonts {
            if !registry.contains(&font.family) {
                registry.fonts.push(font);
            }
        }
        registry
    }

    /// All fonts, bundled first in registration order.
    #[must_use]
    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    /// Whether `family` is registered.
    #[must_use]
    pub fn contains(&self, family: &str) -> bool {
        self.get(family).is_some()
    }

    /// Look up a family.
    #[must_use]
    pub fn get(&self, family: &str) -> Option<&Font> {
        self.fonts.iter().find(|f| f.family == family)
    }

    /// Add a Google font in the not-yet-loaded state. Returns `false` if the family exists.
    pub fn add_google(&mut self, family: &str, weights: &[u16]) -> bool {
        if self.contains(family) {
            return false;
        }
        self.fonts.push(Font {
            family: family.to_string(),
            source: FontSource::Google,
            weights: weights.to_vec(),
            loaded: false,
        });
        true
    }

    /// Set the `loaded` flag of a family. Returns `false` if the family is unknown.
    pub fn set_loaded(&mut self, family: &str, loaded: bool) -> bool {
        match self.fonts.iter_mut().find(|f| f.family == family) {
            Some(font) => {
                font.loaded = loaded;
                true
            }
            None => false,
        }
    }

    /// Record a completed load: add the family if missing, then mark it loaded.
    pub fn register_loaded(&mut self, loaded: &LoadedFont) {
        self.add_google(&loaded.family, &loaded.weights);
        self.set_loaded(&loaded.family, true);
    }

    /// Google fonts persisted as registered but not yet loaded.
    pub fn pending_google(&self) -> impl Iterator<Item = &Font> {
        self.fonts
            .iter()
            .filter(|f| f.source == FontSource::Google && !f.loaded)
    }

    /// Mark every Google font as not loaded, so a new session fetches them again.
    pub fn reset_google_loaded(&mut self) {
        for font in &mut self.fonts {
            if font.source == FontSource::Google {
                font.loaded = false;
            }
        }
    }
}

/// Fetch `family` through `loader` unless the registry already knows it.
///
/// On success the family is registered as loaded. On failure the registry is left
/// untouched and the error is returned; there is no retry.
///
/// # Errors
///
/// Returns the loader's [`FontError`].
pub async fn load_font(
    registry: &mut FontRegistry,
    loader: &dyn FontLoader,
    family: &str,
    weights: &[u16],
) -> Result<FontLoadOutcome, FontError> {
    if registry.contains(family) {
        tracing::debug!("Font {family} already registered");
        return Ok(FontLoadOutcome::AlreadyPresent);
    }

    let request = FontRequest::google(family, weights);
    match loader.load(&request).await {
        Ok(loaded) => {
            tracing::info!("Loaded font {} ({} faces)", loaded.family, loaded.faces);
            registry.register_loaded(&loaded);
            Ok(FontLoadOutcome::Loaded(loaded))
        }
        Err(e) => {
            tracing::error!("Failed to load font {family}: {e}");
            Err(e)
        }
    }
}
