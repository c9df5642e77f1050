//! Google Fonts loader for the command-line studio.
//!
//! Fetches the css2 stylesheet for a family, downloads every face it declares
//! and stores the files under the studio's font directory, where the PNG
//! exporter picks them up.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use og_core::{FontError, FontLoader, FontRequest, LoadedFont};
use regex::Regex;
use reqwest::Client;
use url::Url;

static FONT_FACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@font-face\s*\{([^}]*)\}").expect("font-face pattern is valid"));

static FONT_WEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-weight:\s*(\d+)").expect("weight pattern is valid"));

static FACE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src:\s*url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("url pattern is valid")
});

/// One downloadable face declared by a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSource {
    /// Declared weight, if any.
    pub weight: Option<u16>,
    /// Absolute URL of the font file.
    pub url: Url,
}

/// Extract the faces declared by a Google Fonts stylesheet.
///
/// Relative `url(...)` values are resolved against `stylesheet_url`.
#[must_use]
pub fn parse_stylesheet(css: &str, stylesheet_url: &Url) -> Vec<FaceSource> {
    FONT_FACE
        .captures_iter(css)
        .filter_map(|block| {
            let body = block.get(1)?.as_str();
            let src = FACE_URL.captures(body)?.get(1)?.as_str().trim();
            let url = stylesheet_url.join(src).ok()?;
            let weight = FONT_WEIGHT
                .captures(body)
                .and_then(|c| c.get(1))
                .and_then(|w| w.as_str().parse().ok());
            Some(FaceSource { weight, url })
        })
        .collect()
}

/// Fetches Google fonts over HTTP and caches the faces on disk.
#[derive(Debug, Clone)]
pub struct GoogleFontsLoader {
    http: Client,
    fonts_dir: PathBuf,
    base_url: Option<Url>,
}

impl GoogleFontsLoader {
    /// Create a loader that stores faces in `fonts_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Http`] if the HTTP client cannot be built.
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Result<Self, FontError> {
        // Google serves TrueType to user agents it does not recognise, which
        // is the format the rasterizer can read.
        let http = Client::builder()
            .user_agent(concat!("og-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FontError::Http(e.to_string()))?;

        Ok(Self {
            http,
            fonts_dir: fonts_dir.into(),
            base_url: None,
        })
    }

    /// Send stylesheet requests to `base_url` instead of the Google host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Directory holding downloaded faces.
    #[must_use]
    pub fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    /// Number of faces already on disk for `family`.
    #[must_use]
    pub fn cached_faces(&self, family: &str) -> usize {
        let prefix = format!("{}-", file_stem(family));
        std::fs::read_dir(&self.fonts_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
                    .count()
            })
            .unwrap_or(0)
    }

    fn stylesheet_url(&self, request: &FontRequest) -> Result<Url, FontError> {
        let url = Url::parse(&request.stylesheet_url).map_err(|e| FontError::Http(e.to_string()))?;
        let Some(ref base) = self.base_url else {
            return Ok(url);
        };
        let mut rewritten = base
            .join(url.path())
            .map_err(|e| FontError::Http(e.to_string()))?;
        rewritten.set_query(url.query());
        Ok(rewritten)
    }

    async fn get(&self, family: &str, url: Url) -> Result<reqwest::Response, FontError> {
        tracing::debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FontError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FontError::Status {
                family: family.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn face_path(&self, family: &str, face: &FaceSource, index: usize) -> PathBuf {
        let extension = Path::new(face.url.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("ttf");
        let weight = face.weight.map_or_else(|| "regular".to_string(), |w| w.to_string());
        let name = if index == 0 {
            format!("{}-{weight}.{extension}", file_stem(family))
        } else {
            format!("{}-{weight}-{index}.{extension}", file_stem(family))
        };
        self.fonts_dir.join(name)
    }
}

#[async_trait]
impl FontLoader for GoogleFontsLoader {
    async fn load(&self, request: &FontRequest) -> Result<LoadedFont, FontError> {
        let stylesheet_url = self.stylesheet_url(request)?;
        let css = self
            .get(&request.family, stylesheet_url.clone())
            .await?
            .text()
            .await
            .map_err(|e| FontError::Http(e.to_string()))?;

        let faces = parse_stylesheet(&css, &stylesheet_url);
        if faces.is_empty() {
            return Err(FontError::NoFaces(request.family.clone()));
        }

        tokio::fs::create_dir_all(&self.fonts_dir).await?;
        let mut seen: Vec<Option<u16>> = Vec::with_capacity(faces.len());
        for face in &faces {
            let index = seen.iter().filter(|w| **w == face.weight).count();
            seen.push(face.weight);

            let bytes = self
                .get(&request.family, face.url.clone())
                .await?
                .bytes()
                .await
                .map_err(|e| FontError::Http(e.to_string()))?;
            let path = self.face_path(&request.family, face, index);
            tokio::fs::write(&path, &bytes).await?;
            tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        }

        Ok(LoadedFont {
            family: request.family.clone(),
            weights: request.weights.clone(),
            faces: faces.len(),
        })
    }
}

fn file_stem(family: &str) -> String {
    family
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS: &str = r"
/* latin */
@font-face {
  font-family: 'Roboto';
  font-style: normal;
  font-weight: 400;
  src: url(https://fonts.gstatic.com/s/roboto/v30/regular.ttf) format('truetype');
}
@font-face {
  font-family: 'Roboto';
  font-weight: 700;
  src: url('/s/roboto/bold.ttf') format('truetype');
}
";

    #[test]
    fn test_parse_stylesheet() {
        let base = Url::parse("https://fonts.googleapis.com/css2?family=Roboto").expect("url");
        let faces = parse_stylesheet(CSS, &base);
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].weight, Some(400));
        assert_eq!(
            faces[0].url.as_str(),
            "https://fonts.gstatic.com/s/roboto/v30/regular.ttf"
        );
        assert_eq!(faces[1].weight, Some(700));
        assert_eq!(
            faces[1].url.as_str(),
            "https://fonts.googleapis.com/s/roboto/bold.ttf"
        );
    }

    #[test]
    fn test_parse_stylesheet_without_faces() {
        let base = Url::parse("https://fonts.googleapis.com/css2").expect("url");
        assert!(parse_stylesheet("body { color: red; }", &base).is_empty());
    }

    #[test]
    fn test_face_paths() {
        let loader = GoogleFontsLoader::new("/fonts").expect("loader");
        let face = FaceSource {
            weight: Some(700),
            url: Url::parse("https://example.com/a/b.woff2").expect("url"),
        };
        assert_eq!(
            loader.face_path("Open Sans", &face, 0),
            PathBuf::from("/fonts/Open_Sans-700.woff2")
        );
        let unweighted = FaceSource {
            weight: None,
            url: Url::parse("https://example.com/face").expect("url"),
        };
        assert_eq!(
            loader.face_path("Inter", &unweighted, 2),
            PathBuf::from("/fonts/Inter-regular-2.ttf")
        );
    }

    #[test]
    fn test_stylesheet_url_rewrite() {
        let loader = GoogleFontsLoader::new("/fonts")
            .expect("loader")
            .with_base_url(Url::parse("http://127.0.0.1:9000").expect("url"));
        let request = FontRequest::google("Roboto", &[400]);
        let url = loader.stylesheet_url(&request).expect("url");
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.path(), "/css2");
        assert!(url.query().is_some_and(|q| q.contains("family=Roboto")));
    }

    #[test]
    fn test_cached_faces() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Open_Sans-400.ttf"), b"x").expect("write");
        std::fs::write(dir.path().join("Open_Sans-700.ttf"), b"x").expect("write");
        std::fs::write(dir.path().join("Inter-400.ttf"), b"x").expect("write");

        let loader = GoogleFontsLoader::new(dir.path()).expect("loader");
        assert_eq!(loader.cached_faces("Open Sans"), 2);
        assert_eq!(loader.cached_faces("Roboto"), 0);
    }
}
