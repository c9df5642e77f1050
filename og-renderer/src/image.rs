//! Image sources for export.
//!
//! Image elements may point at a base64 or percent-encoded data URI, or at a
//! local file. Either way the bytes are embedded into the SVG as a base64 data
//! URI so the document is self-contained. Remote URLs are not fetched.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;

use crate::error::{RenderError, RenderResult};

const SRC_PREVIEW_LEN: usize = 48;

/// Where an image element's `src` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Inline `data:` URI.
    DataUri(&'a str),
    /// `http(s)://` URL, skipped at export time.
    Remote(&'a str),
    /// File on disk.
    File(PathBuf),
}

impl<'a> ImageSource<'a> {
    /// Classify `src`. Relative paths are resolved against `asset_root` when given.
    #[must_use]
    pub fn classify(src: &'a str, asset_root: Option<&Path>) -> Self {
        let trimmed = src.trim();
        if trimmed.starts_with("data:") {
            return Self::DataUri(trimmed);
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::Remote(trimmed);
        }
        let path = Path::new(trimmed.strip_prefix("file://").unwrap_or(trimmed));
        match asset_root {
            Some(root) if path.is_relative() => Self::File(root.join(path)),
            _ => Self::File(path.to_path_buf()),
        }
    }
}

/// An image ready to be referenced from SVG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Base64 data URI.
    pub href: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
}

/// Load and embed an image. Returns `Ok(None)` for remote sources.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the bytes are not a supported image.
pub fn load_embedded(src: &str, asset_root: Option<&Path>) -> RenderResult<Option<EmbeddedImage>> {
    let bytes = match ImageSource::classify(src, asset_root) {
        ImageSource::Remote(url) => {
            tracing::warn!(
                "Skipping remote image {url}; only data URIs and local files are embedded"
            );
            return Ok(None);
        }
        ImageSource::DataUri(uri) => decode_data_uri(uri)?,
        ImageSource::File(path) => std::fs::read(&path)?,
    };
    embed_bytes(src, &bytes).map(Some)
}

fn embed_bytes(src: &str, bytes: &[u8]) -> RenderResult<EmbeddedImage> {
    let format = image::guess_format(bytes).map_err(|e| image_error(src, &e))?;
    let (width, height) = image::ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| image_error(src, &e))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(EmbeddedImage {
        href: format!("data:{};base64,{encoded}", format.to_mime_type()),
        width,
        height,
    })
}

/// Decode the payload of a data URI.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns an error if the URI is malformed or the payload cannot be decoded.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let Some(uri_data) = uri.strip_prefix("data:") else {
        return Err(image_error(uri, &"not a data URI"));
    };
    let (metadata, payload) = uri_data
        .split_once(',')
        .ok_or_else(|| image_error(uri, &"missing comma"))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| image_error(uri, &e))
    } else {
        percent_decode(payload).ok_or_else(|| image_error(uri, &"invalid percent-encoding"))
    }
}

fn percent_decode(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            result.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Some(result)
}

fn image_error(src: &str, message: &dyn std::fmt::Display) -> RenderError {
    let src = if src.len() > SRC_PREVIEW_LEN {
        let cut = (0..=SRC_PREVIEW_LEN)
            .rev()
            .find(|i| src.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &src[..cut])
    } else {
        src.to_string()
    };
    RenderError::Image {
        src,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 red PNG.
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_classify() {
        let root = Path::new("/assets");
        assert!(matches!(
            ImageSource::classify("data:image/png;base64,AAAA", Some(root)),
            ImageSource::DataUri(_)
        ));
        assert!(matches!(
            ImageSource::classify("HTTPS://example.com/a.png", Some(root)),
            ImageSource::Remote(_)
        ));
        assert_eq!(
            ImageSource::classify("logo.png", Some(root)),
            ImageSource::File(PathBuf::from("/assets/logo.png"))
        );
        assert_eq!(
            ImageSource::classify("/abs/logo.png", Some(root)),
            ImageSource::File(PathBuf::from("/abs/logo.png"))
        );
    }

    #[test]
    fn test_embed_data_uri() {
        let uri = format!("data:image/png;base64,{PNG_BASE64}");
        let embedded = load_embedded(&uri, None).expect("load").expect("embedded");
        assert_eq!((embedded.width, embedded.height), (1, 1));
        assert!(embedded.href.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_embed_local_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(PNG_BASE64)
            .expect("fixture");
        std::fs::write(dir.path().join("dot.png"), bytes).expect("write");

        let embedded = load_embedded("dot.png", Some(dir.path()))
            .expect("load")
            .expect("embedded");
        assert_eq!(embedded.width, 1);
    }

    #[test]
    fn test_remote_is_skipped() {
        assert_eq!(load_embedded("https://example.com/a.png", None).expect("ok"), None);
    }

    #[test]
    fn test_bad_sources() {
        assert!(matches!(
            load_embedded("data:image/png", None),
            Err(RenderError::Image { .. })
        ));
        assert!(matches!(
            load_embedded("data:text/plain,hello", None),
            Err(RenderError::Image { .. })
        ));
        assert!(matches!(
            load_embedded("/definitely/not/here.png", None),
            Err(RenderError::Io(_))
        ));
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            decode_data_uri("data:text/plain,a%20b").expect("decode"),
            b"a b".to_vec()
        );
        assert!(decode_data_uri("data:text/plain,%zz").is_err());
    }
}
