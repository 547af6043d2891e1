//! Image handling and page assembly.
//!
//! The OCR API returns Markdown whose figures point at bare image ids
//! (`![img-0.jpeg](img-0.jpeg)`), with the actual pixels shipped alongside
//! as base64. Before the document is usable those references must be
//! resolved one of three ways ([`ImageHandling`]): inlined as `data:` URIs,
//! stripped, or decoded to files with the links rewritten.

use crate::config::{ImageHandling, PageSeparator};
use crate::error::OcrError;
use crate::output::PageText;
use crate::pipeline::api::OcrImage;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::warn;

/// Apply the configured image handling to one page's Markdown.
pub fn apply_image_handling(
    markdown: &str,
    images: &[OcrImage],
    handling: &ImageHandling,
) -> Result<String, OcrError> {
    match handling {
        ImageHandling::Inline => Ok(inline_images(markdown, images)),
        ImageHandling::Strip => Ok(strip_images(markdown)),
        ImageHandling::SaveTo(dir) => save_images(markdown, images, dir),
    }
}

/// Rewrite image references to `data:` URIs.
///
/// Both reference shapes the API has been observed to emit are handled:
/// `![id](id)` (current) and `![id]()` (older responses). Images without a
/// base64 payload are left untouched.
pub fn inline_images(markdown: &str, images: &[OcrImage]) -> String {
    let mut result = markdown.to_string();
    for img in images {
        let Some(ref b64) = img.image_base64 else {
            continue;
        };
        let uri = to_data_uri(&img.id, b64);
        result = result.replace(
            &format!("![{}]({})", img.id, img.id),
            &format!("![{}]({})", img.id, uri),
        );
        result = result.replace(
            &format!("![{}]()", img.id),
            &format!("![{}]({})", img.id, uri),
        );
    }
    result
}

static RE_IMAGE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)\n?").unwrap());

/// Remove all image links from the Markdown.
pub fn strip_images(markdown: &str) -> String {
    RE_IMAGE_LINK.replace_all(markdown, "").to_string()
}

/// Decode images into `dir` and rewrite references to relative paths.
///
/// The image id doubles as the file name (the API already suffixes it with
/// the format, e.g. `img-0.jpeg`). Undecodable payloads are skipped with a
/// warning rather than failing the page.
pub fn save_images(
    markdown: &str,
    images: &[OcrImage],
    dir: &Path,
) -> Result<String, OcrError> {
    std::fs::create_dir_all(dir).map_err(|e| OcrError::ImageWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut result = markdown.to_string();
    for img in images {
        let Some(ref b64) = img.image_base64 else {
            continue;
        };
        let payload = strip_data_uri_prefix(b64);
        let bytes = match base64::engine::general_purpose::STANDARD.decode(payload) {
            Ok(b) => b,
            Err(e) => {
                warn!("Skipping image '{}': base64 decode failed: {}", img.id, e);
                continue;
            }
        };

        let file_path = dir.join(&img.id);
        std::fs::write(&file_path, bytes).map_err(|e| OcrError::ImageWriteFailed {
            path: file_path.clone(),
            source: e,
        })?;

        let rel = file_path.to_string_lossy().to_string();
        result = result.replace(
            &format!("![{}]({})", img.id, img.id),
            &format!("![{}]({})", img.id, rel),
        );
        result = result.replace(
            &format!("![{}]()", img.id),
            &format!("![{}]({})", img.id, rel),
        );
    }
    Ok(result)
}

/// Join per-page Markdown into the final document.
pub fn join_pages(pages: &[PageText], separator: &PageSeparator) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(pages.len() * 2);
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            parts.push(separator.render(page.page_num));
        }
        parts.push(page.markdown.trim_end().to_string());
    }
    parts.join("")
}

/// Infer a MIME type from the image id's extension; the API names ids like
/// `img-0.jpeg`.
fn to_data_uri(id: &str, b64: &str) -> String {
    if b64.starts_with("data:") {
        return b64.to_string();
    }
    let mime = match Path::new(id).extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    format!("data:{mime};base64,{b64}")
}

fn strip_data_uri_prefix(b64: &str) -> &str {
    match b64.find(";base64,") {
        Some(pos) if b64.starts_with("data:") => &b64[pos + ";base64,".len()..],
        _ => b64,
    }
}
