//! Configuration types for OCR conversion.
//!
//! All behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across calls and to diff two runs to understand
//! why their outputs differ.
//!
//! The API key deliberately does **not** appear in the `Debug` output — a
//! config struct ends up in logs far too easily for a secret to live there
//! in plain text.

use crate::error::OcrError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default vendor endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Default OCR model identifier.
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";

/// Configuration for a PDF-to-Markdown OCR conversion.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .model("mistral-ocr-latest")
///     .api_timeout_secs(180)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Explicit API key. Takes precedence over `MISTRAL_API_KEY` and the
    /// key store. If all three sources are empty, conversion fails with
    /// [`OcrError::MissingApiKey`] before any request is made.
    pub api_key: Option<String>,

    /// OCR model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API base URL. Default: [`DEFAULT_BASE_URL`]. Override for proxies or
    /// a mock server in tests.
    pub base_url: String,

    /// How to handle images the API embeds in the returned Markdown.
    /// Default: [`ImageHandling::Inline`].
    pub images: ImageHandling,

    /// Page separator in the assembled output. Default: [`PageSeparator::None`]
    /// (pages joined with a blank line).
    pub page_separator: PageSeparator,

    /// Signed-URL lifetime requested from the API, in hours. Default: 1.
    ///
    /// The URL only needs to survive the single `/v1/ocr` call that follows
    /// the upload, so the shortest lifetime the API accepts is the right one.
    pub signed_url_expiry_hours: u32,

    /// Timeout for the upload and OCR calls, in seconds. Default: 300.
    ///
    /// OCR of a long document is a single blocking request on the vendor
    /// side; 300 s covers several hundred pages. No retry is attempted on
    /// timeout.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for phase events.
    pub progress: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            images: ImageHandling::default(),
            page_separator: PageSeparator::default(),
            signed_url_expiry_hours: 1,
            api_timeout_secs: 300,
            download_timeout_secs: 120,
            progress: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("images", &self.images)
            .field("page_separator", &self.page_separator)
            .field("signed_url_expiry_hours", &self.signed_url_expiry_hours)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn images(mut self, handling: ImageHandling) -> Self {
        self.config.images = handling;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn signed_url_expiry_hours(mut self, hours: u32) -> Self {
        self.config.signed_url_expiry_hours = hours.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn progress(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, OcrError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(OcrError::InvalidConfig("Model must not be empty".into()));
        }
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(OcrError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if let Some(ref key) = c.api_key {
            if key.trim().is_empty() {
                return Err(OcrError::InvalidConfig(
                    "API key must not be empty (omit it to use the env var or key store)".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How to handle the base64 page images the OCR API returns.
///
/// The API replaces each figure in the source document with a Markdown image
/// link whose target is an image id, and ships the pixel data separately as
/// base64. Three placements make sense downstream:
///
/// | Variant | Use case |
/// |---------|----------|
/// | `Inline` | Self-contained `.md` / browser preview (default) |
/// | `Strip`  | Plain-text pipelines where images are noise |
/// | `SaveTo` | Publishing, where a `data:` URI of several MB per figure is unacceptable |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageHandling {
    /// Rewrite image links to `data:image/…;base64,` URIs. (default)
    #[default]
    Inline,
    /// Remove image links from the Markdown entirely.
    Strip,
    /// Decode images into this directory and rewrite links to relative paths.
    SaveTo(PathBuf),
}

/// How to separate pages in the assembled Markdown output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string for the given page number (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}
