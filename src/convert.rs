//! Conversion entry points.
//!
//! One user action is one linear pass: resolve the input, resolve the key,
//! upload, request OCR, handle images, clean up, join pages. There is no
//! retry layer and no caching — a failed call surfaces its error and the
//! user decides what to do.

use crate::config::ConversionConfig;
use crate::error::OcrError;
use crate::keystore::KeyStore;
use crate::output::{ConversionOutput, ConversionStats, PageText};
use crate::pipeline::{api, assemble, input, postprocess};
use crate::progress::ConversionPhase;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file or URL to Markdown.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config`    — Conversion configuration
///
/// # Errors
/// - Input errors: file not found, not a PDF, download failure
/// - [`OcrError::MissingApiKey`] when no key is configured anywhere
/// - [`OcrError::AuthFailed`] / [`OcrError::Network`] / [`OcrError::Api`]
///   from the vendor calls
/// - [`OcrError::EmptyResponse`] when the API recognised zero pages
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, OcrError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let result = convert_inner(input_str, config, total_start).await;
    if let Err(ref e) = result {
        if let Some(ref cb) = config.progress {
            cb.on_error(&e.to_string());
        }
    }
    result
}

async fn convert_inner(
    input_str: &str,
    config: &ConversionConfig,
    total_start: Instant,
) -> Result<ConversionOutput, OcrError> {
    // ── Step 1: Resolve input ────────────────────────────────────────────
    phase(config, ConversionPhase::Resolving);
    let document = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let uploaded_bytes = document.bytes.len() as u64;

    // ── Step 2: Resolve credential ───────────────────────────────────────
    let api_key = resolve_api_key(config)?;
    let client = api::OcrApiClient::new(&api_key, &config.base_url, config.api_timeout_secs)?;

    // ── Step 3: Upload + signed URL ──────────────────────────────────────
    phase(config, ConversionPhase::Uploading);
    let upload_start = Instant::now();
    let uploaded = client.upload(&document.file_name, document.bytes).await?;
    let document_url = client
        .signed_url(&uploaded.id, config.signed_url_expiry_hours)
        .await?;
    let upload_ms = upload_start.elapsed().as_millis() as u64;
    debug!("Upload + signed URL took {}ms", upload_ms);

    // ── Step 4: OCR request ──────────────────────────────────────────────
    phase(config, ConversionPhase::Processing);
    let ocr_start = Instant::now();
    let include_images = config.images != crate::config::ImageHandling::Strip;
    let response = client
        .process(&document_url, &config.model, include_images)
        .await?;
    let ocr_ms = ocr_start.elapsed().as_millis() as u64;

    if response.pages.is_empty() {
        return Err(OcrError::EmptyResponse);
    }

    // ── Step 5: Image handling + cleanup ─────────────────────────────────
    phase(config, ConversionPhase::Assembling);
    let mut pages: Vec<PageText> = Vec::with_capacity(response.pages.len());
    for page in &response.pages {
        let with_images =
            assemble::apply_image_handling(&page.markdown, &page.images, &config.images)?;
        pages.push(PageText {
            page_num: page.index + 1,
            markdown: postprocess::clean_markdown(&with_images),
            image_count: page.images.len(),
        });
    }
    pages.sort_by_key(|p| p.page_num);

    // ── Step 6: Assemble final document ──────────────────────────────────
    let joined = assemble::join_pages(&pages, &config.page_separator);
    let markdown = postprocess::clean_markdown(&joined);

    let stats = ConversionStats {
        page_count: pages.len(),
        uploaded_bytes,
        upload_ms,
        ocr_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {}ms total",
        stats.page_count, stats.total_ms
    );

    if let Some(ref cb) = config.progress {
        cb.on_complete(stats.page_count);
    }

    Ok(ConversionOutput {
        markdown,
        pages,
        stats,
    })
}

/// Convert a PDF and write the Markdown directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, OcrError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OcrError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &output.markdown)
        .await
        .map_err(|e| OcrError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| OcrError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally. Use this from blocking
/// contexts (a GUI event handler should instead spawn the async call on a
/// worker so the interface stays responsive).
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, OcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input_str, config))
}

/// Resolve the API key, from most-specific to least-specific.
///
/// The three-level fallback chain lets library users and CLI users each set
/// exactly as much as they need:
///
/// 1. **Explicit config value** (`config.api_key`) — the caller passed the
///    key programmatically or via `--key`.
/// 2. **Environment** (`MISTRAL_API_KEY`) — chosen at the execution
///    environment level (shell profile, CI secret).
/// 3. **Key store** — the key persisted once with `ocr2md --set-key`.
///
/// An empty string at any level is treated as absent, never forwarded.
pub fn resolve_api_key(config: &ConversionConfig) -> Result<String, OcrError> {
    if let Some(ref key) = config.api_key {
        if !key.trim().is_empty() {
            return Ok(key.clone());
        }
    }

    if let Ok(key) = std::env::var("MISTRAL_API_KEY") {
        if !key.trim().is_empty() {
            debug!("Using API key from MISTRAL_API_KEY");
            return Ok(key);
        }
    }

    if let Some(key) = KeyStore::default_location()?.load()? {
        debug!("Using API key from the key store");
        return Ok(key);
    }

    Err(OcrError::MissingApiKey)
}

fn phase(config: &ConversionConfig, p: ConversionPhase) {
    if let Some(ref cb) = config.progress {
        cb.on_phase(p);
    }
}
