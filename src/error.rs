//! Error types for the ocr2md library.
//!
//! The vendor contract has three distinct failure families and they deserve
//! distinct variants rather than one stringly-typed bucket:
//!
//! * **Auth** — [`OcrError::MissingApiKey`] / [`OcrError::AuthFailed`]:
//!   the request never had a usable credential, or the API rejected it
//!   (401/403). Retrying cannot help; the user must fix the key.
//! * **Network** — [`OcrError::Network`] / [`OcrError::ApiTimeout`]:
//!   the host was unreachable or the call exceeded the client timeout.
//! * **Api** — [`OcrError::Api`]: the server answered with any other
//!   non-success status; the body's `message` field is surfaced verbatim.
//!
//! Everything is surfaced directly to the caller; nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ocr2md library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Credential errors ─────────────────────────────────────────────────
    /// No API key from any source (config, environment, key store).
    #[error(
        "No Mistral API key configured.\n\
         Provide one with --key, set MISTRAL_API_KEY, or store it once with:\n  \
         ocr2md --set-key <KEY>"
    )]
    MissingApiKey,

    /// Could not read the stored key file.
    #[error("Failed to read API key from '{path}': {source}")]
    KeyStoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the key file (location unwritable, disk full, …).
    #[error("Failed to save API key to '{path}': {source}")]
    KeyStoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file exists but does not parse as the expected JSON shape.
    #[error("API key file '{path}' is malformed: {detail}\nDelete it and run: ocr2md --set-key <KEY>")]
    KeyStoreMalformed { path: PathBuf, detail: String },

    // ── API errors ────────────────────────────────────────────────────────
    /// The API rejected the key (HTTP 401/403).
    #[error("Authentication failed: {detail}\nCheck the API key (console.mistral.ai → API Keys).")]
    AuthFailed { detail: String },

    /// The host was unreachable (DNS, connect, TLS).
    #[error("Network error calling the OCR API: {detail}")]
    Network { detail: String },

    /// The API call exceeded the configured timeout.
    #[error("OCR API call timed out after {secs}s\nIncrease --timeout for large documents.")]
    ApiTimeout { secs: u64 },

    /// Any other non-success response from the API.
    #[error("OCR API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered 200 but returned no pages.
    #[error("The OCR API returned no pages for this document")]
    EmptyResponse,

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output Markdown/HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write an extracted page image.
    #[error("Failed to write image '{path}': {source}")]
    ImageWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not launch the system browser for the preview.
    #[error("Failed to open '{path}' in the system browser: {detail}")]
    BrowserLaunchFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
