//! # ocr2md
//!
//! Convert PDF documents to Markdown using the Mistral OCR API.
//!
//! ## Why this crate?
//!
//! Traditional PDF-to-text tools (pdftotext, pdf-extract) fail on complex
//! layouts — multi-column text, mathematical symbols, figures, and tables
//! come out garbled or out of reading order. The Mistral OCR service reads
//! the document as a human would and returns structured Markdown with
//! LaTeX math and embedded figures. This crate is the plumbing around that
//! service: credential storage, the three-call upload/sign/recognise flow,
//! image handling, and an HTML preview with MathJax.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL (%PDF checked)
//!  ├─ 2. Key       --key → MISTRAL_API_KEY → stored key
//!  ├─ 3. Upload    POST /v1/files (purpose=ocr) + signed URL
//!  ├─ 4. OCR       POST /v1/ocr — one request per document, no retries
//!  ├─ 5. Images    inline as data: URIs / strip / save to a directory
//!  └─ 6. Output    cleaned Markdown, optional MathJax HTML preview
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2md::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key resolved from MISTRAL_API_KEY or the stored credential
//!     let config = ConversionConfig::default();
//!     let output = convert("document.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("{} pages in {}ms", output.stats.page_count, output.stats.total_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocr2md = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod keystore;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ImageHandling, PageSeparator};
pub use convert::{convert, convert_sync, convert_to_file, resolve_api_key};
pub use error::OcrError;
pub use keystore::KeyStore;
pub use output::{ConversionOutput, ConversionStats, PageText};
pub use preview::{html_document, markdown_to_html, open_in_browser, preview_in_browser, write_preview};
pub use progress::{ConversionPhase, ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
