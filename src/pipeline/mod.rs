//! Pipeline stages for OCR conversion.
//!
//! Each submodule implements exactly one step. Keeping stages separate makes
//! each independently testable and keeps the vendor wire format confined to
//! a single module.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ api ──────────────▶ assemble ──▶ postprocess
//! (URL/path)  (upload · signed   (images,     (cleanup)
//!              URL · /v1/ocr)     join pages)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to local
//!    PDF bytes, validating the `%PDF` magic
//! 2. [`api`]      — the vendor calls: multipart upload, signed URL, OCR
//!    request; the only stage with network I/O
//! 3. [`assemble`] — inline/strip/save embedded images and join pages
//! 4. [`postprocess`] — deterministic text cleanup (line endings,
//!    whitespace, invisible characters)

pub mod api;
pub mod assemble;
pub mod input;
pub mod postprocess;
