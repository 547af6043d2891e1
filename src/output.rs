//! Output types returned by the conversion entry points.

use serde::{Deserialize, Serialize};

/// The result of a full conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Assembled Markdown for the whole document.
    pub markdown: String,
    /// Per-page Markdown, in page order.
    pub pages: Vec<PageText>,
    /// Timing and volume statistics.
    pub stats: ConversionStats,
}

/// Recognised text for a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Markdown for this page, after image handling and cleanup.
    pub markdown: String,
    /// Number of embedded images the API returned for this page.
    pub image_count: usize,
}

/// Statistics for one conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages the API recognised.
    pub page_count: usize,
    /// Size of the uploaded PDF in bytes.
    pub uploaded_bytes: u64,
    /// Wall-clock time spent uploading and fetching the signed URL.
    pub upload_ms: u64,
    /// Wall-clock time of the OCR request itself.
    pub ocr_ms: u64,
    /// End-to-end duration, including input resolution and assembly.
    pub total_ms: u64,
}
