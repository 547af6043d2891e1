//! Input resolution: normalise a user-supplied path or URL to PDF bytes.
//!
//! The upload endpoint wants a file name and raw bytes, so this stage reads
//! the document fully into memory — OCR-able PDFs are tens of megabytes at
//! most. URL inputs are downloaded first; the `%PDF` magic is validated in
//! both cases so callers get a meaningful error rather than a vendor-side
//! rejection of a garbage upload.

use crate::error::OcrError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A resolved document: raw bytes plus the name sent to the upload endpoint.
#[derive(Debug)]
pub struct ResolvedDocument {
    /// File name reported to the API (`file_name` part of the upload).
    pub file_name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl ResolvedDocument {
    /// File stem without the `.pdf` extension, used to derive output names.
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it. If it is a local file, read it and
/// validate it exists. Either way the `%PDF` magic is checked.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedDocument, OcrError> {
    if input.trim().is_empty() {
        return Err(OcrError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input)
    }
}

/// Read a local file, mapping io errors to the input-error variants.
fn read_local(path_str: &str) -> Result<ResolvedDocument, OcrError> {
    let path = PathBuf::from(path_str);

    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(OcrError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(OcrError::FileNotFound { path });
        }
    };

    validate_magic(&bytes, &path)?;

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedDocument {
        file_name: file_name_of(&path),
        bytes,
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedDocument, OcrError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OcrError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            OcrError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            OcrError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(OcrError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let file_name = filename_from_url(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| OcrError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    validate_magic(&bytes, Path::new(&file_name))?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(ResolvedDocument { file_name, bytes })
}

/// Reject anything that does not start with `%PDF`.
fn validate_magic(bytes: &[u8], path: &Path) -> Result<(), OcrError> {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    if &magic != b"%PDF" {
        return Err(OcrError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.pdf")
        .to_string()
}

/// Derive an upload file name from the last URL path segment.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
