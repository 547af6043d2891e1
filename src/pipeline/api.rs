//! The vendor API client: upload, signed URL, and the OCR request.
//!
//! The Mistral OCR flow is three calls, always in this order:
//!
//! 1. `POST /v1/files` — multipart upload of the PDF with `purpose=ocr`
//! 2. `GET  /v1/files/{id}/url?expiry=N` — a short-lived signed URL
//! 3. `POST /v1/ocr` — recognise the document behind the signed URL
//!
//! One request per call, no retries. Transport failures map to
//! [`OcrError::Network`] / [`OcrError::ApiTimeout`]; HTTP 401/403 map to
//! [`OcrError::AuthFailed`]; any other non-success status maps to
//! [`OcrError::Api`] with the body's `message` field when present.
//!
//! Only the response fields this crate consumes are modelled; unknown
//! fields are ignored so vendor-side schema additions don't break parsing.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

// ── Wire types ───────────────────────────────────────────────────────────

/// Response of `POST /v1/files`.
#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size_bytes: u64,
}

/// Response of `GET /v1/files/{id}/url`.
#[derive(Debug, Deserialize)]
pub struct SignedUrl {
    pub url: String,
}

/// Request body of `POST /v1/ocr`.
#[derive(Debug, Serialize)]
pub struct OcrRequest {
    pub model: String,
    pub document: DocumentSource,
    pub include_image_base64: bool,
}

/// The document reference inside an [`OcrRequest`].
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSource {
    DocumentUrl { document_url: String },
}

/// Response of `POST /v1/ocr`.
#[derive(Debug, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<OcrPage>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub usage_info: Option<UsageInfo>,
}

/// One recognised page.
#[derive(Debug, Deserialize)]
pub struct OcrPage {
    /// 0-indexed page number as assigned by the API.
    pub index: usize,
    pub markdown: String,
    #[serde(default)]
    pub images: Vec<OcrImage>,
}

/// An image embedded in a page's Markdown, shipped separately as base64.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrImage {
    /// The id the Markdown references, e.g. `img-0.jpeg`.
    pub id: String,
    /// Base64 payload; may already carry a `data:` prefix.
    #[serde(default)]
    pub image_base64: Option<String>,
}

/// Usage block of an [`OcrResponse`].
#[derive(Debug, Deserialize)]
pub struct UsageInfo {
    #[serde(default)]
    pub pages_processed: usize,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

/// Error body the API returns on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Authenticated HTTP client for the OCR endpoints.
pub struct OcrApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl OcrApiClient {
    /// Build a client with the given credentials and timeout.
    ///
    /// The key must be non-empty; resolution from env/store happens before
    /// this point.
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Result<Self, OcrError> {
        if api_key.trim().is_empty() {
            return Err(OcrError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OcrError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
        })
    }

    /// Upload the PDF with `purpose=ocr`.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile, OcrError> {
        let size = bytes.len();
        info!("Uploading '{}' ({} bytes)", file_name, size);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| OcrError::Internal(format!("multipart: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "ocr")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/v1/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let uploaded: UploadedFile = self.parse_response(response).await?;
        debug!("Uploaded as file id {}", uploaded.id);
        Ok(uploaded)
    }

    /// Fetch a signed download URL for an uploaded file.
    pub async fn signed_url(&self, file_id: &str, expiry_hours: u32) -> Result<String, OcrError> {
        let response = self
            .http
            .get(format!("{}/v1/files/{}/url", self.base_url, file_id))
            .query(&[("expiry", expiry_hours)])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let signed: SignedUrl = self.parse_response(response).await?;
        Ok(signed.url)
    }

    /// Run OCR on the document behind `document_url`.
    pub async fn process(
        &self,
        document_url: &str,
        model: &str,
        include_images: bool,
    ) -> Result<OcrResponse, OcrError> {
        info!("Requesting OCR with model '{}'", model);

        let body = OcrRequest {
            model: model.to_string(),
            document: DocumentSource::DocumentUrl {
                document_url: document_url.to_string(),
            },
            include_image_base64: include_images,
        };

        let response = self
            .http
            .post(format!("{}/v1/ocr", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let ocr: OcrResponse = self.parse_response(response).await?;
        info!("OCR returned {} pages", ocr.pages.len());
        Ok(ocr)
    }

    /// Map a reqwest transport error to the library taxonomy.
    fn transport_error(&self, e: reqwest::Error) -> OcrError {
        if e.is_timeout() {
            OcrError::ApiTimeout {
                secs: self.timeout_secs,
            }
        } else {
            OcrError::Network {
                detail: e.to_string(),
            }
        }
    }

    /// Check the status, then deserialise the success body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, OcrError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| OcrError::Api {
            status: status.as_u16(),
            message: format!("unexpected response shape: {e}"),
        })
    }
}

/// Map a non-success HTTP status plus body to the library taxonomy.
///
/// 401/403 become [`OcrError::AuthFailed`]; everything else becomes
/// [`OcrError::Api`] with whatever message the body carries.
pub fn status_error(status: u16, body: &str) -> OcrError {
    let message = extract_message(body);
    match status {
        401 | 403 => OcrError::AuthFailed { detail: message },
        _ => OcrError::Api { status, message },
    }
}

/// Pull a human-readable message out of an API error body.
///
/// The API is inconsistent: some endpoints return `{"message": "..."}`,
/// others `{"detail": [...]}` or `{"detail": "..."}`. Fall back to the raw
/// body (truncated) when neither parses.
fn extract_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(msg) = parsed.message {
            return msg;
        }
        if let Some(detail) = parsed.detail {
            return match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details provided".to_string()
    } else if trimmed.chars().count() > 200 {
        let cut: String = trimmed.chars().take(199).collect();
        format!("{cut}…")
    } else {
        trimmed.to_string()
    }
}
