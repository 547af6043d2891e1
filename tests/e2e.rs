//! End-to-end integration tests for ocr2md.
//!
//! Tests that hit the live Mistral API are gated behind the `E2E_ENABLED`
//! environment variable (and need `MISTRAL_API_KEY`), so they do not run in
//! CI unless explicitly requested:
//!
//!   E2E_ENABLED=1 MISTRAL_API_KEY=sk-... cargo test --test e2e -- --nocapture
//!
//! Everything else below runs offline against temp files.

use ocr2md::{
    html_document, markdown_to_html, write_preview, ConversionConfig, ImageHandling, KeyStore,
    OcrError, PageSeparator,
};
use std::path::PathBuf;
use std::sync::Mutex;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Env mutation is process-global; serialise the tests that touch it.
static ENV_LOCK: Mutex<()> = Mutex::new(());

// ── Credential store ─────────────────────────────────────────────────────────

#[test]
fn keystore_round_trip_preserves_key() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = KeyStore::at_path(dir.path().join("ocr2md/config.json"));

    store.save("sk-round-trip").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("sk-round-trip"));
}

#[test]
fn keystore_unwritable_location_reports_failure() {
    // A path *under a file* can never be created.
    let dir = tempfile::TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();

    let store = KeyStore::at_path(blocker.join("sub/config.json"));
    assert!(matches!(
        store.save("sk-x"),
        Err(OcrError::KeyStoreWrite { .. })
    ));
}

// ── Key resolution chain ─────────────────────────────────────────────────────

#[test]
fn explicit_key_beats_environment() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("MISTRAL_API_KEY", "sk-from-env");

    let config = ConversionConfig::builder().api_key("sk-explicit").build().unwrap();
    assert_eq!(ocr2md::resolve_api_key(&config).unwrap(), "sk-explicit");

    std::env::remove_var("MISTRAL_API_KEY");
}

#[test]
fn environment_key_is_used_when_config_has_none() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("MISTRAL_API_KEY", "sk-from-env");

    let config = ConversionConfig::default();
    assert_eq!(ocr2md::resolve_api_key(&config).unwrap(), "sk-from-env");

    std::env::remove_var("MISTRAL_API_KEY");
}

// ── Conversion preconditions (no network) ────────────────────────────────────

#[tokio::test]
async fn nonexistent_input_fails_before_any_request() {
    let config = ConversionConfig::builder().api_key("sk-x").build().unwrap();
    let result = ocr2md::convert("/definitely/not/a/real/file.pdf", &config).await;
    assert!(matches!(result, Err(OcrError::FileNotFound { .. })));
}

#[tokio::test]
async fn non_pdf_input_fails_before_any_request() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "just some text").unwrap();

    let config = ConversionConfig::builder().api_key("sk-x").build().unwrap();
    let result = ocr2md::convert(path.to_str().unwrap(), &config).await;
    assert!(matches!(result, Err(OcrError::NotAPdf { .. })));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Reserved TEST-NET-1 address: connection fails fast, no DNS involved.
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("doc.pdf");
    std::fs::write(&path, b"%PDF-1.4\n...").unwrap();

    let config = ConversionConfig::builder()
        .api_key("sk-x")
        .base_url("http://192.0.2.1:9")
        .api_timeout_secs(2)
        .build()
        .unwrap();

    let result = ocr2md::convert(path.to_str().unwrap(), &config).await;
    match result {
        Err(OcrError::Network { .. }) | Err(OcrError::ApiTimeout { .. }) => {}
        other => panic!("expected Network/ApiTimeout, got {other:?}"),
    }
}

// ── Display pipeline ─────────────────────────────────────────────────────────

#[test]
fn known_markdown_renders_to_expected_html() {
    let html = markdown_to_html("# Title");
    assert!(html.contains("<h1>Title</h1>"), "got: {html}");
}

#[test]
fn preview_file_contains_the_returned_text() {
    let markdown = "# Results\n\nThe measured value was $\\alpha = 0.007$.";
    let path = write_preview(markdown, "results").unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("<h1>Results</h1>"));
    assert!(contents.contains("$\\alpha = 0.007$"));
    assert!(contents.contains("MathJax"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn html_document_is_self_contained_page() {
    let doc = html_document("plain paragraph", "t");
    assert!(doc.starts_with("<!DOCTYPE html>"));
    assert!(doc.ends_with("</html>\n"));
    assert!(doc.contains("<p>plain paragraph</p>"));
}

// ── Config surface ───────────────────────────────────────────────────────────

#[test]
fn builder_covers_the_public_knobs() {
    let config = ConversionConfig::builder()
        .api_key("sk-x")
        .model("mistral-ocr-latest")
        .images(ImageHandling::Strip)
        .page_separator(PageSeparator::HorizontalRule)
        .signed_url_expiry_hours(2)
        .api_timeout_secs(60)
        .build()
        .unwrap();

    assert_eq!(config.signed_url_expiry_hours, 2);
    assert_eq!(config.api_timeout_secs, 60);
    assert_eq!(config.images, ImageHandling::Strip);
}

// ── Live API tests (env-gated) ───────────────────────────────────────────────

#[tokio::test]
async fn live_convert_returns_non_empty_markdown() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ConversionConfig::default();
    let output = ocr2md::convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed with a valid key");

    assert!(output.stats.page_count > 0);
    assert!(!output.markdown.trim().is_empty(), "markdown is empty");
    assert!(output.markdown.ends_with('\n'));
    println!(
        "live: {} pages, {} bytes, {}ms",
        output.stats.page_count,
        output.markdown.len(),
        output.stats.total_ms
    );
}

#[tokio::test]
async fn live_bad_key_is_an_auth_error() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ConversionConfig::builder()
        .api_key("sk-definitely-invalid")
        .build()
        .unwrap();

    let result = ocr2md::convert(path.to_str().unwrap(), &config).await;
    assert!(
        matches!(result, Err(OcrError::AuthFailed { .. })),
        "expected AuthFailed, got {result:?}"
    );
}

#[tokio::test]
async fn live_convert_to_file_writes_markdown() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let out_dir = tempfile::TempDir::new().unwrap();
    let out_path = out_dir.path().join("sample.md");

    let config = ConversionConfig::default();
    let stats = ocr2md::convert_to_file(path.to_str().unwrap(), &out_path, &config)
        .await
        .expect("conversion should succeed");

    assert!(stats.page_count > 0);
    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(!written.trim().is_empty());
}
