//! The display side: Markdown → HTML, and the browser preview.
//!
//! Scientific PDFs come back from the OCR API full of LaTeX (`$…$`,
//! `$$…$$`). A plain Markdown-to-HTML pass leaves those as literal dollar
//! text, so the standalone preview page loads MathJax from its CDN and lets
//! it typeset the math client-side. pulldown-cmark passes `$` through
//! untouched, which is exactly what MathJax needs.

use crate::error::OcrError;
use pulldown_cmark::{html, Options, Parser};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Render Markdown to an HTML fragment.
///
/// GFM tables, footnotes, strikethrough, and task lists are enabled — the
/// OCR API emits all four.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Wrap Markdown in a complete standalone HTML document.
///
/// The page carries the MathJax v3 loader (inline `$…$` and `\(…\)`,
/// display `$$…$$` and `\[…\]`, `processEscapes` on) plus a small print-like
/// stylesheet. Everything except MathJax is self-contained, so the file can
/// be mailed around or archived.
pub fn html_document(markdown: &str, title: &str) -> String {
    let body = markdown_to_html(markdown);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script>
window.MathJax = {{
  tex: {{
    inlineMath: [['$', '$'], ['\\(', '\\)']],
    displayMath: [['$$', '$$'], ['\\[', '\\]']],
    processEscapes: true
  }},
  svg: {{ fontCache: 'global' }}
}};
</script>
<script type="text/javascript" id="MathJax-script" async
  src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js">
</script>
<style>
  body {{ font-family: Arial, sans-serif; line-height: 1.6; max-width: 52rem; margin: 0 auto; padding: 20px; }}
  pre {{ background-color: #f5f5f5; padding: 10px; border-radius: 5px; overflow-x: auto; }}
  code {{ font-family: monospace; }}
  img {{ max-width: 100%; }}
  table {{ border-collapse: collapse; width: 100%; }}
  th, td {{ border: 1px solid #ddd; padding: 8px; }}
  th {{ background-color: #f2f2f2; }}
</style>
</head>
<body>
{body}</body>
</html>
"#,
        title = escape_html_text(title),
        body = body,
    )
}

/// Write the full HTML document to a temp file and return its path.
///
/// The file is *not* auto-deleted: the browser opens it asynchronously and
/// would race a destructor. The OS temp cleaner reclaims it eventually.
pub fn write_preview(markdown: &str, title: &str) -> Result<PathBuf, OcrError> {
    let doc = html_document(markdown, title);

    let mut file = tempfile::Builder::new()
        .prefix("ocr2md-preview-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| OcrError::Internal(format!("tempfile: {e}")))?;
    file.write_all(doc.as_bytes())
        .map_err(|e| OcrError::OutputWriteFailed {
            path: file.path().to_path_buf(),
            source: e,
        })?;

    let (_handle, path) = file
        .keep()
        .map_err(|e| OcrError::Internal(format!("keep tempfile: {e}")))?;

    info!("Wrote HTML preview to {}", path.display());
    Ok(path)
}

/// Open a previously written preview file in the system browser.
pub fn open_in_browser(path: &Path) -> Result<(), OcrError> {
    open::that(path).map_err(|e| OcrError::BrowserLaunchFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Write the preview and immediately open it.
pub fn preview_in_browser(markdown: &str, title: &str) -> Result<PathBuf, OcrError> {
    let path = write_preview(markdown, title)?;
    open_in_browser(&path)?;
    Ok(path)
}

/// Minimal escaping for text interpolated into the `<title>` element.
fn escape_html_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_renders_to_h1() {
        let html = markdown_to_html("# Title");
        assert!(html.contains("<h1>Title</h1>"), "got: {html}");
    }

    #[test]
    fn tables_are_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "got: {html}");
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn latex_dollars_survive_rendering() {
        let html = markdown_to_html("Energy: $E = mc^2$ and\n\n$$\\int_0^1 x\\,dx$$");
        assert!(html.contains("$E = mc^2$"), "got: {html}");
        assert!(html.contains("$$"));
    }

    #[test]
    fn document_carries_mathjax_and_body() {
        let doc = html_document("# Relativity\n\n$E = mc^2$", "paper");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("mathjax@3"));
        assert!(doc.contains("processEscapes"));
        assert!(doc.contains("<h1>Relativity</h1>"));
        assert!(doc.contains("<title>paper</title>"));
    }

    #[test]
    fn title_is_escaped() {
        let doc = html_document("x", "<script>alert(1)</script>");
        assert!(!doc.contains("<title><script>"));
        assert!(doc.contains("&lt;script&gt;"));
    }

    #[test]
    fn write_preview_produces_html_file_with_content() {
        let path = write_preview("# Saved Page", "t").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
        assert!(contents.contains("<h1>Saved Page</h1>"));
        assert!(contents.contains("MathJax"));
        std::fs::remove_file(&path).ok();
    }
}
