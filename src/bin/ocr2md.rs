//! CLI binary for ocr2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, drives a spinner from the phase callback, and prints
//! results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2md::{
    convert, convert_to_file, preview_in_browser, ConversionConfig, ConversionPhase,
    ConversionProgressCallback, ImageHandling, KeyStore, PageSeparator, ProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that tracks the conversion phases. The OCR API handles
/// the whole document in one request, so there is no per-page position to
/// report — a phase-labelled spinner is the honest rendering.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgress {
    fn on_phase(&self, phase: ConversionPhase) {
        self.bar.set_prefix(phase.label());
        self.bar.set_message(match phase {
            ConversionPhase::Processing => "this can take a while for long documents…",
            _ => "",
        });
    }

    fn on_complete(&self, page_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages recognised",
            green("✔"),
            bold(&page_count.to_string())
        );
    }

    fn on_error(&self, _error: &str) {
        // The error itself is printed by main via anyhow; just stop the tick.
        self.bar.finish_and_clear();
        eprintln!("{} conversion failed", red("✘"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Store the API key once
  ocr2md --set-key sk-...

  # Basic conversion (stdout)
  ocr2md document.pdf

  # Convert to file
  ocr2md document.pdf -o output.md

  # Render to HTML and open in the default browser (MathJax for LaTeX)
  ocr2md document.pdf --preview

  # Write a standalone HTML file instead
  ocr2md document.pdf --html output.html

  # Save embedded figures as files next to the output
  ocr2md document.pdf -o paper.md --images-dir paper_images

  # Convert from URL
  ocr2md https://arxiv.org/pdf/1706.03762 -o attention.md

  # Structured JSON (per-page text + stats)
  ocr2md --json document.pdf > output.json

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY    API key (overridden by --key, overrides the stored key)

SETUP:
  1. Create a key at console.mistral.ai → API Keys
  2. Store it:   ocr2md --set-key <KEY>
     (saved to <config_dir>/ocr2md/config.json, chmod 600 on Unix)
  3. Convert:    ocr2md document.pdf -o output.md
"#;

/// Convert PDF files and URLs to Markdown using the Mistral OCR API.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "Convert PDF files and URLs to Markdown using the Mistral OCR API",
    long_about = "Convert PDF documents (local files or URLs) to clean Markdown using the \
Mistral OCR service. Handles scanned documents, tables, and LaTeX math; results can be \
written to a file or rendered to HTML and opened in the system browser.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "set_key")]
    input: Option<String>,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a standalone HTML document (MathJax-enabled) to this file.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Render to HTML and open it in the default browser.
    #[arg(long)]
    preview: bool,

    /// Output structured JSON (per-page text + stats) instead of Markdown.
    #[arg(long)]
    json: bool,

    /// API key for this invocation only (not persisted).
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Persist an API key to the local key store and exit.
    #[arg(long, value_name = "KEY", conflicts_with = "input")]
    set_key: Option<String>,

    /// OCR model identifier.
    #[arg(long, default_value = ocr2md::config::DEFAULT_MODEL)]
    model: String,

    /// API base URL (proxies, testing).
    #[arg(long, env = "OCR2MD_BASE_URL", default_value = ocr2md::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Drop embedded images instead of inlining them as data: URIs.
    #[arg(long, conflicts_with = "images_dir")]
    no_images: bool,

    /// Decode embedded images into this directory and link them relatively.
    #[arg(long, value_name = "DIR")]
    images_dir: Option<PathBuf>,

    /// Page separator: none, hr, comment, or a custom string.
    #[arg(long, default_value = "none")]
    separator: String,

    /// Timeout for the upload and OCR calls, in seconds.
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// HTTP download timeout for URL inputs, in seconds.
    #[arg(long, default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Key storage mode ─────────────────────────────────────────────────
    if let Some(ref key) = cli.set_key {
        let store = KeyStore::default_location().context("Cannot locate the key store")?;
        store.save(key).context("Failed to save the API key")?;
        if !cli.quiet {
            eprintln!(
                "{} API key saved to {}",
                green("✔"),
                bold(&store.path().display().to_string())
            );
        }
        return Ok(());
    }

    let input = cli
        .input
        .as_deref()
        .expect("clap enforces input unless --set-key");

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;

    // ── Run conversion ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = convert_to_file(input, output_path, &config)
            .await
            .context("Conversion failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {}ms  →  {}",
                green("✔"),
                stats.page_count,
                stats.total_ms,
                bold(&output_path.display().to_string()),
            );
            eprintln!(
                "   {} uploaded  /  {}ms OCR",
                dim(&format!("{} bytes", stats.uploaded_bytes)),
                dim(&stats.ocr_ms.to_string()),
            );
        }
        return Ok(());
    }

    let output = convert(input, &config).await.context("Conversion failed")?;

    if let Some(ref html_path) = cli.html {
        let doc = ocr2md::html_document(&output.markdown, &title_for(input));
        std::fs::write(html_path, doc)
            .with_context(|| format!("Failed to write HTML to {}", html_path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  HTML written to {}",
                green("✔"),
                bold(&html_path.display().to_string())
            );
        }
    }

    if cli.preview {
        let path = preview_in_browser(&output.markdown, &title_for(input))
            .context("Failed to open the browser preview")?;
        if !cli.quiet {
            eprintln!("{}  Preview opened: {}", green("✔"), dim(&path.display().to_string()));
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.html.is_none() && !cli.preview {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet && !show_progress && !cli.json {
        eprintln!(
            "Converted {} pages in {}ms",
            output.stats.page_count, output.stats.total_ms
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let images = if cli.no_images {
        ImageHandling::Strip
    } else if let Some(ref dir) = cli.images_dir {
        ImageHandling::SaveTo(dir.clone())
    } else {
        ImageHandling::Inline
    };

    let mut builder = ConversionConfig::builder()
        .model(cli.model.clone())
        .base_url(cli.base_url.clone())
        .images(images)
        .page_separator(parse_separator(&cli.separator)?)
        .api_timeout_secs(cli.timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.key {
        builder = builder.api_key(key.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--separator` into `PageSeparator`.
fn parse_separator(s: &str) -> Result<PageSeparator> {
    Ok(match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "comment" => PageSeparator::Comment,
        "" => bail!("Separator must not be empty; use 'none' for no separator"),
        _ => PageSeparator::Custom(s.to_string()),
    })
}

/// Derive a preview/HTML title from the input path or URL.
fn title_for(input: &str) -> String {
    Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "ocr2md".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_parsing() {
        assert!(matches!(parse_separator("none").unwrap(), PageSeparator::None));
        assert!(matches!(
            parse_separator("hr").unwrap(),
            PageSeparator::HorizontalRule
        ));
        assert!(matches!(
            parse_separator("comment").unwrap(),
            PageSeparator::Comment
        ));
        match parse_separator("* * *").unwrap() {
            PageSeparator::Custom(s) => assert_eq!(s, "* * *"),
            other => panic!("expected Custom, got {other:?}"),
        }
        assert!(parse_separator("").is_err());
    }

    #[test]
    fn title_derivation() {
        assert_eq!(title_for("/tmp/paper.pdf"), "paper");
        assert_eq!(title_for("https://arxiv.org/pdf/1706.03762.pdf"), "1706.03762");
    }

    #[test]
    fn cli_parses_basic_invocation() {
        use clap::Parser;
        let cli = Cli::try_parse_from(["ocr2md", "doc.pdf", "-o", "out.md"]).unwrap();
        assert_eq!(cli.input.as_deref(), Some("doc.pdf"));
        assert_eq!(cli.output.as_deref(), Some(Path::new("out.md")));
    }

    #[test]
    fn set_key_requires_no_input() {
        use clap::Parser;
        let cli = Cli::try_parse_from(["ocr2md", "--set-key", "sk-x"]).unwrap();
        assert!(cli.input.is_none());
        assert_eq!(cli.set_key.as_deref(), Some("sk-x"));
    }

    #[test]
    fn no_images_conflicts_with_images_dir() {
        use clap::Parser;
        assert!(Cli::try_parse_from([
            "ocr2md",
            "doc.pdf",
            "--no-images",
            "--images-dir",
            "imgs"
        ])
        .is_err());
    }
}
