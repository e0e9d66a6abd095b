//! CLI binary for resume-export.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExportConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resume_export::pipeline::paginate::page_height_px;
use resume_export::{
    compute_fit, export_document, html_document, page_breaks, render_document, write_pdf,
    Backoff, ExportConfig, HttpAssetFetcher, HttpRenderClient, LayoutMetrics, ResumeDocument,
    TemplateConfig,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preview the HTML the renderer will receive
  resume2pdf render resume.json > resume.html

  # How much would 1180px of content be scaled?
  resume2pdf fit --content-height 1180

  # Export to PDF through a local renderer
  resume2pdf export resume.json -o resume.pdf --content-height 1180

  # Export with relative image paths resolved against the editor host
  resume2pdf export resume.json -o cv.pdf --asset-base-url https://app.example.com/

ENVIRONMENT VARIABLES:
  RESUME2PDF_ENDPOINT     Rendering service URL (default http://localhost:3000/generate-pdf)
  RESUME2PDF_MARGIN       Page margin in px passed to the renderer
  RESUME2PDF_MAX_RETRIES  Retries after the first failed attempt
  RUST_LOG                Overrides the log filter
"#;

/// Render résumé documents and export them to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "resume2pdf",
    version,
    about = "Render résumé documents and export them to one-page PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true, env = "RESUME2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all non-error output.
    #[arg(short, long, global = true, env = "RESUME2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rendered HTML document.
    Render {
        /// Résumé document (JSON).
        document: PathBuf,

        /// Template definitions (JSON). Defaults to the built-in set.
        #[arg(long, env = "RESUME2PDF_TEMPLATES")]
        templates: Option<PathBuf>,
    },

    /// Print the auto-fit result for a measured content height.
    Fit {
        /// Height of the laid-out content in CSS pixels.
        #[arg(long)]
        content_height: f64,

        /// Page padding in CSS pixels.
        #[arg(long, default_value_t = 32.0)]
        padding: f64,

        /// Also print the page-break offsets of the unscaled content.
        #[arg(long)]
        breaks: bool,
    },

    /// Render, inline images, fit and export to PDF.
    Export {
        /// Résumé document (JSON).
        document: PathBuf,

        /// Output PDF path. Defaults to the suggested filename.
        #[arg(short, long, env = "RESUME2PDF_OUTPUT")]
        output: Option<PathBuf>,

        /// Rendering service URL.
        #[arg(long, env = "RESUME2PDF_ENDPOINT", default_value = resume_export::config::DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Height of the laid-out content in CSS pixels; enables auto-fit.
        #[arg(long, env = "RESUME2PDF_CONTENT_HEIGHT")]
        content_height: Option<f64>,

        /// Page margin passed to the renderer, in CSS pixels.
        #[arg(long, env = "RESUME2PDF_MARGIN", default_value_t = 32.0)]
        margin: f64,

        /// Disable auto-fit scaling.
        #[arg(long, env = "RESUME2PDF_NO_FIT")]
        no_fit: bool,

        /// Retries after the first failed attempt.
        #[arg(long, env = "RESUME2PDF_MAX_RETRIES", default_value_t = 2)]
        max_retries: u32,

        /// Per-attempt timeout in seconds.
        #[arg(long, env = "RESUME2PDF_TIMEOUT", default_value_t = 45)]
        timeout: u64,

        /// Base delay between attempts in milliseconds (doubles each retry).
        #[arg(long, env = "RESUME2PDF_BACKOFF_MS", default_value_t = 500)]
        backoff_ms: u64,

        /// Base URL for relative image references.
        #[arg(long, env = "RESUME2PDF_ASSET_BASE_URL")]
        asset_base_url: Option<String>,

        /// Per-image fetch timeout in seconds.
        #[arg(long, env = "RESUME2PDF_ASSET_TIMEOUT", default_value_t = 30)]
        asset_timeout: u64,

        /// Downscale embedded images to this longest edge in pixels.
        #[arg(long, env = "RESUME2PDF_MAX_IMAGE_DIM")]
        max_image_dimension: Option<u32>,

        /// Template definitions (JSON). Defaults to the built-in set.
        #[arg(long, env = "RESUME2PDF_TEMPLATES")]
        templates: Option<PathBuf>,

        /// Print the export outcome as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Disable the spinner.
        #[arg(long, env = "RESUME2PDF_NO_PROGRESS")]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the only feedback while it runs; keep INFO logs quiet.
    let show_progress = match &cli.command {
        Command::Export {
            json, no_progress, ..
        } => !cli.quiet && !*no_progress && !*json,
        _ => false,
    };
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

    match cli.command {
        Command::Render {
            document,
            templates,
        } => {
            let doc = load_document(&document).await?;
            let templates = load_templates(templates.as_deref()).await?;
            let body = render_document(&doc, &templates).to_html();
            let html = html_document(&body, &doc.title);
            io::stdout()
                .lock()
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?;
        }

        Command::Fit {
            content_height,
            padding,
            breaks,
        } => {
            let state = compute_fit(content_height, padding, true);
            println!(
                "{}",
                serde_json::to_string_pretty(&state).context("Failed to serialise state")?
            );
            if breaks {
                let offsets = page_breaks(content_height, padding);
                eprintln!(
                    "{} page height {:.2}px, breaks at {:?}",
                    dim("A4"),
                    page_height_px(),
                    offsets
                );
            }
        }

        Command::Export {
            document,
            output,
            endpoint,
            content_height,
            margin,
            no_fit,
            max_retries,
            timeout,
            backoff_ms,
            asset_base_url,
            asset_timeout,
            max_image_dimension,
            templates,
            json,
            ..
        } => {
            let doc = load_document(&document).await?;
            let templates = load_templates(templates.as_deref()).await?;

            let mut builder = ExportConfig::builder()
                .endpoint(endpoint)
                .margin_px(margin)
                .auto_fit(!no_fit)
                .max_retries(max_retries)
                .attempt_timeout(Duration::from_secs(timeout))
                .backoff(if backoff_ms == 0 {
                    Backoff::None
                } else {
                    Backoff::Exponential {
                        base: Duration::from_millis(backoff_ms),
                    }
                })
                .asset_timeout_secs(asset_timeout);
            if let Some(url) = asset_base_url {
                builder = builder.asset_base_url(url);
            }
            if let Some(px) = max_image_dimension {
                builder = builder.max_image_dimension(px);
            }
            let config = builder.build().context("Invalid configuration")?;

            let fetcher = HttpAssetFetcher::new(config.asset_timeout_secs)
                .context("Failed to create asset fetcher")?;
            let transport = HttpRenderClient::new(&config.endpoint, config.retry.attempt_timeout)
                .context("Failed to create renderer client")?;

            let spinner = show_progress.then(|| {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
                );
                bar.set_prefix("Exporting");
                bar.set_message(doc.title.clone());
                bar.enable_steady_tick(Duration::from_millis(80));
                bar
            });

            let metrics = LayoutMetrics {
                content_height_px: content_height,
            };
            let result =
                export_document(&doc, &templates, metrics, &fetcher, &transport, &config).await;
            if let Some(ref bar) = spinner {
                bar.finish_and_clear();
            }
            let outcome = result.context("Export failed")?;

            let path = output.unwrap_or_else(|| PathBuf::from(&outcome.artifact.filename));
            write_pdf(&outcome.artifact, &path).context("Failed to write PDF")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome)
                        .context("Failed to serialise outcome")?
                );
            }

            if !cli.quiet {
                for w in &outcome.warnings {
                    eprintln!("{}  {}", yellow("⚠"), w);
                }
                eprintln!(
                    "{}  {} bytes  {} attempt(s)  {}ms  →  {}",
                    if outcome.warnings.is_empty() {
                        green("✔")
                    } else {
                        yellow("⚠")
                    },
                    outcome.artifact.bytes.len(),
                    outcome.stats.attempts,
                    outcome.stats.total_duration_ms,
                    bold(&path.display().to_string()),
                );
                if outcome.pagination.is_scaled {
                    eprintln!(
                        "   {}",
                        dim(&format!(
                            "scaled to {:.1}%",
                            outcome.pagination.scale_factor * 100.0
                        ))
                    );
                }
            }
        }
    }

    Ok(())
}

async fn load_document(path: &Path) -> Result<ResumeDocument> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid résumé document {:?}", path))
}

async fn load_templates(path: Option<&Path>) -> Result<TemplateConfig> {
    let Some(path) = path else {
        return Ok(TemplateConfig::builtin());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid template file {:?}", path))
}
