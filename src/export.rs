//! Export entry points.
//!
//! [`export_pdf`] is the bare pipeline step: validate the payload size, then
//! call the renderer under the configured [`crate::config::RetryPolicy`].
//! [`export_document`] runs the whole chain for a résumé: render, inline
//! images, auto-fit, export.
//!
//! ## Retry contract
//!
//! Attempts are strictly sequential, so at most one request is in flight
//! per export. Each attempt is bounded by `attempt_timeout`; a timed-out
//! attempt counts as a transient failure. Payloads over the size ceiling
//! are rejected before the first attempt and never retried.

use crate::config::ExportConfig;
use crate::error::{ExportError, TransportError};
use crate::markup::Fragment;
use crate::model::{ResumeDocument, TemplateConfig};
use crate::output::{ExportOutcome, ExportStats, PdfArtifact};
use crate::pipeline::fetch::{AssetFetcher, HttpAssetFetcher};
use crate::pipeline::inline::{inline_images, InlineOptions};
use crate::pipeline::paginate::{compute_fit, PaginationState};
use crate::pipeline::transport::{ExportPayload, HttpRenderClient, RenderTransport};
use crate::render::{html_document, render_document};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Content type of every artifact.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Filename used when nothing better is known.
pub const DEFAULT_FILENAME: &str = "document.pdf";

static DISPOSITION_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'[^']*')?"?([^";]+)"?"#).unwrap()
});

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]+"#).unwrap());

/// Measurements taken from the laid-out document by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutMetrics {
    /// Height of the rendered content box in CSS pixels. `None` skips
    /// auto-fit.
    pub content_height_px: Option<f64>,
}

/// Reject payloads larger than `limit` bytes.
pub fn validate_payload(payload: &ExportPayload, limit: usize) -> Result<(), ExportError> {
    let size = payload.content.len();
    if size > limit {
        return Err(ExportError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

/// Send a prepared payload to the renderer.
///
/// # Errors
/// - [`ExportError::PayloadTooLarge`] before any network call when the
///   content exceeds `config.max_content_bytes`.
/// - [`ExportError::ExportFailed`] once every attempt has failed.
pub async fn export_pdf<T: RenderTransport>(
    transport: &T,
    payload: &ExportPayload,
    config: &ExportConfig,
) -> Result<PdfArtifact, ExportError> {
    send_with_retry(transport, payload, config, None).await
}

/// Filename priority: explicit config, then the renderer's
/// `Content-Disposition`, then `fallback_name`, then [`DEFAULT_FILENAME`].
async fn send_with_retry<T: RenderTransport>(
    transport: &T,
    payload: &ExportPayload,
    config: &ExportConfig,
    fallback_name: Option<String>,
) -> Result<PdfArtifact, ExportError> {
    validate_payload(payload, config.max_content_bytes)?;

    let policy = &config.retry;
    let total = policy.total_attempts();
    let mut last_err = TransportError::Connection("no attempt was made".to_string());

    for attempt in 0..total {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            warn!(
                "Export retry {}/{} after {}ms",
                attempt,
                policy.max_retries,
                delay.as_millis()
            );
            if !delay.is_zero() {
                sleep(delay).await;
            }
        }

        let started = Instant::now();
        let result = match timeout(policy.attempt_timeout, transport.render(payload)).await {
            Ok(Ok(pdf)) if pdf.bytes.is_empty() => Err(TransportError::EmptyBody),
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
        };

        match result {
            Ok(pdf) => {
                let filename = config
                    .filename
                    .clone()
                    .or_else(|| {
                        pdf.content_disposition
                            .as_deref()
                            .and_then(filename_from_disposition)
                    })
                    .or_else(|| fallback_name.clone())
                    .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
                info!(
                    "Renderer returned {} bytes on attempt {}/{}",
                    pdf.bytes.len(),
                    attempt + 1,
                    total
                );
                return Ok(PdfArtifact {
                    bytes: pdf.bytes,
                    content_type: PDF_CONTENT_TYPE.to_string(),
                    filename,
                    attempts: attempt + 1,
                });
            }
            Err(e) => {
                warn!("Export attempt {}/{} failed: {}", attempt + 1, total, e);
                last_err = e;
            }
        }
    }

    Err(ExportError::ExportFailed {
        attempts: total,
        last_error: last_err,
    })
}

/// Render, inline, fit and export a résumé.
///
/// Image failures and a `cannot_fit` pagination result never abort the
/// export; both are reported in [`ExportOutcome::warnings`].
pub async fn export_document<F, T>(
    doc: &ResumeDocument,
    templates: &TemplateConfig,
    metrics: LayoutMetrics,
    fetcher: &F,
    transport: &T,
    config: &ExportConfig,
) -> Result<ExportOutcome, ExportError>
where
    F: AssetFetcher,
    T: RenderTransport,
{
    let total_start = Instant::now();
    info!("Exporting résumé '{}'", doc.title);

    // ── Step 1: Render ───────────────────────────────────────────────────
    let fragment: Fragment = render_document(doc, templates);

    // ── Step 2: Inline images ────────────────────────────────────────────
    let inline_start = Instant::now();
    let options = InlineOptions::from_config(config)?;
    let snapshot = inline_images(&fragment, fetcher, &options).await;
    let inline_duration_ms = inline_start.elapsed().as_millis() as u64;

    let mut warnings = Vec::new();
    if !snapshot.failures.is_empty() {
        warnings.push(format!(
            "{} image(s) could not be embedded and may be missing from the PDF",
            snapshot.failures.len()
        ));
    }

    // ── Step 3: Auto-fit ─────────────────────────────────────────────────
    let pagination = match metrics.content_height_px {
        Some(height) => compute_fit(
            height,
            doc.layout.page_padding,
            config.auto_fit && doc.layout.auto_fit,
        ),
        None => {
            debug!("No content height measured; skipping auto-fit");
            PaginationState::IDENTITY
        }
    };
    if pagination.cannot_fit {
        warn!(
            "Content does not fit one page even at {:.0}% scale",
            pagination.scale_factor * 100.0
        );
        warnings.push(format!(
            "Content is too long for one page even at {:.0}% scale; the PDF will run onto a second page",
            pagination.scale_factor * 100.0
        ));
    } else if pagination.is_scaled {
        debug!("Auto-fit scale {:.4}", pagination.scale_factor);
    }

    // ── Step 4: Assemble payload ─────────────────────────────────────────
    let body = pagination.apply(&snapshot.html);
    let payload = ExportPayload {
        content: html_document(&body, &doc.title),
        margin: config.margin_px,
    };
    let content_bytes = payload.content.len();

    // ── Step 5: Export ───────────────────────────────────────────────────
    let render_start = Instant::now();
    let artifact =
        send_with_retry(transport, &payload, config, suggest_filename(&doc.title)).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = ExportStats {
        content_bytes,
        images_converted: snapshot.converted,
        images_failed: snapshot.failures.len(),
        attempts: artifact.attempts,
        inline_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Export complete: {} bytes of PDF, {} attempt(s), {}ms total",
        artifact.bytes.len(),
        stats.attempts,
        stats.total_duration_ms
    );

    Ok(ExportOutcome {
        artifact,
        pagination,
        asset_failures: snapshot.failures,
        warnings,
        stats,
    })
}

/// [`export_document`] over HTTP with the built-in templates.
pub async fn export_resume(
    doc: &ResumeDocument,
    metrics: LayoutMetrics,
    config: &ExportConfig,
) -> Result<ExportOutcome, ExportError> {
    let fetcher = HttpAssetFetcher::new(config.asset_timeout_secs)?;
    let transport = HttpRenderClient::new(&config.endpoint, config.retry.attempt_timeout)?;
    export_document(
        doc,
        &TemplateConfig::builtin(),
        metrics,
        &fetcher,
        &transport,
        config,
    )
    .await
}

/// [`export_resume`] and write the PDF to `path`.
///
/// Nothing is written when the export fails.
pub async fn export_to_file(
    doc: &ResumeDocument,
    metrics: LayoutMetrics,
    config: &ExportConfig,
    path: impl AsRef<Path>,
) -> Result<ExportOutcome, ExportError> {
    let outcome = export_resume(doc, metrics, config).await?;
    write_pdf(&outcome.artifact, path.as_ref())?;
    info!("Wrote {}", path.as_ref().display());
    Ok(outcome)
}

/// Write an artifact to disk.
///
/// The bytes go to a temp file in the target directory which is then
/// renamed over `path`, so readers never see a half-written PDF.
pub fn write_pdf(artifact: &PdfArtifact, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| ExportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir().map_err(write_err)?,
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(&artifact.bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Pull the filename out of a `Content-Disposition` header.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    DISPOSITION_FILENAME
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Derive a download filename from a résumé title.
pub fn suggest_filename(title: &str) -> Option<String> {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(title.trim(), "_");
    let cleaned = cleaned.trim_matches(|c: char| c == '_' || c == '.' || c.is_whitespace());
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("{cleaned}.pdf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_filename_variants() {
        assert_eq!(
            filename_from_disposition("attachment; filename=document.pdf").as_deref(),
            Some("document.pdf")
        );
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="my cv.pdf""#).as_deref(),
            Some("my cv.pdf")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''cv.pdf").as_deref(),
            Some("cv.pdf")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[test]
    fn suggested_filename_is_sanitised() {
        assert_eq!(
            suggest_filename("Ada Lovelace / Résumé").as_deref(),
            Some("Ada Lovelace _ Résumé.pdf")
        );
        assert_eq!(suggest_filename("  ").as_deref(), None);
        assert_eq!(suggest_filename("../..").as_deref(), None);
    }

    #[test]
    fn validate_payload_boundary() {
        let at_limit = ExportPayload {
            content: "a".repeat(16),
            margin: 0.0,
        };
        assert!(validate_payload(&at_limit, 16).is_ok());
        let over = ExportPayload {
            content: "a".repeat(17),
            margin: 0.0,
        };
        let err = validate_payload(&over, 16).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn write_pdf_is_atomic_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/cv.pdf");
        let artifact = PdfArtifact {
            bytes: b"%PDF-1.7 test".to_vec(),
            content_type: PDF_CONTENT_TYPE.into(),
            filename: "cv.pdf".into(),
            attempts: 1,
        };
        write_pdf(&artifact, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
