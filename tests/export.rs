//! Integration tests for the export pipeline.
//!
//! The renderer and the image host are replaced by in-process doubles, so
//! these run offline and fast:
//!   cargo test --test export

use resume_export::config::MAX_CONTENT_SIZE;
use resume_export::model::Experience;
use resume_export::{
    export_document, export_pdf, write_pdf, AssetError, AssetFetcher, Backoff, ExportConfig,
    ExportError, ExportPayload, FetchedAsset, LayoutMetrics, RenderTransport, RenderedPdf,
    ResumeDocument, RetryPolicy, TemplateConfig, TransportError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Fails the first `failures` calls, then returns a small PDF.
struct FlakyRenderer {
    failures: usize,
    calls: AtomicUsize,
    disposition: Option<&'static str>,
    last_payload: Mutex<Option<ExportPayload>>,
}

impl FlakyRenderer {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            disposition: Some("attachment; filename=document.pdf"),
            last_payload: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RenderTransport for FlakyRenderer {
    async fn render(&self, payload: &ExportPayload) -> Result<RenderedPdf, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        if n < self.failures {
            return Err(TransportError::Status {
                status: 503,
                message: "renderer busy".into(),
            });
        }
        Ok(RenderedPdf {
            bytes: b"%PDF-1.7\n%test".to_vec(),
            content_disposition: self.disposition.map(str::to_string),
        })
    }
}

/// Never answers within the attempt timeout.
struct HangingRenderer {
    calls: AtomicUsize,
}

impl RenderTransport for HangingRenderer {
    async fn render(&self, _payload: &ExportPayload) -> Result<RenderedPdf, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        Err(TransportError::Connection("unreachable".into()))
    }
}

/// Answers 200 with no body.
struct EmptyRenderer;

impl RenderTransport for EmptyRenderer {
    async fn render(&self, _payload: &ExportPayload) -> Result<RenderedPdf, TransportError> {
        Ok(RenderedPdf {
            bytes: Vec::new(),
            content_disposition: None,
        })
    }
}

/// Serves a 1×1 PNG for every URL except those containing `broken`.
struct FakeImageHost {
    calls: AtomicUsize,
}

const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89,
];

impl AssetFetcher for FakeImageHost {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(AssetError::FetchFailed {
                url: url.to_string(),
                detail: "HTTP 404 Not Found".into(),
            });
        }
        Ok(FetchedAsset {
            bytes: PNG_1X1.to_vec(),
            content_type: None,
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// `RUST_LOG=debug cargo test --test export -- --nocapture` shows the
/// pipeline logs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_config() -> ExportConfig {
    ExportConfig::builder()
        .retry(RetryPolicy::immediate(2))
        .build()
        .unwrap()
}

fn payload(len: usize) -> ExportPayload {
    ExportPayload {
        content: "x".repeat(len),
        margin: 32.0,
    }
}

fn sample_resume() -> ResumeDocument {
    let mut doc = ResumeDocument::new("Ada Lovelace");
    doc.base_info.name = "Ada Lovelace".into();
    doc.base_info.email = "ada@example.com".into();
    doc.base_info.photo = Some("https://cdn.example.com/ada.png".into());

    let mut job = Experience::new("Analytical Engine Co.", "Programmer");
    job.details = r#"<p>Notes on the engine <img src="https://cdn.example.com/broken.png"></p>
<p><img src="https://cdn.example.com/diagram.png"></p>"#
        .into();
    doc.update_experience(job);
    doc
}

// ── export_pdf ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn oversized_payload_is_rejected_without_any_call() {
    let renderer = FlakyRenderer::new(0);
    let err = export_pdf(&renderer, &payload(MAX_CONTENT_SIZE + 1), &fast_config())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ExportError::PayloadTooLarge { size, limit } if size == MAX_CONTENT_SIZE + 1 && limit == MAX_CONTENT_SIZE)
    );
    assert!(err.is_validation());
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn payload_at_the_limit_is_sent() {
    let renderer = FlakyRenderer::new(0);
    let artifact = export_pdf(&renderer, &payload(MAX_CONTENT_SIZE), &fast_config())
        .await
        .unwrap();
    assert_eq!(artifact.attempts, 1);
    assert_eq!(renderer.calls(), 1);
}

#[tokio::test]
async fn two_failures_then_success() {
    init_tracing();
    let renderer = FlakyRenderer::new(2);
    let artifact = export_pdf(&renderer, &payload(64), &fast_config())
        .await
        .unwrap();
    assert_eq!(renderer.calls(), 3);
    assert_eq!(artifact.attempts, 3);
    assert_eq!(artifact.content_type, "application/pdf");
    assert_eq!(artifact.filename, "document.pdf");
    assert!(artifact.bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn exhaustion_reports_attempts_and_last_error() {
    let renderer = FlakyRenderer::new(usize::MAX);
    let err = export_pdf(&renderer, &payload(64), &fast_config())
        .await
        .unwrap_err();
    match err {
        ExportError::ExportFailed {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(last_error, TransportError::Status { status: 503, .. }));
        }
        other => panic!("expected ExportFailed, got {other:?}"),
    }
    assert_eq!(renderer.calls(), 3);
}

#[tokio::test]
async fn zero_retries_means_one_attempt() {
    let renderer = FlakyRenderer::new(1);
    let config = ExportConfig::builder()
        .retry(RetryPolicy::immediate(0))
        .build()
        .unwrap();
    let err = export_pdf(&renderer, &payload(8), &config).await.unwrap_err();
    assert!(matches!(err, ExportError::ExportFailed { attempts: 1, .. }));
    assert_eq!(renderer.calls(), 1);
}

#[tokio::test]
async fn attempt_timeout_counts_as_transient_failure() {
    let renderer = HangingRenderer {
        calls: AtomicUsize::new(0),
    };
    let config = ExportConfig::builder()
        .max_retries(2)
        .attempt_timeout(Duration::from_millis(50))
        .backoff(Backoff::Fixed(Duration::from_millis(10)))
        .build()
        .unwrap();
    let err = export_pdf(&renderer, &payload(8), &config).await.unwrap_err();
    match err {
        ExportError::ExportFailed {
            attempts,
            last_error: TransportError::Timeout { .. },
        } => assert_eq!(attempts, 3),
        other => panic!("expected timeout exhaustion, got {other:?}"),
    }
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_body_is_retried_then_fails() {
    let err = export_pdf(&EmptyRenderer, &payload(8), &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExportError::ExportFailed {
            attempts: 3,
            last_error: TransportError::EmptyBody
        }
    ));
}

#[tokio::test]
async fn configured_filename_wins() {
    let renderer = FlakyRenderer::new(0);
    let config = ExportConfig::builder()
        .retry(RetryPolicy::immediate(0))
        .filename("ada.pdf")
        .build()
        .unwrap();
    let artifact = export_pdf(&renderer, &payload(8), &config).await.unwrap();
    assert_eq!(artifact.filename, "ada.pdf");
}

// ── export_document ──────────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_with_one_broken_image() {
    init_tracing();
    let doc = sample_resume();
    let host = FakeImageHost {
        calls: AtomicUsize::new(0),
    };
    let renderer = FlakyRenderer::new(1);
    let metrics = LayoutMetrics {
        content_height_px: Some(1180.0),
    };

    let outcome = export_document(
        &doc,
        &TemplateConfig::builtin(),
        metrics,
        &host,
        &renderer,
        &fast_config(),
    )
    .await
    .unwrap();

    assert_eq!(host.calls.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.stats.images_converted, 2);
    assert_eq!(outcome.stats.images_failed, 1);
    assert_eq!(outcome.asset_failures.len(), 1);
    assert_eq!(
        outcome.asset_failures[0].url(),
        "https://cdn.example.com/broken.png"
    );
    assert_eq!(outcome.artifact.attempts, 2);
    assert_eq!(outcome.stats.attempts, 2);
    assert!(outcome.pagination.is_scaled);
    assert!(!outcome.pagination.cannot_fit);
    assert!(outcome.pagination.scale_factor < 1.0 && outcome.pagination.scale_factor >= 0.9);
    assert_eq!(outcome.warnings.len(), 1, "{:?}", outcome.warnings);

    let sent = renderer.last_payload.lock().unwrap().clone().unwrap();
    assert_eq!(sent.margin, 32.0);
    assert_eq!(outcome.stats.content_bytes, sent.content.len());
    assert!(sent.content.contains("data:image/png;base64,"));
    assert!(sent.content.contains("https://cdn.example.com/broken.png"));
    assert!(!sent.content.contains("https://cdn.example.com/ada.png"));
    assert!(sent.content.contains("scale("));
}

#[tokio::test]
async fn content_that_cannot_fit_still_exports_with_warning() {
    let mut doc = sample_resume();
    doc.base_info.photo = None;
    let host = FakeImageHost {
        calls: AtomicUsize::new(0),
    };
    let renderer = FlakyRenderer::new(0);
    let metrics = LayoutMetrics {
        content_height_px: Some(3000.0),
    };

    let outcome = export_document(
        &doc,
        &TemplateConfig::builtin(),
        metrics,
        &host,
        &renderer,
        &fast_config(),
    )
    .await
    .unwrap();

    assert!(outcome.pagination.cannot_fit);
    assert_eq!(outcome.pagination.scale_factor, 0.9);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.contains("too long for one page")));
    assert_eq!(renderer.calls(), 1);
}

#[tokio::test]
async fn auto_fit_disabled_globally_sends_unscaled_content() {
    let doc = sample_resume();
    let host = FakeImageHost {
        calls: AtomicUsize::new(0),
    };
    let renderer = FlakyRenderer::new(0);
    let config = ExportConfig::builder()
        .retry(RetryPolicy::immediate(0))
        .auto_fit(false)
        .build()
        .unwrap();
    let metrics = LayoutMetrics {
        content_height_px: Some(3000.0),
    };

    let outcome = export_document(
        &doc,
        &TemplateConfig::builtin(),
        metrics,
        &host,
        &renderer,
        &config,
    )
    .await
    .unwrap();

    assert!(!outcome.pagination.is_scaled);
    assert_eq!(outcome.pagination.scale_factor, 1.0);
    let sent = renderer.last_payload.lock().unwrap().clone().unwrap();
    assert!(!sent.content.contains("scale("));
}

#[tokio::test]
async fn filename_falls_back_to_resume_title() {
    let doc = ResumeDocument::new("Ada Lovelace");
    let host = FakeImageHost {
        calls: AtomicUsize::new(0),
    };
    let mut renderer = FlakyRenderer::new(0);
    renderer.disposition = None;

    let outcome = export_document(
        &doc,
        &TemplateConfig::builtin(),
        LayoutMetrics::default(),
        &host,
        &renderer,
        &fast_config(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.artifact.filename, "Ada Lovelace.pdf");
    assert_eq!(host.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_document_never_reaches_renderer() {
    let mut doc = sample_resume();
    doc.skills = "<p>lots of skills</p>".repeat(1000);
    let host = FakeImageHost {
        calls: AtomicUsize::new(0),
    };
    let renderer = FlakyRenderer::new(0);
    let config = ExportConfig::builder()
        .max_content_bytes(4096)
        .retry(RetryPolicy::immediate(2))
        .build()
        .unwrap();

    let err = export_document(
        &doc,
        &TemplateConfig::builtin(),
        LayoutMetrics::default(),
        &host,
        &renderer,
        &config,
    )
    .await
    .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn artifact_written_to_disk() {
    let renderer = FlakyRenderer::new(0);
    let artifact = export_pdf(&renderer, &payload(8), &fast_config())
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&artifact.filename);
    write_pdf(&artifact, &path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
}
