//! # resume-export
//!
//! Résumé document model, single-page auto-fit and PDF export through a
//! remote HTML-to-PDF renderer.
//!
//! ## Why this crate?
//!
//! A résumé built in an editor references its photo and inline images by
//! URL, and it is usually meant to print on exactly one A4 page. A headless
//! renderer sees neither the editor's network context nor its layout, so
//! this crate hands it a self-contained document instead: every image is
//! embedded as a `data:` URI and slightly long content is scaled down (to
//! no less than 90 %) so it fits the page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ResumeDocument
//!  │
//!  ├─ 1. Render   document + template → markup fragment
//!  ├─ 2. Inline   fetch every image concurrently, embed as data: URIs
//!  ├─ 3. Fit      scale factor so the content fits one A4 page
//!  ├─ 4. Validate reject payloads over 5 MiB before any network call
//!  ├─ 5. Export   POST {content, margin}; 45 s per attempt, 3 attempts
//!  └─ 6. Output   PDF bytes + pagination state + warnings + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_export::{export_resume, ExportConfig, LayoutMetrics, ResumeDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut doc = ResumeDocument::new("Ada Lovelace");
//!     doc.base_info.name = "Ada Lovelace".into();
//!
//!     let config = ExportConfig::default();
//!     let metrics = LayoutMetrics { content_height_px: Some(1180.0) };
//!     let outcome = export_resume(&doc, metrics, &config).await?;
//!     std::fs::write(&outcome.artifact.filename, &outcome.artifact.bytes)?;
//!     for w in &outcome.warnings {
//!         eprintln!("warning: {w}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resume-export = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod markup;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod render;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Backoff, ExportConfig, ExportConfigBuilder, RetryPolicy};
pub use error::{AssetError, DocumentError, ExportError, TransportError};
pub use export::{
    export_document, export_pdf, export_resume, export_to_file, validate_payload, write_pdf,
    LayoutMetrics,
};
pub use markup::{Element, Fragment, Node};
pub use model::{ItemId, ResumeDocument, TemplateConfig};
pub use output::{ExportOutcome, ExportStats, InlinedSnapshot, PdfArtifact};
pub use pipeline::fetch::{AssetFetcher, FetchedAsset, HttpAssetFetcher};
pub use pipeline::inline::{inline_images, InlineOptions};
pub use pipeline::paginate::{compute_fit, page_breaks, PaginationState};
pub use pipeline::transport::{ExportPayload, HttpRenderClient, RenderTransport, RenderedPdf};
pub use render::{html_document, render_document};
