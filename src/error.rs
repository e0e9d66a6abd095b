//! Error types for the resume-export library.
//!
//! Fatal and non-fatal failures are kept apart:
//!
//! * [`ExportError`]: **Fatal**: the export cannot produce a PDF (payload
//!   over the size ceiling, renderer unreachable after every retry, bad
//!   configuration). Returned as `Err(ExportError)` from the `export*`
//!   functions; no partial file is ever delivered.
//!
//! * [`DocumentError`]: an update to the résumé model would break one of
//!   its invariants. The document is left untouched.
//!
//! * [`AssetError`]: **Non-fatal**: one image could not be fetched or
//!   encoded. Stored in [`crate::output::InlinedSnapshot::failures`]; the
//!   image keeps its original URL and the export carries on.
//!
//! * [`TransportError`]: one attempt against the rendering service failed.
//!   The exporter retries these; only exhaustion escalates to
//!   [`ExportError::ExportFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the export pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The self-contained HTML is larger than the renderer accepts.
    #[error(
        "Export content is {size} bytes, over the {limit}-byte limit.\n\
Reduce image size or trim content, then export again."
    )]
    PayloadTooLarge { size: usize, limit: usize },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// Every attempt against the rendering service failed.
    #[error("PDF export failed after {attempts} attempts.\nLast error: {last_error}")]
    ExportFailed {
        attempts: u32,
        last_error: TransportError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// `true` for failures the user fixes by changing the document rather
    /// than by trying again later.
    pub fn is_validation(&self) -> bool {
        matches!(self, ExportError::PayloadTooLarge { .. })
    }
}

/// A rejected update to a [`crate::model::ResumeDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Two field descriptors share an id or a key.
    #[error("Duplicate field {what} '{value}' in field order")]
    DuplicateField { what: &'static str, value: String },

    /// A batch reorder added or dropped identifiers.
    #[error(
        "Reorder of '{section}' must be a permutation of the existing items \
(expected {expected} ids, got {actual})"
    )]
    ReorderMismatch {
        section: String,
        expected: usize,
        actual: usize,
    },

    /// No item, section or module carries the given id.
    #[error("No {kind} with id '{id}'")]
    UnknownId { kind: &'static str, id: String },
}

/// A non-fatal error for a single image reference.
///
/// The reference keeps its original URL in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// The fetch itself failed (DNS, refused connection, non-2xx).
    #[error("Image '{url}': fetch failed: {detail}")]
    FetchFailed { url: String, detail: String },

    /// The fetch did not finish within the asset timeout.
    #[error("Image '{url}': fetch timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The URL could not be parsed or resolved against the base URL.
    #[error("Image '{url}': invalid URL: {detail}")]
    InvalidUrl { url: String, detail: String },

    /// Bytes arrived but could not be re-encoded.
    #[error("Image '{url}': encoding failed: {detail}")]
    EncodeFailed { url: String, detail: String },
}

impl AssetError {
    /// The original reference this error belongs to.
    pub fn url(&self) -> &str {
        match self {
            AssetError::FetchFailed { url, .. }
            | AssetError::Timeout { url, .. }
            | AssetError::InvalidUrl { url, .. }
            | AssetError::EncodeFailed { url, .. } => url,
        }
    }
}

/// One failed attempt against the rendering service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The attempt exceeded the per-attempt timeout.
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Connection could not be established or broke mid-response.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The renderer answered with a non-2xx status.
    #[error("renderer returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The renderer answered 2xx with an empty body.
    #[error("renderer returned an empty PDF")]
    EmptyBody,
}
