//! Output types produced by the export pipeline.

use crate::error::AssetError;
use crate::pipeline::paginate::PaginationState;
use serde::{Deserialize, Serialize};

/// Self-contained markup produced by the image inliner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlinedSnapshot {
    /// Serialised markup with every successfully fetched image embedded.
    pub html: String,
    /// Images replaced by a `data:` URI.
    pub converted: usize,
    /// Images that already were `data:` URIs.
    pub already_inline: usize,
    /// Images left with their original reference.
    pub failures: Vec<AssetError>,
}

impl InlinedSnapshot {
    /// `true` when no image was left pointing at an external URL.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A rendered PDF returned by the rendering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfArtifact {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Always `application/pdf`.
    pub content_type: String,
    /// Suggested download filename.
    pub filename: String,
    /// Attempts it took, 1-based.
    pub attempts: u32,
}

/// Timings and counts for one end-to-end export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    /// Bytes of HTML sent to the renderer.
    pub content_bytes: usize,
    pub images_converted: usize,
    pub images_failed: usize,
    /// Attempts against the renderer, 1-based.
    pub attempts: u32,
    /// Wall-clock time spent inlining images.
    pub inline_duration_ms: u64,
    /// Wall-clock time spent waiting on the renderer.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of [`crate::export::export_document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub artifact: PdfArtifact,
    pub pagination: PaginationState,
    /// Images that could not be embedded.
    pub asset_failures: Vec<AssetError>,
    /// Non-blocking notices to show the user (e.g. content does not fit).
    pub warnings: Vec<String>,
    pub stats: ExportStats,
}
