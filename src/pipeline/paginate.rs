//! Auto-fit: shrink rendered content so it fits one A4 page.
//!
//! The computation is a pure function of the measured content height, the
//! page padding and the enabled flag. Nothing is cached between calls, so
//! re-evaluating it on every layout change is always safe.
//!
//! Shrinking stops at [`MIN_SCALE`]: below 90 % résumé text becomes hard to
//! read, so content that still overflows is flagged with `cannot_fit` and
//! left for the caller to show as a warning.

use serde::{Deserialize, Serialize};

/// Millimetres → CSS pixels at 96 DPI.
pub const MM_TO_PX: f64 = 96.0 / 25.4;

/// A4 page height in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// A4 page width in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;

/// Smallest scale factor auto-fit will apply.
pub const MIN_SCALE: f64 = 0.9;

/// A4 page height in CSS pixels.
pub fn page_height_px() -> f64 {
    A4_HEIGHT_MM * MM_TO_PX
}

/// Result of an auto-fit evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Scale applied to the content, in `[MIN_SCALE, 1]`.
    pub scale_factor: f64,
    /// Whether any scaling is applied.
    pub is_scaled: bool,
    /// Content overflows one page even at [`MIN_SCALE`].
    pub cannot_fit: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PaginationState {
    /// No scaling.
    pub const IDENTITY: PaginationState = PaginationState {
        scale_factor: 1.0,
        is_scaled: false,
        cannot_fit: false,
    };

    /// Clamped to [`MIN_SCALE`] and still overflowing.
    pub const FLOOR: PaginationState = PaginationState {
        scale_factor: MIN_SCALE,
        is_scaled: true,
        cannot_fit: true,
    };

    /// Wrap markup in a container that applies the scale.
    ///
    /// The container's width is widened by `1 / scale` so that after the
    /// transform the content still spans the full page width. Unscaled
    /// markup is returned unchanged.
    pub fn apply(&self, html: &str) -> String {
        if !self.is_scaled {
            return html.to_string();
        }
        let s = self.scale_factor;
        format!(
            "<div class=\"auto-fit\" style=\"transform: scale({s:.4}); transform-origin: top left; width: {:.4}%\">{html}</div>",
            100.0 / s
        )
    }
}

/// Compute the scale needed to fit content on one page.
///
/// `content_height` is the measured height of the content box including
/// its own padding; `page_padding` is the uniform padding on each side.
pub fn compute_fit(content_height: f64, page_padding: f64, enabled: bool) -> PaginationState {
    if !enabled || content_height <= 0.0 {
        return PaginationState::IDENTITY;
    }

    let available_height = page_height_px() - 2.0 * page_padding;
    if available_height <= 0.0 {
        // Padding alone fills the page.
        return PaginationState::FLOOR;
    }
    let actual_content_height = content_height - 2.0 * page_padding;

    if actual_content_height <= available_height {
        return PaginationState::IDENTITY;
    }

    let ideal_scale = available_height / actual_content_height;
    if ideal_scale.is_finite() && (MIN_SCALE..=1.0).contains(&ideal_scale) {
        PaginationState {
            scale_factor: ideal_scale,
            is_scaled: true,
            cannot_fit: false,
        }
    } else {
        PaginationState::FLOOR
    }
}

/// Y offsets, in content pixels, at which page boundaries fall.
///
/// Used to draw page-break guides in a preview. Content that fits one page
/// yields no breaks.
pub fn page_breaks(content_height: f64, page_padding: f64) -> Vec<f64> {
    let available = page_height_px() - 2.0 * page_padding;
    if available <= 0.0 || content_height <= 0.0 {
        return Vec::new();
    }
    let actual = content_height - 2.0 * page_padding;
    let mut breaks = Vec::new();
    let mut y = available;
    while y < actual {
        breaks.push(page_padding + y);
        y += available;
    }
    breaks
}
