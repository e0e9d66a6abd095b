//! Image inlining: external image references → embedded `data:` URIs.
//!
//! The inliner never touches the caller's fragment. It clones it, issues
//! every fetch at once, and applies the results by [`ImageSlot`] so the
//! order in which fetches complete does not matter.
//!
//! ## Failure policy
//!
//! Each reference produces a [`Conversion`]. A failed one is logged and
//! recorded, and the reference keeps its original URL: one missing asset
//! must not block the export of the whole résumé. [`inline_images`]
//! itself cannot fail.

use crate::config::ExportConfig;
use crate::error::{AssetError, ExportError};
use crate::markup::{Fragment, ImageSlot};
use crate::output::InlinedSnapshot;
use crate::pipeline::encode::{detect_mime, downscale, is_data_uri, to_data_uri};
use crate::pipeline::fetch::{resolve_url, AssetFetcher};
use futures::future::join_all;
use reqwest::Url;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of converting one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// The `data:` URI replacing the reference.
    Converted(String),
    /// Why the reference was left as is.
    Failed(AssetError),
}

/// Knobs for [`inline_images`].
#[derive(Debug, Clone)]
pub struct InlineOptions {
    pub base_url: Option<Url>,
    pub timeout: Duration,
    pub max_image_dimension: Option<u32>,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            max_image_dimension: None,
        }
    }
}

impl InlineOptions {
    pub fn from_config(config: &ExportConfig) -> Result<Self, ExportError> {
        let base_url = config
            .asset_base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| ExportError::InvalidConfig(format!("Invalid asset base URL: {e}")))?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(config.asset_timeout_secs),
            max_image_dimension: config.max_image_dimension,
        })
    }
}

/// Embed every image of `fragment` and serialise the result.
pub async fn inline_images<F: AssetFetcher>(
    fragment: &Fragment,
    fetcher: &F,
    options: &InlineOptions,
) -> InlinedSnapshot {
    let start = Instant::now();
    let mut copy = fragment.clone();
    let refs = copy.image_refs();

    let (embedded, pending): (Vec<_>, Vec<_>) = refs.into_iter().partition(|r| is_data_uri(&r.src));
    debug!(
        "Inlining {} images ({} already embedded)",
        pending.len(),
        embedded.len()
    );

    let results = join_all(pending.iter().map(|r| async move {
        (r.slot, convert_image(fetcher, &r.src, options).await)
    }))
    .await;

    let mut replacements: HashMap<ImageSlot, String> = HashMap::new();
    let mut failures = Vec::new();
    for (slot, conversion) in results {
        match conversion {
            Conversion::Converted(uri) => {
                replacements.insert(slot, uri);
            }
            Conversion::Failed(e) => {
                warn!("Keeping original image reference: {}", e);
                failures.push(e);
            }
        }
    }

    copy.replace_images(&replacements);
    let html = copy.to_html();

    info!(
        "Inlined {}/{} images in {}ms ({} bytes of markup)",
        replacements.len(),
        pending.len(),
        start.elapsed().as_millis(),
        html.len()
    );

    InlinedSnapshot {
        html,
        converted: replacements.len(),
        already_inline: embedded.len(),
        failures,
    }
}

/// Fetch, optionally downscale, and encode one image reference.
pub async fn convert_image<F: AssetFetcher>(
    fetcher: &F,
    src: &str,
    options: &InlineOptions,
) -> Conversion {
    let url = match resolve_url(src, options.base_url.as_ref()) {
        Ok(url) => url,
        Err(e) => return Conversion::Failed(e),
    };

    let fetched = match tokio::time::timeout(options.timeout, fetcher.fetch(url.as_str())).await {
        Ok(Ok(asset)) => asset,
        Ok(Err(e)) => return Conversion::Failed(e),
        Err(_) => {
            return Conversion::Failed(AssetError::Timeout {
                url: url.to_string(),
                secs: options.timeout.as_secs(),
            })
        }
    };

    let mime = detect_mime(&fetched.bytes, fetched.content_type.as_deref());

    let bytes = match options.max_image_dimension {
        None => fetched.bytes,
        Some(max) => {
            let original = fetched.bytes;
            let mime_owned = mime.clone();
            let url_owned = url.to_string();
            // Decoding and resizing are CPU-bound.
            let resized = tokio::task::spawn_blocking(move || {
                match downscale(&original, &mime_owned, max) {
                    Ok(Some(smaller)) => smaller,
                    Ok(None) => original,
                    Err(e) => {
                        warn!("Embedding '{}' at original size: {}", url_owned, e);
                        original
                    }
                }
            })
            .await;
            match resized {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Conversion::Failed(AssetError::EncodeFailed {
                        url: url.to_string(),
                        detail: format!("resize task failed: {e}"),
                    })
                }
            }
        }
    };

    Conversion::Converted(to_data_uri(&bytes, &mime))
}
