//! Asset fetching for the image inliner.
//!
//! [`AssetFetcher`] is the seam between the inliner and the network: the
//! library ships [`HttpAssetFetcher`] (reqwest), tests plug in doubles.

use crate::error::{AssetError, ExportError};
use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Raw bytes of a fetched asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the server, if any.
    pub content_type: Option<String>,
}

/// Fetches image assets by absolute URL.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedAsset, AssetError>> + Send;
}

/// Resolve an image reference against an optional base URL.
pub fn resolve_url(src: &str, base: Option<&Url>) -> Result<Url, AssetError> {
    let src = src.trim();
    // Joining an absolute URL onto a base yields the absolute URL unchanged.
    let resolved = match base {
        Some(base) => base.join(src),
        None => Url::parse(src),
    };
    resolved.map_err(|e| AssetError::InvalidUrl {
        url: src.to_string(),
        detail: match base {
            Some(_) => e.to_string(),
            None => format!("{e} (no asset base URL configured)"),
        },
    })
}

/// [`AssetFetcher`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpAssetFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ExportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExportError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError> {
        debug!("Fetching asset: {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AssetError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                AssetError::FetchFailed {
                    url: url.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(AssetError::FetchFailed {
                url: url.to_string(),
                detail: format!("HTTP {}", response.status()),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::FetchFailed {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

        Ok(FetchedAsset {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        let url = resolve_url("https://cdn.example.com/a.png", None).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.png");
    }

    #[test]
    fn relative_urls_join_base() {
        let base = Url::parse("https://app.example.com/editor/").unwrap();
        let url = resolve_url("/uploads/me.jpg", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/uploads/me.jpg");
        let url = resolve_url("me.jpg", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/editor/me.jpg");
    }

    #[test]
    fn relative_without_base_is_an_asset_error() {
        let err = resolve_url("me.jpg", None).unwrap_err();
        assert!(matches!(err, AssetError::InvalidUrl { .. }));
        assert_eq!(err.url(), "me.jpg");
    }
}
