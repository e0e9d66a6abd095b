//! Configuration types for résumé export.
//!
//! All export behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. The retry behaviour lives in its own
//! [`RetryPolicy`] value so it can be constructed and tested on its own.

use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest self-contained HTML payload the renderer accepts: 5 MiB.
pub const MAX_CONTENT_SIZE: usize = 5 * 1024 * 1024;

/// Retries after the first failed attempt. Three attempts in total.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Upper bound accepted for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Per-attempt timeout against the renderer.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(45);

/// Default endpoint of the remote PDF renderer.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/generate-pdf";

/// Delay inserted between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait the same amount before every retry.
    Fixed(Duration),
    /// Wait `base * 2^(retry - 1)`: 500 ms → 1 s → 2 s for a 500 ms base.
    Exponential { base: Duration },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Exponential {
            base: Duration::from_millis(500),
        }
    }
}

/// Bounded retry policy for calls to the rendering service.
///
/// Only transient failures (timeouts, connection errors, non-2xx responses)
/// are retried; size validation happens before the first attempt and is
/// never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Default: 2.
    pub max_retries: u32,
    /// Upper bound on a single attempt. Default: 45 s.
    pub attempt_timeout: Duration,
    /// Delay between attempts. Default: exponential from 500 ms.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately, for tests and local renderers.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
            ..Self::default()
        }
    }

    /// Total number of attempts the policy allows.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before the given 0-based attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Exponential { base } => base.saturating_mul(2u32.saturating_pow(attempt - 1)),
        }
    }
}

/// Configuration for one résumé export.
///
/// # Example
/// ```rust
/// use resume_export::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .endpoint("https://render.example.com/generate-pdf")
///     .margin_px(24.0)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.retry.total_attempts(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// URL the `{content, margin}` JSON body is POSTed to.
    pub endpoint: String,

    /// Margin passed to the renderer, in CSS pixels. Default: 32.
    pub margin_px: f64,

    /// Allow auto-fit scaling. When false, documents are exported at
    /// 100 % even if their own layout settings enable auto-fit. Default: true.
    pub auto_fit: bool,

    /// Payload ceiling in bytes. Default: [`MAX_CONTENT_SIZE`].
    pub max_content_bytes: usize,

    /// Retry policy for renderer calls.
    pub retry: RetryPolicy,

    /// Per-image fetch timeout in seconds. Default: 30.
    pub asset_timeout_secs: u64,

    /// Base URL that relative image references are resolved against.
    pub asset_base_url: Option<String>,

    /// Longest edge, in pixels, an embedded raster image may have.
    /// Larger images are downscaled before encoding. Default: no limit.
    pub max_image_dimension: Option<u32>,

    /// Filename to suggest when the renderer does not send one.
    pub filename: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            margin_px: 32.0,
            auto_fit: true,
            max_content_bytes: MAX_CONTENT_SIZE,
            retry: RetryPolicy::default(),
            asset_timeout_secs: 30,
            asset_base_url: None,
            max_image_dimension: None,
            filename: None,
        }
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn margin_px(mut self, px: f64) -> Self {
        self.config.margin_px = px.max(0.0);
        self
    }

    pub fn auto_fit(mut self, v: bool) -> Self {
        self.config.auto_fit = v;
        self
    }

    pub fn max_content_bytes(mut self, n: usize) -> Self {
        self.config.max_content_bytes = n;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.retry.max_retries = n.min(MAX_RETRIES_LIMIT);
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.retry.attempt_timeout = timeout;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.retry.backoff = backoff;
        self
    }

    pub fn asset_timeout_secs(mut self, secs: u64) -> Self {
        self.config.asset_timeout_secs = secs.max(1);
        self
    }

    pub fn asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.asset_base_url = Some(url.into());
        self
    }

    pub fn max_image_dimension(mut self, px: u32) -> Self {
        self.config.max_image_dimension = Some(px.max(16));
        self
    }

    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.config.filename = Some(name.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        let c = &self.config;
        if !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(ExportError::InvalidConfig(format!(
                "Endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.max_content_bytes == 0 {
            return Err(ExportError::InvalidConfig(
                "Max content size must be ≥ 1 byte".into(),
            ));
        }
        if c.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(ExportError::InvalidConfig(format!(
                "Max retries must be ≤ {MAX_RETRIES_LIMIT}, got {}",
                c.retry.max_retries
            )));
        }
        if c.retry.attempt_timeout.is_zero() {
            return Err(ExportError::InvalidConfig(
                "Attempt timeout must be greater than zero".into(),
            ));
        }
        if let Some(ref base) = c.asset_base_url {
            reqwest::Url::parse(base).map_err(|e| {
                ExportError::InvalidConfig(format!("Invalid asset base URL '{base}': {e}"))
            })?;
        }
        Ok(self.config)
    }
}
