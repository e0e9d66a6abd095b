//! Rendering-service transport.
//!
//! One call = one attempt: [`RenderTransport::render`] sends the payload
//! once and classifies the failure. Retrying, timeouts across attempts and
//! size validation live in [`crate::export`].

use crate::error::{ExportError, TransportError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// JSON body sent to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// Self-contained HTML.
    pub content: String,
    /// Page margin in CSS pixels.
    pub margin: f64,
}

/// A successful renderer response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// Raw `Content-Disposition` header, if the renderer sent one.
    pub content_disposition: Option<String>,
}

/// Error body returned by the renderer on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Sends one render request.
pub trait RenderTransport: Send + Sync {
    fn render(
        &self,
        payload: &ExportPayload,
    ) -> impl Future<Output = Result<RenderedPdf, TransportError>> + Send;
}

/// [`RenderTransport`] that POSTs JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRenderClient {
    /// `timeout` bounds each request at the HTTP layer.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ExportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExportError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RenderTransport for HttpRenderClient {
    async fn render(&self, payload: &ExportPayload) -> Result<RenderedPdf, TransportError> {
        let start = Instant::now();
        debug!(
            "POST {} ({} bytes of content, margin {})",
            self.endpoint,
            payload.content.len(),
            payload.margin
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| classify(e, start))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let content_disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| classify(e, start))?;
        debug!("Renderer answered {} bytes in {:?}", bytes.len(), start.elapsed());

        Ok(RenderedPdf {
            bytes: bytes.to_vec(),
            content_disposition,
        })
    }
}

fn classify(e: reqwest::Error, start: Instant) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    } else {
        TransportError::Connection(e.to_string())
    }
}

/// Pull the `error` field out of a JSON error body, or fall back to the
/// raw text.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serialises_to_renderer_shape() {
        let p = ExportPayload {
            content: "<p>x</p>".into(),
            margin: 24.0,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["content"], "<p>x</p>");
        assert_eq!(json["margin"], 24.0);
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"error":"PDF generation failed"}"#), "PDF generation failed");
        assert_eq!(error_message("  upstream down \n"), "upstream down");
        assert_eq!(error_message(""), "no response body");
    }

    #[test]
    fn client_keeps_endpoint() {
        let c = HttpRenderClient::new("http://localhost:3000/generate-pdf", Duration::from_secs(45))
            .unwrap();
        assert_eq!(c.endpoint(), "http://localhost:3000/generate-pdf");
    }
}
