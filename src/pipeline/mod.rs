//! Pipeline stages for résumé export.
//!
//! Each submodule implements one step, so each can be tested on its own
//! and the two network seams ([`fetch::AssetFetcher`] and
//! [`transport::RenderTransport`]) can be replaced by test doubles.
//!
//! ## Data Flow
//!
//! ```text
//! fragment ──▶ inline ──▶ paginate ──▶ transport
//!             (fetch +     (auto-fit)   (POST to renderer)
//!              encode)
//! ```
//!
//! 1. [`fetch`]     resolve an image reference and download its bytes
//! 2. [`encode`]    sniff the MIME type, optionally downscale, base64-wrap
//! 3. [`inline`]    run 1 and 2 for every image concurrently and rebuild
//!    the markup
//! 4. [`paginate`]  compute the scale factor that fits the content on one
//!    A4 page
//! 5. [`transport`] one request against the rendering service; retries are
//!    driven from [`crate::export`]

pub mod encode;
pub mod fetch;
pub mod inline;
pub mod paginate;
pub mod transport;
