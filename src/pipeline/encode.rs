//! Asset encoding: fetched bytes → `data:` URI.
//!
//! The renderer has no network access to the user's assets, so every image
//! travels inside the HTML as base64. Raster images larger than the
//! configured maximum edge are downscaled first: a 12-megapixel phone photo
//! shown at 90 × 120 px would otherwise eat most of the 5 MiB payload
//! budget on its own.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Work out the MIME type of an asset.
///
/// A usable `Content-Type` header wins; otherwise the bytes are sniffed.
pub fn detect_mime(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if !essence.is_empty() && essence != "application/octet-stream" {
            return essence;
        }
    }
    if looks_like_svg(bytes) {
        return "image/svg+xml".to_string();
    }
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => "application/octet-stream".to_string(),
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Downscale a PNG or JPEG whose longest edge exceeds `max_dimension`.
///
/// Returns `Ok(None)` when the image is already small enough or is not a
/// format we re-encode (SVG, GIF, WebP pass through untouched).
pub fn downscale(
    bytes: &[u8],
    mime: &str,
    max_dimension: u32,
) -> Result<Option<Vec<u8>>, image::ImageError> {
    let format = match mime {
        "image/png" => ImageFormat::Png,
        "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
        _ => return Ok(None),
    };
    let img = image::load_from_memory_with_format(bytes, format)?;
    if img.width().max(img.height()) <= max_dimension {
        return Ok(None);
    }
    let resized = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    let resized = if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel.
        image::DynamicImage::ImageRgb8(resized.to_rgb8())
    } else {
        resized
    };
    let mut buf = Vec::new();
    resized.write_to(&mut Cursor::new(&mut buf), format)?;
    debug!(
        "Downscaled {}x{} → {}x{} ({} → {} bytes)",
        img.width(),
        img.height(),
        resized.width(),
        resized.height(),
        bytes.len(),
        buf.len()
    );
    Ok(Some(buf))
}

/// Wrap bytes as a base64 `data:` URI.
pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// `true` for references that are already self-contained.
pub fn is_data_uri(src: &str) -> bool {
    src.trim_start()
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode should succeed");
        buf
    }

    #[test]
    fn mime_from_header_wins() {
        assert_eq!(detect_mime(b"whatever", Some("image/webp; q=1")), "image/webp");
    }

    #[test]
    fn mime_sniffed_when_header_is_generic() {
        let bytes = png(4, 4);
        assert_eq!(detect_mime(&bytes, Some("application/octet-stream")), "image/png");
        assert_eq!(detect_mime(&bytes, None), "image/png");
        assert_eq!(
            detect_mime(br#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#, None),
            "image/svg+xml"
        );
        assert_eq!(detect_mime(b"????", None), "application/octet-stream");
    }

    #[test]
    fn data_uri_round_trips_through_base64() {
        let uri = to_data_uri(&[1, 2, 3], "image/png");
        assert_eq!(uri, "data:image/png;base64,AQID");
        assert!(is_data_uri(&uri));
        assert!(is_data_uri("DATA:image/gif;base64,"));
        assert!(!is_data_uri("https://example.com/a.png"));
        assert!(!is_data_uri("dat"));
    }

    #[test]
    fn downscale_shrinks_large_png() {
        let bytes = png(400, 200);
        let out = downscale(&bytes, "image/png", 100)
            .expect("decode")
            .expect("should be resized");
        let img = image::load_from_memory(&out).expect("valid png");
        assert_eq!((img.width(), img.height()), (100, 50));
    }

    #[test]
    fn downscale_leaves_small_and_unsupported_images() {
        let bytes = png(20, 20);
        assert!(downscale(&bytes, "image/png", 100).unwrap().is_none());
        assert!(downscale(b"<svg/>", "image/svg+xml", 10).unwrap().is_none());
    }
}
