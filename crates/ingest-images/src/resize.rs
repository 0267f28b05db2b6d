//! Thumbnail normalization.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::ImageError;

/// Decode, shrink to fit within `max_dimension`, and re-encode as JPEG.
///
/// Aspect ratio is preserved and images already within bounds are never
/// upscaled. The output is always RGB JPEG regardless of the input format.
pub fn resize_to_jpeg(
    bytes: &[u8],
    max_dimension: u32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let decoded = image::load_from_memory(bytes)?;

    let resized = if decoded.width() > max_dimension || decoded.height() > max_dimension {
        decoded.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}
