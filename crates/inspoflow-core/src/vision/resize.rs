//! Image preparation: decode from any supported format, scale to fit the
//! provider's bounding box, re-encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

use crate::error::PipelineError;

/// Scale `(width, height)` by the smaller of the two box ratios so the
/// result fits entirely inside `max_width` x `max_height`, keeping aspect
/// ratio. Small images are scaled up to touch the box.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let width_ratio = max_width as f64 / width as f64;
    let height_ratio = max_height as f64 / height as f64;
    let ratio = width_ratio.min(height_ratio);

    let scaled = |dim: u32| ((dim as f64 * ratio).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Decode image bytes, detecting the format from content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Image {
            message: format!("Cannot detect image format: {e}"),
        })?;
    if reader.format().is_none() {
        return Err(PipelineError::Image {
            message: "Unrecognized image format".to_string(),
        });
    }
    reader.decode().map_err(|e| PipelineError::Image {
        message: e.to_string(),
    })
}

/// Encode as baseline JPEG at `quality` (1-100). Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, PipelineError> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&rgb)
        .map_err(|e| PipelineError::Image {
            message: format!("JPEG encoding failed: {e}"),
        })?;
    Ok(buffer)
}

/// Decode, fit into a `max_dimension` square box and re-encode as JPEG.
pub fn prepare(bytes: &[u8], max_dimension: u32, quality: u8) -> Result<Vec<u8>, PipelineError> {
    let image = decode(bytes)?;
    let (width, height) = image.dimensions();
    let (target_w, target_h) = fit_within(width, height, max_dimension, max_dimension);

    let resized = if (target_w, target_h) == (width, height) {
        image
    } else {
        image.resize_exact(target_w, target_h, FilterType::Triangle)
    };
    tracing::trace!("Resized {width}x{height} -> {target_w}x{target_h}");

    encode_jpeg(&resized, quality)
}

/// `prepare` on the blocking thread pool.
pub async fn prepare_blocking(
    bytes: Vec<u8>,
    max_dimension: u32,
    quality: u8,
) -> Result<Vec<u8>, PipelineError> {
    tokio::task::spawn_blocking(move || prepare(&bytes, max_dimension, quality))
        .await
        .map_err(|e| PipelineError::Image {
            message: format!("Task join error: {e}"),
        })?
}

/// Re-encode at original size on the blocking thread pool.
pub async fn reencode_blocking(bytes: Vec<u8>, quality: u8) -> Result<Vec<u8>, PipelineError> {
    tokio::task::spawn_blocking(move || encode_jpeg(&decode(&bytes)?, quality))
        .await
        .map_err(|e| PipelineError::Image {
            message: format!("Task join error: {e}"),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgba8(width, height);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_fit_within_landscape_uses_width_ratio() {
        assert_eq!(fit_within(2048, 1024, 1024, 1024), (1024, 512));
    }

    #[test]
    fn test_fit_within_portrait_uses_height_ratio() {
        // Typical phone screenshot
        assert_eq!(fit_within(1179, 2556, 1024, 1024), (472, 1024));
    }

    #[test]
    fn test_fit_within_scales_small_images_up() {
        assert_eq!(fit_within(100, 50, 1024, 1024), (1024, 512));
    }

    #[test]
    fn test_fit_within_never_produces_zero() {
        assert_eq!(fit_within(10_000, 1, 1024, 1024), (1024, 1));
    }

    #[test]
    fn test_prepare_outputs_jpeg_inside_box() {
        let jpeg = prepare(&png_bytes(2000, 500), 1024, 80).unwrap();
        // JPEG SOI marker
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (1024, 256));
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        let err = prepare(b"definitely not an image", 1024, 80).unwrap_err();
        assert!(matches!(err, PipelineError::Image { .. }));
    }

    #[tokio::test]
    async fn test_prepare_blocking() {
        let jpeg = prepare_blocking(png_bytes(64, 64), 32, 80).await.unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));
    }

    #[tokio::test]
    async fn test_reencode_keeps_dimensions() {
        let jpeg = reencode_blocking(png_bytes(300, 120), 80).await.unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (300, 120));
    }
}
