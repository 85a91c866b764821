//! Image compression - downscale to a bounding box and re-encode as a JPEG data URL

use crate::config::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION};
use crate::error::{GalleryError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub max_dimension: u32,
    pub quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// A compressed photo, ready to be stored and displayed as-is
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Dimensions after fitting `width` x `height` inside a `max` x `max` box.
/// Never upscales, and never returns a zero edge.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let scale = 1.0_f64
        .min(max as f64 / width as f64)
        .min(max as f64 / height as f64);

    if scale >= 1.0 {
        return (width, height);
    }

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max);
    (new_width, new_height)
}

/// Decode raw image bytes, shrink them to fit the configured box and
/// re-encode as a lossy JPEG data URL.
pub fn compress(bytes: &[u8], settings: &CompressionSettings) -> Result<CompressedImage> {
    let img = decode(bytes)?;
    let resized = downscale(img, settings.max_dimension);
    encode_data_url(&resized, settings.quality)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| GalleryError::Decode(format!("unreadable image format: {}", e)))?
        .decode()
        .map_err(|e| GalleryError::Decode(e.to_string()))
}

pub(crate) fn downscale(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = fit_within(width, height, max_dimension);

    if (new_width, new_height) == (width, height) {
        return img;
    }

    log::debug!(
        "Resizing image from {}x{} to {}x{}",
        width,
        height,
        new_width,
        new_height
    );
    img.resize_exact(new_width, new_height, FilterType::Triangle)
}

pub(crate) fn encode_data_url(img: &DynamicImage, quality: u8) -> Result<CompressedImage> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| GalleryError::Encode(e.to_string()))?;

    let mut data_url = String::with_capacity(DATA_URL_PREFIX.len() + buffer.len() * 4 / 3 + 4);
    data_url.push_str(DATA_URL_PREFIX);
    BASE64.encode_string(&buffer, &mut data_url);

    Ok(CompressedImage {
        data_url,
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Decode a `data:<mime>;base64,` URL back into pixels
pub fn decode_data_url(data_url: &str) -> Result<DynamicImage> {
    let payload = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| GalleryError::Decode("not a base64 data URL".to_string()))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| GalleryError::Decode(e.to_string()))?;
    decode(&bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_fit_within_never_exceeds_box_and_keeps_aspect() {
        let sizes = [
            (1, 1),
            (800, 800),
            (801, 800),
            (1600, 900),
            (900, 1600),
            (3000, 2000),
            (4032, 3024),
            (10_000, 3),
            (3, 10_000),
            (799, 1201),
        ];

        for (w, h) in sizes {
            let (nw, nh) = fit_within(w, h, 800);
            assert!(nw <= 800 && nh <= 800, "{}x{} -> {}x{}", w, h, nw, nh);
            assert!(nw >= 1 && nh >= 1);

            // One pixel of rounding on the short edge
            let expected_h = nw as f64 * h as f64 / w as f64;
            let expected_w = nh as f64 * w as f64 / h as f64;
            assert!(
                (nh as f64 - expected_h).abs() <= 1.0 || (nw as f64 - expected_w).abs() <= 1.0,
                "{}x{} -> {}x{}",
                w,
                h,
                nw,
                nh
            );
        }
    }

    #[test]
    fn test_fit_within_examples() {
        assert_eq!(fit_within(1600, 900, 800), (800, 450));
        assert_eq!(fit_within(900, 1600, 800), (450, 800));
        assert_eq!(fit_within(3000, 2000, 800), (800, 533));
        assert_eq!(fit_within(640, 480, 800), (640, 480));
        assert_eq!(fit_within(800, 800, 800), (800, 800));
    }

    #[test]
    fn test_compress_large_image_fits_box() {
        let out = compress(&png_bytes(1600, 1000), &CompressionSettings::default()).unwrap();
        assert_eq!((out.width, out.height), (800, 500));
        assert!(out.data_url.starts_with("data:image/jpeg;base64,"));

        let decoded = decode_data_url(&out.data_url).unwrap();
        assert_eq!(decoded.dimensions(), (800, 500));
    }

    #[test]
    fn test_compress_small_image_keeps_dimensions() {
        let out = compress(&png_bytes(320, 240), &CompressionSettings::default()).unwrap();
        assert_eq!((out.width, out.height), (320, 240));

        let decoded = decode_data_url(&out.data_url).unwrap();
        assert_eq!(decoded.dimensions(), (320, 240));
    }

    #[test]
    fn test_compress_drops_alpha() {
        let img = RgbaImage::from_pixel(50, 40, Rgba([10, 20, 30, 0]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();

        let out = compress(&buf, &CompressionSettings::default()).unwrap();
        assert_eq!((out.width, out.height), (50, 40));
    }

    #[test]
    fn test_compress_garbage_fails_explicitly() {
        let err = compress(b"definitely not an image", &CompressionSettings::default()).unwrap_err();
        assert!(matches!(err, GalleryError::Decode(_)));
    }

    #[test]
    fn test_decode_data_url_rejects_plain_strings() {
        assert!(matches!(
            decode_data_url("https://example.com/orion.jpg"),
            Err(GalleryError::Decode(_))
        ));
    }
}
