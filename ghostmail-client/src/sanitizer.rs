// ghostmail-client/src/sanitizer.rs
//! Metadata stripping for image attachments.
//!
//! The image is fully decoded and encoded again from pixels only. Encoders
//! here never receive the source's EXIF, XMP, ICC or text chunks, so nothing
//! of that survives.

use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Extensions treated as images when deciding whether to sanitize
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "gif"];

/// Formats re-encoded in place; anything else becomes PNG
const ENCODABLE: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::Gif,
];

const JPEG_QUALITY: u8 = 95;

#[derive(Debug)]
pub struct Sanitized {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl Sanitized {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decode the image at `path` and re-encode it without metadata
pub fn strip(path: &Path) -> Result<Sanitized> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let detected = reader.format();
    let image = reader
        .decode()
        .map_err(|e| Error::Format(format!("{}: {}", path.display(), e)))?;

    let format = match detected {
        Some(format) if ENCODABLE.contains(&format) => format,
        _ => ImageFormat::Png,
    };
    let image = normalize(image, format);

    let mut bytes = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
            image.write_with_encoder(encoder)
        }
        _ => image.write_to(&mut Cursor::new(&mut bytes), format),
    }
    .map_err(|e| Error::Format(format!("re-encoding {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), ?format, size = bytes.len(), "stripped image metadata");
    Ok(Sanitized { bytes, format })
}

/// Convert pixel layout into something the target encoder accepts
fn normalize(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    let color = image.color();
    match format {
        ImageFormat::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => image,
            _ => DynamicImage::ImageRgb8(image.to_rgb8()),
        },
        ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
        ImageFormat::Png => match color {
            ColorType::Rgb32F | ColorType::Rgba32F => to_eight_bit(image),
            _ => image,
        },
        // The TIFF encoder has no gray+alpha layouts
        ImageFormat::Tiff => match color {
            ColorType::La8 => DynamicImage::ImageRgba8(image.to_rgba8()),
            ColorType::La16 => DynamicImage::ImageRgba16(image.to_rgba16()),
            ColorType::Rgb32F | ColorType::Rgba32F => to_eight_bit(image),
            _ => image,
        },
        ImageFormat::Bmp => match color {
            ColorType::L8 | ColorType::Rgb8 | ColorType::Rgba8 => image,
            _ => to_eight_bit(image),
        },
        _ => to_eight_bit(image),
    }
}

fn to_eight_bit(image: DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}
