//! Image payload extraction for slot photos.

use crate::error::{Error, Result};
use crate::types::{Shape, Slot};

/// Extensions written as-is. Anything else is saved as `jpg`.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["bmp", "gif", "jpg", "png", "tiff", "wmf"];

/// Fallback extension for unsupported media types (e.g. MPO multi-picture JPEGs).
const DEFAULT_EXTENSION: &str = "jpg";

/// Bytes of one slot photo, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub slot: Slot,
    pub bytes: Vec<u8>,
    /// Normalized extension, one of [`SUPPORTED_EXTENSIONS`].
    pub ext: &'static str,
}

/// Pull the raw bytes and a normalized extension out of a picture shape.
///
/// The bytes are never re-encoded; an unsupported format is only relabelled.
pub fn extract_image(shape: &Shape, slot: Slot) -> Result<ExtractedImage> {
    let image = shape.image().ok_or_else(|| Error::ImageExtraction {
        slot,
        reason: format!("shape '{}' is not a picture", shape.name),
    })?;

    let bytes = match &image.data {
        Some(data) if !data.is_empty() => data.clone(),
        Some(_) => {
            return Err(Error::ImageExtraction {
                slot,
                reason: "embedded image is empty".to_string(),
            })
        }
        None => {
            return Err(Error::ImageExtraction {
                slot,
                reason: format!("embedded {} image data is unreadable", image.media_type),
            })
        }
    };

    Ok(ExtractedImage {
        slot,
        bytes,
        ext: normalize_extension(&image.media_type),
    })
}

/// Map a media type to a file extension: the subtype, lower-cased, with
/// `jpeg`/`x-ms-bmp` aliases folded and anything unsupported forced to `jpg`.
pub fn normalize_extension(media_type: &str) -> &'static str {
    let subtype = media_type
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    let ext = match subtype.as_str() {
        "jpeg" => "jpg",
        "x-ms-bmp" => "bmp",
        other => other,
    };

    SUPPORTED_EXTENSIONS
        .iter()
        .find(|&&supported| supported == ext)
        .copied()
        .unwrap_or(DEFAULT_EXTENSION)
}
