//! Planar and compressed image conversion

use contracts::{CompressedImageMessage, Header, ImageMessage, PixelFormat, RawImage};
use tracing::{error, warn};

use crate::format::{descriptor, FALLBACK_ENCODING};
use crate::kind;

/// Row stride and payload length, `None` on arithmetic overflow
pub(crate) fn layout(width: u32, height: u32, bytes_per_pixel: u32) -> Option<(u32, usize)> {
    let stride = width.checked_mul(bytes_per_pixel)?;
    let len = u64::from(stride).checked_mul(u64::from(height))?;
    Some((stride, usize::try_from(len).ok()?))
}

/// Convert a planar sub-image
pub fn to_image(source: &RawImage, header: &Header) -> ImageMessage {
    let mut result = ImageMessage::empty(header.clone(), source.width, source.height);

    if source.is_empty() {
        return result;
    }

    let Some(desc) = descriptor(source.format_code) else {
        error!(
            format_code = source.format_code,
            max = PixelFormat::ALL.len(),
            "pixel format out of range"
        );
        observability::record_conversion_rejected(kind::IMAGE);
        return result;
    };

    let (step, len) = match layout(source.width, source.height, desc.bytes_per_pixel) {
        Some((step, len)) if len <= source.data.len() => (step, len),
        _ => {
            error!(
                width = source.width,
                height = source.height,
                format_code = source.format_code,
                available = source.data.len(),
                "image data shorter than its dimensions"
            );
            observability::record_conversion_rejected(kind::IMAGE);
            return result;
        }
    };

    result.encoding = match desc.encoding {
        Some(encoding) => encoding.to_string(),
        None => {
            warn!(
                format_code = source.format_code,
                fallback = FALLBACK_ENCODING,
                "no encoding for pixel format, labelling as fallback"
            );
            FALLBACK_ENCODING.to_string()
        }
    };
    result.step = step;
    result.data = source.data.slice(..len);
    result
}

/// Convert an opaque compressed stream (e.g. JPEG) carried as raw bytes
pub fn to_compressed_image(
    source: &RawImage,
    header: &Header,
    format: &str,
) -> CompressedImageMessage {
    let mut result = CompressedImageMessage {
        header: header.clone(),
        format: format.to_string(),
        data: Default::default(),
    };

    if source.is_empty() {
        return result;
    }

    if !matches!(
        source.format(),
        Some(PixelFormat::Format8U | PixelFormat::Format8S)
    ) {
        error!(
            format = %format,
            format_code = source.format_code,
            "invalid data format for compressed image"
        );
        observability::record_conversion_rejected(kind::COMPRESSED);
        return result;
    }

    match layout(source.width, source.height, 1) {
        Some((_, len)) if len <= source.data.len() => {
            result.data = source.data.slice(..len);
        }
        _ => {
            error!(
                format = %format,
                width = source.width,
                height = source.height,
                available = source.data.len(),
                "compressed data shorter than its dimensions"
            );
            observability::record_conversion_rejected(kind::COMPRESSED);
        }
    }
    result
}
