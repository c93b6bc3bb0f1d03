//! Pixel format table
//!
//! Maps device format codes to an encoding tag and a pixel width.

use contracts::PixelFormat;

/// Encoding used when a format has no declared tag
pub const FALLBACK_ENCODING: &str = "8UC1";

/// Encoding descriptor of a pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Encoding tag; `None` for formats without one (32U, 64U)
    pub encoding: Option<&'static str>,
    /// Bytes per pixel, all channels included
    pub bytes_per_pixel: u32,
}

/// Descriptor for a format code, `None` when the code is out of range
pub fn descriptor(code: u32) -> Option<FormatDescriptor> {
    let format = PixelFormat::from_code(code)?;
    let encoding = match format {
        PixelFormat::Format8U => Some("8UC1"),
        PixelFormat::Format8S => Some("8SC1"),
        PixelFormat::Format16U => Some("16UC1"),
        PixelFormat::Format16S => Some("16SC1"),
        PixelFormat::Format32U => None,
        PixelFormat::Format32S => Some("32SC1"),
        PixelFormat::Format32F => Some("32FC1"),
        PixelFormat::Format64U => None,
        PixelFormat::Format64F => Some("64FC1"),
        PixelFormat::Format16U2 => Some("16UC2"),
        PixelFormat::Format32F3 => Some("32FC3"),
    };
    Some(FormatDescriptor {
        encoding,
        bytes_per_pixel: format.bytes_per_pixel(),
    })
}
