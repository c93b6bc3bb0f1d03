//! RawImage - Frame Buffer output
//!
//! Decoded sub-images as handed over by the device decoding library.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel format codes reported by the device decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Format8U,
    Format8S,
    Format16U,
    Format16S,
    Format32U,
    Format32S,
    Format32F,
    Format64U,
    Format64F,
    Format16U2,
    Format32F3,
}

impl PixelFormat {
    /// All formats, indexed by their wire code
    pub const ALL: [PixelFormat; 11] = [
        PixelFormat::Format8U,
        PixelFormat::Format8S,
        PixelFormat::Format16U,
        PixelFormat::Format16S,
        PixelFormat::Format32U,
        PixelFormat::Format32S,
        PixelFormat::Format32F,
        PixelFormat::Format64U,
        PixelFormat::Format64F,
        PixelFormat::Format16U2,
        PixelFormat::Format32F3,
    ];

    /// Look up a format by wire code
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Wire code
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Bytes occupied by one pixel (all channels)
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Format8U | PixelFormat::Format8S => 1,
            PixelFormat::Format16U | PixelFormat::Format16S => 2,
            PixelFormat::Format32U | PixelFormat::Format32S | PixelFormat::Format32F => 4,
            PixelFormat::Format64U | PixelFormat::Format64F => 8,
            PixelFormat::Format16U2 => 4,
            PixelFormat::Format32F3 => 12,
        }
    }
}

/// Decoded sub-image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawImage {
    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,

    /// Pixel format code as reported by the decoder (may be unknown)
    pub format_code: u32,

    /// Pixel data, row-major, no padding
    pub data: Bytes,
}

impl RawImage {
    /// Create an image from its parts
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            format_code: format.code(),
            data: data.into(),
        }
    }

    /// Image with no data, signalling "nothing this cycle"
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the decoder produced no bytes for this image
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Known pixel format, if the code is in range
    pub fn format(&self) -> Option<PixelFormat> {
        PixelFormat::from_code(self.format_code)
    }

    /// width × height
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Sub-images a Frame Buffer can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Distance,
    DistanceNoise,
    Amplitude,
    RawAmplitude,
    Gray,
    Confidence,
    Cartesian,
    UnitVectors,
    Jpeg,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_codes_round_trip() {
        for (code, format) in PixelFormat::ALL.iter().enumerate() {
            assert_eq!(format.code(), code as u32);
            assert_eq!(PixelFormat::from_code(code as u32), Some(*format));
        }
        assert_eq!(PixelFormat::from_code(11), None);
    }

    #[test]
    fn test_empty_image() {
        let image = RawImage::empty();
        assert!(image.is_empty());
        assert_eq!(image.pixel_count(), 0);
    }

    #[test]
    fn test_unknown_format_code() {
        let image = RawImage {
            width: 1,
            height: 1,
            format_code: 42,
            data: Bytes::from_static(&[0]),
        };
        assert_eq!(image.format(), None);
    }
}
