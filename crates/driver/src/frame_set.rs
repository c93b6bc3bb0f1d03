//! Sub-images copied out of the frame buffer

use contracts::{Channel, ImageKind, RawImage, SchemaMask};
use device_session::FrameBuffer;
use tracing::warn;

/// Local copy of one decoded frame
///
/// Pulled under the device lock; conversion and publishing work on this copy
/// after the lock is released.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    pub confidence: RawImage,
    pub cartesian: RawImage,
    pub distance: RawImage,
    pub distance_noise: RawImage,
    pub amplitude: RawImage,
    pub raw_amplitude: RawImage,
    pub gray: RawImage,
    pub rgb: RawImage,
    pub extrinsics: Vec<f32>,
}

fn image_kind(channel: Channel) -> ImageKind {
    match channel {
        Channel::Cartesian => ImageKind::Cartesian,
        Channel::Distance => ImageKind::Distance,
        Channel::DistanceNoise => ImageKind::DistanceNoise,
        Channel::Amplitude => ImageKind::Amplitude,
        Channel::RawAmplitude => ImageKind::RawAmplitude,
        Channel::Gray => ImageKind::Gray,
    }
}

fn fetch<B: FrameBuffer>(buffer: &B, kind: ImageKind) -> RawImage {
    buffer.image(kind).unwrap_or_else(|e| {
        warn!(kind = ?kind, error = %e, "failed to fetch sub-image");
        RawImage::empty()
    })
}

impl FrameSet {
    /// Copy confidence, RGB, extrinsics and every channel enabled in `mask`
    ///
    /// Accessors fail independently; a failed one leaves its slot empty.
    pub fn pull<B: FrameBuffer>(buffer: &B, mask: SchemaMask) -> Self {
        let mut frames = FrameSet {
            confidence: fetch(buffer, ImageKind::Confidence),
            rgb: fetch(buffer, ImageKind::Jpeg),
            extrinsics: buffer.extrinsics().unwrap_or_else(|e| {
                warn!(error = %e, "failed to fetch extrinsics");
                Vec::new()
            }),
            ..Default::default()
        };
        for channel in mask.channels() {
            *frames.slot_mut(channel) = fetch(buffer, image_kind(channel));
        }
        frames
    }

    /// Sub-image of a gated channel
    pub fn channel(&self, channel: Channel) -> &RawImage {
        match channel {
            Channel::Cartesian => &self.cartesian,
            Channel::Distance => &self.distance,
            Channel::DistanceNoise => &self.distance_noise,
            Channel::Amplitude => &self.amplitude,
            Channel::RawAmplitude => &self.raw_amplitude,
            Channel::Gray => &self.gray,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut RawImage {
        match channel {
            Channel::Cartesian => &mut self.cartesian,
            Channel::Distance => &mut self.distance,
            Channel::DistanceNoise => &mut self.distance_noise,
            Channel::Amplitude => &mut self.amplitude,
            Channel::RawAmplitude => &mut self.raw_amplitude,
            Channel::Gray => &mut self.gray,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use contracts::{DeviceError, PixelFormat};

    /// Buffer whose distance accessor fails
    struct PartialBuffer;

    impl FrameBuffer for PartialBuffer {
        fn image(&self, kind: ImageKind) -> Result<RawImage, DeviceError> {
            match kind {
                ImageKind::Distance => Err(DeviceError::new(-1, "decode error")),
                _ => Ok(RawImage::new(1, 1, PixelFormat::Format8U, vec![1u8])),
            }
        }

        fn extrinsics(&self) -> Result<Vec<f32>, DeviceError> {
            Err(DeviceError::new(-1, "no extrinsics"))
        }

        fn timestamp(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    #[test]
    fn test_failed_accessor_leaves_slot_empty() {
        let mask = SchemaMask::IMG_RDIS | SchemaMask::IMG_AMP;
        let frames = FrameSet::pull(&PartialBuffer, mask);

        assert!(frames.distance.is_empty());
        assert!(!frames.amplitude.is_empty());
        assert!(!frames.confidence.is_empty());
        assert!(frames.extrinsics.is_empty());
    }

    #[test]
    fn test_unrequested_channels_not_pulled() {
        let frames = FrameSet::pull(&PartialBuffer, SchemaMask::IMG_AMP);
        assert!(frames.gray.is_empty());
        assert!(frames.cartesian.is_empty());
        assert!(!frames.channel(Channel::Amplitude).is_empty());
    }
}
