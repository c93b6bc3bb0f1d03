//! Published output topics

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Channel;

/// Output topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Cloud,
    Distance,
    DistanceNoise,
    Amplitude,
    RawAmplitude,
    Confidence,
    GrayImage,
    RgbImage,
    UnitVectors,
    Extrinsics,
}

impl Topic {
    /// Every topic the driver advertises
    pub const ALL: [Topic; 10] = [
        Topic::Cloud,
        Topic::Distance,
        Topic::DistanceNoise,
        Topic::Amplitude,
        Topic::RawAmplitude,
        Topic::Confidence,
        Topic::GrayImage,
        Topic::RgbImage,
        Topic::UnitVectors,
        Topic::Extrinsics,
    ];

    /// Topic name
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Cloud => "cloud",
            Topic::Distance => "distance",
            Topic::DistanceNoise => "distance_noise",
            Topic::Amplitude => "amplitude",
            Topic::RawAmplitude => "raw_amplitude",
            Topic::Confidence => "confidence",
            Topic::GrayImage => "gray_image",
            Topic::RgbImage => "rgb_image",
            Topic::UnitVectors => "unit_vectors",
            Topic::Extrinsics => "extrinsics",
        }
    }

    /// Late subscribers must receive the last published value
    pub fn is_latched(self) -> bool {
        matches!(self, Topic::UnitVectors)
    }

    /// Mask channel gating this topic, `None` when ungated
    pub fn channel(self) -> Option<Channel> {
        match self {
            Topic::Cloud => Some(Channel::Cartesian),
            Topic::Distance => Some(Channel::Distance),
            Topic::DistanceNoise => Some(Channel::DistanceNoise),
            Topic::Amplitude => Some(Channel::Amplitude),
            Topic::RawAmplitude => Some(Channel::RawAmplitude),
            Topic::GrayImage => Some(Channel::Gray),
            Topic::Confidence | Topic::RgbImage | Topic::UnitVectors | Topic::Extrinsics => None,
        }
    }

    /// Topic carrying a gated channel
    pub fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::Cartesian => Topic::Cloud,
            Channel::Distance => Topic::Distance,
            Channel::DistanceNoise => Topic::DistanceNoise,
            Channel::Amplitude => Topic::Amplitude,
            Channel::RawAmplitude => Topic::RawAmplitude,
            Channel::Gray => Topic::GrayImage,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
