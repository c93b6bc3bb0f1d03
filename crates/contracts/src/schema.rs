//! SchemaMask - requested output channels
//!
//! Bitset sent to the device when opening a frame grabber. Confidence is
//! always delivered and therefore has no bit.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Bitset of channels the device should stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaMask(u16);

impl SchemaMask {
    /// Radial distance image
    pub const IMG_RDIS: SchemaMask = SchemaMask(1 << 0);
    /// Amplitude image
    pub const IMG_AMP: SchemaMask = SchemaMask(1 << 1);
    /// Raw amplitude image
    pub const IMG_RAMP: SchemaMask = SchemaMask(1 << 2);
    /// Cartesian (point cloud) image
    pub const IMG_CART: SchemaMask = SchemaMask(1 << 3);
    /// Unit vectors
    pub const IMG_UVEC: SchemaMask = SchemaMask(1 << 4);
    /// Exposure times
    pub const EXP_TIME: SchemaMask = SchemaMask(1 << 5);
    /// Gray image
    pub const IMG_GRAY: SchemaMask = SchemaMask(1 << 6);
    /// Illumination temperature
    pub const ILLU_TEMP: SchemaMask = SchemaMask(1 << 7);
    /// Intrinsic calibration
    pub const INTR_CAL: SchemaMask = SchemaMask(1 << 8);
    /// Inverse intrinsic calibration
    pub const INV_INTR_CAL: SchemaMask = SchemaMask(1 << 9);
    /// JSON model
    pub const JSON_MODEL: SchemaMask = SchemaMask(1 << 10);
    /// Distance noise image
    pub const IMG_DIS_NOISE: SchemaMask = SchemaMask(1 << 11);

    /// Minimal mask used while bootstrapping the unit vectors
    pub const UNIT_VECTORS: SchemaMask = Self::IMG_UVEC;

    /// Default mask requested when none is configured
    pub const DEFAULT: SchemaMask = SchemaMask(Self::IMG_AMP.0 | Self::IMG_CART.0);

    /// Wrap raw bits
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn includes(self, other: SchemaMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the channel is requested
    pub fn contains(self, channel: Channel) -> bool {
        self.includes(channel.bit())
    }

    /// Union of two masks
    pub const fn union(self, other: SchemaMask) -> Self {
        Self(self.0 | other.0)
    }

    /// Channels requested by this mask, in publish order
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::PUBLISH_ORDER
            .into_iter()
            .filter(move |channel| self.contains(*channel))
    }
}

impl Default for SchemaMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BitOr for SchemaMask {
    type Output = SchemaMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for SchemaMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Mask-gated output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Cartesian,
    Distance,
    DistanceNoise,
    Amplitude,
    RawAmplitude,
    Gray,
}

impl Channel {
    /// Fixed publish order of the gated channels
    pub const PUBLISH_ORDER: [Channel; 6] = [
        Channel::Cartesian,
        Channel::Distance,
        Channel::DistanceNoise,
        Channel::Amplitude,
        Channel::RawAmplitude,
        Channel::Gray,
    ];

    /// Schema bit enabling this channel
    pub const fn bit(self) -> SchemaMask {
        match self {
            Channel::Cartesian => SchemaMask::IMG_CART,
            Channel::Distance => SchemaMask::IMG_RDIS,
            Channel::DistanceNoise => SchemaMask::IMG_DIS_NOISE,
            Channel::Amplitude => SchemaMask::IMG_AMP,
            Channel::RawAmplitude => SchemaMask::IMG_RAMP,
            Channel::Gray => SchemaMask::IMG_GRAY,
        }
    }
}
