//! Output records - Conversion Pipeline output
//!
//! Typed, dimensioned, time-stamped records handed to the output sink.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record header: frame of reference + stamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Frame-of-reference identifier
    pub frame_id: String,

    /// Capture stamp
    pub stamp: DateTime<Utc>,
}

impl Header {
    /// Create a header
    pub fn new(frame_id: impl Into<String>, stamp: DateTime<Utc>) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
        }
    }
}

/// Frame-of-reference identifiers derived from a base name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameIds {
    /// `<base>_link`, used by the point cloud
    pub link: String,

    /// `<base>_optical_link`, used by every image
    pub optical_link: String,
}

impl FrameIds {
    /// Derive both identifiers from the base name
    pub fn from_base(base: &str) -> Self {
        Self {
            link: format!("{base}_link"),
            optical_link: format!("{base}_optical_link"),
        }
    }
}

/// Planar image record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMessage {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    /// Encoding tag (e.g. "16UC1"); empty when the source was rejected or empty
    pub encoding: String,
    pub is_bigendian: bool,
    /// Row length in bytes
    pub step: u32,
    pub data: Bytes,
}

impl ImageMessage {
    /// Record carrying only header and dimensions
    pub fn empty(header: Header, width: u32, height: u32) -> Self {
        Self {
            header,
            height,
            width,
            encoding: String::new(),
            is_bigendian: false,
            step: 0,
            data: Bytes::new(),
        }
    }
}

/// Opaque compressed image record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedImageMessage {
    pub header: Header,
    /// Container format (e.g. "jpeg")
    pub format: String,
    pub data: Bytes,
}

/// Datatype of a point field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PointFieldType {
    Int8 = 1,
    Uint8 = 2,
    Int16 = 3,
    Uint16 = 4,
    Int32 = 5,
    Uint32 = 6,
    Float32 = 7,
    Float64 = 8,
}

/// Layout of one field inside a point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointField {
    pub name: String,
    /// Byte offset inside the point
    pub offset: u32,
    pub datatype: PointFieldType,
    pub count: u32,
}

/// Point cloud record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudMessage {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub fields: Vec<PointField>,
    pub is_bigendian: bool,
    /// Bytes per point
    pub point_step: u32,
    /// Bytes per row
    pub row_step: u32,
    pub data: Bytes,
    /// No invalid points are represented
    pub is_dense: bool,
}

impl PointCloudMessage {
    /// Record carrying only header and dimensions
    pub fn empty(header: Header, width: u32, height: u32) -> Self {
        Self {
            header,
            height,
            width,
            fields: Vec::new(),
            is_bigendian: false,
            point_step: 0,
            row_step: 0,
            data: Bytes::new(),
            is_dense: false,
        }
    }
}

/// Camera extrinsics (translation in metres, rotation in radians)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrinsicsMessage {
    pub header: Header,
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub rot_x: f64,
    pub rot_y: f64,
    pub rot_z: f64,
}

impl ExtrinsicsMessage {
    /// All-zero extrinsics
    pub fn zeroed(header: Header) -> Self {
        Self {
            header,
            tx: 0.0,
            ty: 0.0,
            tz: 0.0,
            rot_x: 0.0,
            rot_y: 0.0,
            rot_z: 0.0,
        }
    }
}

/// Any record the sink can publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputMessage {
    Image(ImageMessage),
    CompressedImage(CompressedImageMessage),
    PointCloud(PointCloudMessage),
    Extrinsics(ExtrinsicsMessage),
}

impl OutputMessage {
    /// Header of the wrapped record
    pub fn header(&self) -> &Header {
        match self {
            OutputMessage::Image(m) => &m.header,
            OutputMessage::CompressedImage(m) => &m.header,
            OutputMessage::PointCloud(m) => &m.header,
            OutputMessage::Extrinsics(m) => &m.header,
        }
    }

    /// Payload size in bytes
    pub fn payload_len(&self) -> usize {
        match self {
            OutputMessage::Image(m) => m.data.len(),
            OutputMessage::CompressedImage(m) => m.data.len(),
            OutputMessage::PointCloud(m) => m.data.len(),
            OutputMessage::Extrinsics(_) => 0,
        }
    }
}

impl From<ImageMessage> for OutputMessage {
    fn from(value: ImageMessage) -> Self {
        OutputMessage::Image(value)
    }
}

impl From<CompressedImageMessage> for OutputMessage {
    fn from(value: CompressedImageMessage) -> Self {
        OutputMessage::CompressedImage(value)
    }
}

impl From<PointCloudMessage> for OutputMessage {
    fn from(value: PointCloudMessage) -> Self {
        OutputMessage::PointCloud(value)
    }
}

impl From<ExtrinsicsMessage> for OutputMessage {
    fn from(value: ExtrinsicsMessage) -> Self {
        OutputMessage::Extrinsics(value)
    }
}
