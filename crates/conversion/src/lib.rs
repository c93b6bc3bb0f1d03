//! # Conversion
//!
//! Turns decoded sub-images into typed output records.
//!
//! Every conversion is total: a source that cannot be interpreted yields a
//! record with header and dimensions only, plus an error log. A source with
//! no bytes is the "nothing this cycle" record and is never an error.

mod cloud;
mod format;
mod image;

pub use cloud::{to_point_cloud, POINT_STEP};
pub use format::{descriptor, FormatDescriptor, FALLBACK_ENCODING};
pub use image::{to_compressed_image, to_image};

/// Conversion kinds, used as metric labels
pub(crate) mod kind {
    pub const IMAGE: &str = "image";
    pub const COMPRESSED: &str = "compressed_image";
    pub const CLOUD: &str = "point_cloud";
}
