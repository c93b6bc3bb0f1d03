//! Streaming publish order and extrinsics

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{
    Channel, ExtrinsicsMessage, FrameIds, Header, OutputMessage, OutputSink, RawImage, SchemaMask,
    Topic,
};
use conversion::{to_compressed_image, to_image, to_point_cloud};
use tracing::{debug, info, warn};

use crate::frame_set::FrameSet;
use crate::stats::AcquisitionStats;

/// Container format of the RGB stream
const RGB_FORMAT: &str = "jpeg";

/// Build extrinsics from `[tx, ty, tz, rot_x, rot_y, rot_z]`
///
/// A short vector yields an all-zero record.
pub fn extrinsics_message(values: &[f32], header: Header) -> ExtrinsicsMessage {
    match values {
        [tx, ty, tz, rot_x, rot_y, rot_z, ..] => ExtrinsicsMessage {
            header,
            tx: f64::from(*tx),
            ty: f64::from(*ty),
            tz: f64::from(*tz),
            rot_x: f64::from(*rot_x),
            rot_y: f64::from(*rot_y),
            rot_z: f64::from(*rot_z),
        },
        _ => {
            warn!(len = values.len(), "out-of-range error fetching extrinsics");
            ExtrinsicsMessage::zeroed(header)
        }
    }
}

/// Converts frames and hands them to the output sink
pub struct Publisher {
    sink: Arc<dyn OutputSink>,
    ids: FrameIds,
    stats: Arc<AcquisitionStats>,
}

impl Publisher {
    pub fn new(sink: Arc<dyn OutputSink>, ids: FrameIds, stats: Arc<AcquisitionStats>) -> Self {
        Self { sink, ids, stats }
    }

    /// Publish the unit-vector image on its latched topic
    pub fn unit_vectors(&self, image: &RawImage, stamp: DateTime<Utc>) {
        let header = Header::new(&self.ids.optical_link, stamp);
        let message = to_image(image, &header);
        info!(
            pixels = u64::from(message.width) * u64::from(message.height),
            "unit vector image size"
        );
        self.emit(Topic::UnitVectors, message.into());
    }

    /// Publish one streaming cycle
    ///
    /// Order: confidence, gated channels, RGB when present, extrinsics.
    pub fn streaming(&self, frames: &FrameSet, mask: SchemaMask, stamp: DateTime<Utc>) {
        let head = Header::new(&self.ids.link, stamp);
        let optical = Header::new(&self.ids.optical_link, stamp);

        self.emit(Topic::Confidence, to_image(&frames.confidence, &optical).into());

        for channel in Channel::PUBLISH_ORDER {
            if !mask.contains(channel) {
                continue;
            }
            let source = frames.channel(channel);
            let message: OutputMessage = match channel {
                Channel::Cartesian => to_point_cloud(source, &head).into(),
                _ => to_image(source, &optical).into(),
            };
            self.emit(Topic::for_channel(channel), message);
        }

        if frames.rgb.pixel_count() > 0 {
            self.emit(
                Topic::RgbImage,
                to_compressed_image(&frames.rgb, &optical, RGB_FORMAT).into(),
            );
        }

        self.emit(
            Topic::Extrinsics,
            extrinsics_message(&frames.extrinsics, optical).into(),
        );
    }

    fn emit(&self, topic: Topic, message: OutputMessage) {
        let payload_bytes = message.payload_len();
        match self.sink.publish(topic, message) {
            Ok(()) => {
                self.stats.record_published(topic, payload_bytes);
                debug!(topic = %topic, bytes = payload_bytes, "published");
            }
            Err(e) => {
                self.stats.record_publish_failure();
                warn!(topic = %topic, error = %e, "publish failed");
            }
        }
    }
}
