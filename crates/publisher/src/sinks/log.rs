//! LogSink - logs a summary line per published record

use contracts::{ContractError, OutputMessage, OutputSink, Topic};
use tracing::info;

/// Sink that logs record summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn describe(message: &OutputMessage) -> String {
    match message {
        OutputMessage::Image(m) => format!("{}x{} {} step={}", m.width, m.height, m.encoding, m.step),
        OutputMessage::CompressedImage(m) => format!("{} compressed", m.format),
        OutputMessage::PointCloud(m) => format!("{}x{} points dense={}", m.width, m.height, m.is_dense),
        OutputMessage::Extrinsics(m) => format!(
            "t=({:.3}, {:.3}, {:.3}) r=({:.3}, {:.3}, {:.3})",
            m.tx, m.ty, m.tz, m.rot_x, m.rot_y, m.rot_z
        ),
    }
}

impl OutputSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, topic: Topic, message: OutputMessage) -> Result<(), ContractError> {
        let header = message.header();
        info!(
            sink = %self.name,
            topic = %topic,
            frame_id = %header.frame_id,
            stamp = %header.stamp,
            bytes = message.payload_len(),
            latched = topic.is_latched(),
            "{}",
            describe(&message)
        );
        Ok(())
    }
}
