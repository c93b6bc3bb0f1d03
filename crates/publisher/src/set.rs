//! Sink construction from configuration

use std::sync::Arc;

use contracts::{OutputSink, SinkConfig, SinkType};
use tracing::{info, instrument};

use crate::fanout::FanoutSink;
use crate::handle::QueuedSink;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{LogSink, MemorySink};

/// Name of the sink added when none is configured
pub const DEFAULT_SINK_NAME: &str = "log";

/// Queue capacity of the default sink
const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Every configured sink, each behind its own queue
pub struct SinkSet {
    fanout: Arc<FanoutSink>,
    queued: Vec<Arc<QueuedSink>>,
    memory: Vec<Arc<MemorySink>>,
}

impl SinkSet {
    /// Single entry point for the acquisition loop
    pub fn output(&self) -> Arc<dyn OutputSink> {
        self.fanout.clone()
    }

    /// In-memory sink by name
    pub fn memory(&self, name: &str) -> Option<Arc<MemorySink>> {
        self.memory.iter().find(|m| m.name() == name).cloned()
    }

    /// Per-sink metrics snapshot
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.queued
            .iter()
            .map(|q| (q.name().to_string(), q.metrics().snapshot()))
            .collect()
    }

    /// Drain and stop every sink worker
    pub async fn shutdown(&self) {
        for queued in &self.queued {
            queued.shutdown().await;
        }
    }
}

/// Build sinks from configuration
///
/// An empty list yields a single log sink. Must be called from within a
/// Tokio runtime.
#[instrument(name = "publisher_create_sinks", skip(configs), fields(sink_count = configs.len()))]
pub fn create_sinks(configs: &[SinkConfig]) -> SinkSet {
    let defaulted;
    let configs = if configs.is_empty() {
        defaulted = [SinkConfig {
            name: DEFAULT_SINK_NAME.to_string(),
            sink_type: SinkType::Log,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }];
        info!("no sinks configured, using a log sink");
        &defaulted[..]
    } else {
        configs
    };

    let mut queued = Vec::with_capacity(configs.len());
    let mut memory = Vec::new();

    for config in configs {
        let sink: Arc<dyn OutputSink> = match config.sink_type {
            SinkType::Log => Arc::new(LogSink::new(&config.name)),
            SinkType::Memory => {
                let sink = Arc::new(MemorySink::new(&config.name));
                memory.push(Arc::clone(&sink));
                sink
            }
        };
        info!(sink = %config.name, sink_type = ?config.sink_type, "sink created");
        queued.push(Arc::new(QueuedSink::spawn(sink, config.queue_capacity)));
    }

    let outputs = queued
        .iter()
        .map(|q| Arc::clone(q) as Arc<dyn OutputSink>)
        .collect();

    SinkSet {
        fanout: Arc::new(FanoutSink::new("fanout", outputs)),
        queued,
        memory,
    }
}
