//! Acquisition statistics
//!
//! In-process counters mirroring the exported metrics, readable from any
//! thread while the loop runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use contracts::Topic;
use observability::{RunningStats, StatsSummary};

use crate::phase::Phase;

/// Shared acquisition counters
#[derive(Debug, Default)]
pub struct AcquisitionStats {
    frames: AtomicU64,
    wait_timeouts: AtomicU64,
    restarts: AtomicU64,
    initializations: AtomicU64,
    init_failures: AtomicU64,
    time_sync_fallbacks: AtomicU64,
    publish_failures: AtomicU64,
    published: [AtomicU64; Topic::ALL.len()],
    streaming: AtomicBool,
    frame_interval_ms: Mutex<RunningStats>,
}

impl AcquisitionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_frame(&self, interval: Option<Duration>) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        observability::record_frame_received();
        if let Some(interval) = interval {
            let ms = interval.as_secs_f64() * 1000.0;
            observability::record_frame_interval_ms(ms);
            self.frame_interval_ms
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(ms);
        }
    }

    pub(crate) fn record_timeout(&self) {
        self.wait_timeouts.fetch_add(1, Ordering::Relaxed);
        observability::record_wait_timeout();
    }

    pub(crate) fn record_restart(&self, phase: Phase) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
        observability::record_session_restart(phase.as_str());
    }

    pub(crate) fn record_initialization(&self, phase: Phase, success: bool) {
        if success {
            self.initializations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.init_failures.fetch_add(1, Ordering::Relaxed);
        }
        observability::record_session_initialized(phase.as_str(), success);
    }

    pub(crate) fn record_time_sync_fallback(&self) {
        self.time_sync_fallbacks.fetch_add(1, Ordering::Relaxed);
        observability::record_time_sync_fallback();
    }

    pub(crate) fn record_published(&self, topic: Topic, payload_bytes: usize) {
        self.published[topic as usize].fetch_add(1, Ordering::Relaxed);
        observability::record_published(topic.as_str(), payload_bytes);
    }

    pub(crate) fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::Relaxed);
    }

    /// Frames received so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Records published on one topic
    pub fn published(&self, topic: Topic) -> u64 {
        self.published[topic as usize].load(Ordering::Relaxed)
    }

    /// True once the unit vectors were fetched
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Relaxed)
    }

    /// Snapshot of all counters
    pub fn snapshot(&self) -> AcquisitionSnapshot {
        AcquisitionSnapshot {
            phase: if self.is_streaming() {
                Phase::Streaming
            } else {
                Phase::Bootstrapping
            },
            frames: self.frames(),
            wait_timeouts: self.wait_timeouts.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            initializations: self.initializations.load(Ordering::Relaxed),
            init_failures: self.init_failures.load(Ordering::Relaxed),
            time_sync_fallbacks: self.time_sync_fallbacks.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            published: Topic::ALL
                .into_iter()
                .map(|topic| (topic, self.published(topic)))
                .filter(|(_, count)| *count > 0)
                .collect(),
            frame_interval_ms: self
                .frame_interval_ms
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .summary(),
        }
    }
}

/// Point-in-time copy of `AcquisitionStats`
#[derive(Debug, Clone)]
pub struct AcquisitionSnapshot {
    pub phase: Phase,
    pub frames: u64,
    pub wait_timeouts: u64,
    pub restarts: u64,
    pub initializations: u64,
    pub init_failures: u64,
    pub time_sync_fallbacks: u64,
    pub publish_failures: u64,
    /// Records per topic, topics never published omitted
    pub published: BTreeMap<Topic, u64>,
    pub frame_interval_ms: StatsSummary,
}

impl fmt::Display for AcquisitionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Acquisition Summary ===")?;
        writeln!(f, "Phase: {}", self.phase)?;
        writeln!(f, "Frames received: {}", self.frames)?;
        writeln!(f, "Frame interval (ms): {}", self.frame_interval_ms)?;
        writeln!(f, "Wait timeouts: {}", self.wait_timeouts)?;
        writeln!(
            f,
            "Session initializations: {} ok, {} failed",
            self.initializations, self.init_failures
        )?;
        writeln!(f, "Session restarts: {}", self.restarts)?;
        writeln!(f, "Time sync fallbacks: {}", self.time_sync_fallbacks)?;
        writeln!(f, "Publish failures: {}", self.publish_failures)?;

        if !self.published.is_empty() {
            writeln!(f, "Published:")?;
            for (topic, count) in &self.published {
                writeln!(f, "  {}: {}", topic, count)?;
            }
        }
        Ok(())
    }
}
