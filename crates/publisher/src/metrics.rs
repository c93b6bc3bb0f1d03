//! Per-sink delivery counters

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Delivery counters of one queued sink, shared between the acquisition
/// thread (enqueue side) and the sink worker (drain side).
#[derive(Debug, Default)]
pub struct SinkMetrics {
    published: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    /// Deepest backlog seen at enqueue time
    peak_depth: AtomicUsize,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record accepted onto the queue with `depth` records now waiting
    pub fn record_enqueued(&self, depth: usize) {
        self.peak_depth.fetch_max(depth, Ordering::Relaxed);
    }

    /// Record rejected because the queue was full
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Outcome of handing one record to the wrapped sink
    pub fn record_delivery(&self, ok: bool) {
        let counter = if ok { &self.published } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published: self.published(),
            failed: self.failed(),
            dropped: self.dropped(),
            peak_depth: self.peak_depth(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`] for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub published: u64,
    pub failed: u64,
    pub dropped: u64,
    pub peak_depth: usize,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} published, {} failed, {} dropped, peak backlog {}",
            self.published, self.failed, self.dropped, self.peak_depth
        )
    }
}
