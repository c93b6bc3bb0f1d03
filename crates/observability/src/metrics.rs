//! Acquisition metrics
//!
//! Thin wrappers over the `metrics` facade so every crate records the same
//! metric names and labels. A Prometheus recorder is installed by
//! [`crate::init_with_config`]; without one these calls are no-ops.

use metrics::{counter, gauge, histogram};

/// A frame arrived from the grabber
pub fn record_frame_received() {
    counter!("tofcam_frames_total").increment(1);
}

/// Gap between two consecutive frames
pub fn record_frame_interval_ms(interval_ms: f64) {
    histogram!("tofcam_frame_interval_ms").record(interval_ms);
}

/// `wait_for_frame` timed out
pub fn record_wait_timeout() {
    counter!("tofcam_wait_timeouts_total").increment(1);
}

/// Session initialisation attempt and its outcome
pub fn record_session_initialized(phase: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "failed" };
    counter!(
        "tofcam_session_initializations_total",
        "phase" => phase,
        "outcome" => outcome
    )
    .increment(1);
    gauge!("tofcam_session_ready").set(if success { 1.0 } else { 0.0 });
}

/// Staleness forced a session restart
pub fn record_session_restart(phase: &'static str) {
    counter!("tofcam_session_restarts_total", "phase" => phase).increment(1);
}

/// Record handed to the output sink
pub fn record_published(topic: &'static str, payload_bytes: usize) {
    counter!("tofcam_published_total", "topic" => topic).increment(1);
    counter!("tofcam_published_bytes_total", "topic" => topic).increment(payload_bytes as u64);
}

/// Conversion refused its source
pub fn record_conversion_rejected(kind: &'static str) {
    counter!("tofcam_conversion_rejected_total", "kind" => kind).increment(1);
}

/// Device timestamp replaced by local time
pub fn record_time_sync_fallback() {
    counter!("tofcam_time_sync_fallback_total").increment(1);
}

/// Sink queue full, record dropped
pub fn record_sink_dropped(sink_name: &str) {
    counter!("tofcam_sink_dropped_total", "sink" => sink_name.to_string()).increment(1);
}

/// Command handled, labelled by response status
pub fn record_command(command: &'static str, status: i32) {
    counter!(
        "tofcam_commands_total",
        "command" => command,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Summary of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Summary snapshot
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
