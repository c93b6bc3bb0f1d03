//! Run summary printed on shutdown.

use std::time::Duration;

use driver::AcquisitionSnapshot;
use publisher::MetricsSnapshot;

/// Outcome of a bridge run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Wall time from start to shutdown
    pub duration: Duration,

    /// Acquisition counters at shutdown
    pub acquisition: AcquisitionSnapshot,

    /// Per-sink queue metrics
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl RunReport {
    /// Frames per second over the whole run
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.acquisition.frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Records dropped by full sink queues
    pub fn sink_drops(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.dropped).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        print!("{}", self.acquisition);
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("FPS: {:.2}", self.fps());

        if !self.sinks.is_empty() {
            println!("\n=== Sinks ===");
            for (name, metrics) in &self.sinks {
                println!("  {}: {}", name, metrics);
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver::AcquisitionStats;

    #[test]
    fn test_rates() {
        let report = RunReport {
            duration: Duration::ZERO,
            acquisition: AcquisitionStats::new().snapshot(),
            sinks: vec![
                (
                    "log".to_string(),
                    MetricsSnapshot {
                        dropped: 2,
                        ..Default::default()
                    },
                ),
                (
                    "mem".to_string(),
                    MetricsSnapshot {
                        dropped: 3,
                        ..Default::default()
                    },
                ),
            ],
        };
        assert_eq!(report.fps(), 0.0);
        assert_eq!(report.sink_drops(), 5);
    }
}
