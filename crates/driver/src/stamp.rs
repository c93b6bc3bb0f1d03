//! Capture timestamp reconciliation

use chrono::{DateTime, Utc};
use tracing::info;

/// Where a header stamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampSource {
    Device,
    /// Device clock too far from local time
    Local,
}

/// Prefers device capture time, falls back to local time on clock mismatch
#[derive(Debug)]
pub struct StampReconciler {
    threshold_secs: f64,
    notified: bool,
}

impl StampReconciler {
    pub fn new(frame_latency_thresh: f64) -> Self {
        Self {
            threshold_secs: frame_latency_thresh,
            notified: false,
        }
    }

    /// Stamp to put in the headers of one frame
    pub fn reconcile(
        &mut self,
        device: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> (DateTime<Utc>, StampSource) {
        let skew = (now - device).abs();
        let skew_secs = skew.num_milliseconds() as f64 / 1000.0;
        if skew_secs <= self.threshold_secs {
            return (device, StampSource::Device);
        }

        if !self.notified {
            self.notified = true;
            info!(
                skew_secs,
                threshold_secs = self.threshold_secs,
                "camera's time and client's time are not synced, using local time"
            );
        }
        (now, StampSource::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_device_time_preferred() {
        let mut reconciler = StampReconciler::new(60.0);
        let now = Utc::now();
        let device = now - TimeDelta::milliseconds(30);
        assert_eq!(reconciler.reconcile(device, now), (device, StampSource::Device));
    }

    #[test]
    fn test_local_time_on_skew() {
        let mut reconciler = StampReconciler::new(60.0);
        let now = Utc::now();

        let behind = now - TimeDelta::seconds(3600);
        assert_eq!(reconciler.reconcile(behind, now), (now, StampSource::Local));

        // device clock ahead counts as well
        let ahead = now + TimeDelta::seconds(61);
        assert_eq!(reconciler.reconcile(ahead, now), (now, StampSource::Local));
        assert!(reconciler.notified);
    }

    #[test]
    fn test_boundary_is_accepted() {
        let mut reconciler = StampReconciler::new(1.0);
        let now = Utc::now();
        let device = now - TimeDelta::seconds(1);
        assert_eq!(reconciler.reconcile(device, now).1, StampSource::Device);
    }
}
