//! Timeout regimes

use std::time::Duration;

use contracts::AcquisitionConfig;

/// Per-wait timeout plus staleness tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Bound on a single `wait_for_frame`
    pub timeout: Duration,
    /// Max gap since the last frame before the session is rebuilt
    pub tolerance: Duration,
}

impl TimeoutPolicy {
    fn new(timeout_millis: u64, tolerance_secs: f64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_millis),
            // rejected by validation; zero forces a restart on every timeout
            tolerance: Duration::try_from_secs_f64(tolerance_secs).unwrap_or(Duration::ZERO),
        }
    }
}

/// The three configured regimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingRegimes {
    pub streaming: TimeoutPolicy,
    pub soft_on: TimeoutPolicy,
    pub soft_off: TimeoutPolicy,
}

impl TimingRegimes {
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self {
            streaming: TimeoutPolicy::new(config.timeout_millis, config.timeout_tolerance_secs),
            soft_on: TimeoutPolicy::new(
                config.soft_on_timeout_millis,
                config.soft_on_timeout_tolerance_secs,
            ),
            soft_off: TimeoutPolicy::new(
                config.soft_off_timeout_millis,
                config.soft_off_timeout_tolerance_secs,
            ),
        }
    }
}

/// Timing currently applied by the acquisition loop
///
/// Lives under the device state lock so commands can switch regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTiming {
    pub policy: TimeoutPolicy,
    /// Wait timeouts are expected (software-triggered device)
    pub assume_sw_triggered: bool,
}

impl ActiveTiming {
    /// Streaming regime with the configured trigger assumption
    pub fn initial(regimes: &TimingRegimes, config: &AcquisitionConfig) -> Self {
        Self {
            policy: regimes.streaming,
            assume_sw_triggered: config.assume_sw_triggered,
        }
    }
}
