//! Fixed-backoff retry with cooperative shutdown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which sleeps observe shutdown
const SLEEP_SLICE: Duration = Duration::from_millis(20);

/// Cloneable stop flag polled by the acquisition thread
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep up to `duration`; returns `false` if shutdown was requested
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_triggered() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// Call `attempt` until it succeeds, sleeping `backoff` between attempts
///
/// No attempt limit. Returns `false` only when shutdown is requested.
pub fn retry_until(
    backoff: Duration,
    shutdown: &ShutdownSignal,
    mut attempt: impl FnMut() -> bool,
) -> bool {
    loop {
        if shutdown.is_triggered() {
            return false;
        }
        if attempt() {
            return true;
        }
        if !shutdown.sleep(backoff) {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_until_success() {
        let shutdown = ShutdownSignal::new();
        let mut calls = 0;
        let ok = retry_until(Duration::from_millis(1), &shutdown, || {
            calls += 1;
            calls == 3
        });
        assert!(ok);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_stops_on_shutdown() {
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();
        let mut calls = 0;
        let ok = retry_until(Duration::from_millis(1), &shutdown, || {
            calls += 1;
            if calls == 2 {
                trigger.trigger();
            }
            false
        });
        assert!(!ok);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_no_attempt_after_shutdown() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        assert!(!retry_until(Duration::ZERO, &shutdown, || panic!("must not run")));
    }

    #[test]
    fn test_sleep_interrupted() {
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            trigger.trigger();
        });

        let started = Instant::now();
        assert!(!shutdown.sleep(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }
}
