//! Device state guarded by the single driver lock

use std::sync::{Arc, Mutex, MutexGuard};

use device_session::{DeviceClient, SessionManager};
use tracing::warn;

use crate::timing::ActiveTiming;

/// Everything the acquisition loop and the command handlers share
pub struct DeviceState<C: DeviceClient> {
    pub session: SessionManager<C>,
    pub timing: ActiveTiming,
}

impl<C: DeviceClient> DeviceState<C> {
    pub fn new(session: SessionManager<C>, timing: ActiveTiming) -> Self {
        Self { session, timing }
    }
}

/// The driver lock
pub type SharedState<C> = Arc<Mutex<DeviceState<C>>>;

/// Take the driver lock, recovering it if a holder panicked
pub fn lock_state<C: DeviceClient>(state: &Mutex<DeviceState<C>>) -> MutexGuard<'_, DeviceState<C>> {
    state.lock().unwrap_or_else(|poisoned| {
        warn!("device state lock poisoned, recovering");
        poisoned.into_inner()
    })
}
