//! Command handlers
//!
//! Every handler takes the device state lock, so a command never interleaves
//! with a frame wait or a session rebuild.

use std::panic::{self, AssertUnwindSafe};

use contracts::{
    CommandRequest, CommandResponse, CommandService, DumpResponse, StatusResponse,
};
use device_session::{DeviceClient, DeviceSession};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::error::CommandError;
use crate::state::{lock_state, SharedState};
use crate::timing::{TimeoutPolicy, TimingRegimes};

/// Fixed reply of the trigger command
const TRIGGER_MESSAGE: &str = "Software trigger is currently not implemented";

/// Base of the data port numbering
const PCIC_BASE_PORT: u16 = 50010;

/// Data port operating state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortState {
    Idle,
    Run,
}

impl PortState {
    fn as_str(self) -> &'static str {
        match self {
            PortState::Idle => "IDLE",
            PortState::Run => "RUN",
        }
    }
}

/// Command surface of one camera
pub struct CommandHandlers<C: DeviceClient> {
    state: SharedState<C>,
    regimes: TimingRegimes,
    pcic_port: u16,
}

impl<C: DeviceClient> CommandHandlers<C> {
    pub fn new(state: SharedState<C>, regimes: TimingRegimes, pcic_port: u16) -> Self {
        Self {
            state,
            regimes,
            pcic_port,
        }
    }

    /// Key of the data port in the device configuration document
    fn port_key(&self) -> String {
        format!("port{}", self.pcic_port % PCIC_BASE_PORT)
    }

    fn dispatch(&self, request: &CommandRequest) -> CommandResponse {
        match request {
            CommandRequest::Dump => CommandResponse::Dump(self.dump()),
            CommandRequest::Config { json } => CommandResponse::Status(self.config(json)),
            CommandRequest::Trigger => CommandResponse::Status(self.trigger()),
            CommandRequest::SoftOff => {
                CommandResponse::Status(self.set_port_state(PortState::Idle))
            }
            CommandRequest::SoftOn => CommandResponse::Status(self.set_port_state(PortState::Run)),
        }
    }

    /// Serialize the full device configuration
    #[instrument(name = "command_dump", skip(self))]
    pub fn dump(&self) -> DumpResponse {
        let result = (|| -> Result<String, CommandError> {
            let state = lock_state(&self.state);
            let document = state.session.session()?.to_json()?;
            Ok(serde_json::to_string(&document)?)
        })();

        match result {
            Ok(config) => DumpResponse { status: 0, config },
            Err(e) => {
                error!(error = %e, "dump failed");
                DumpResponse {
                    status: e.status(),
                    config: String::new(),
                }
            }
        }
    }

    /// Apply a serialized configuration document
    #[instrument(name = "command_config", skip(self, json), fields(bytes = json.len()))]
    pub fn config(&self, json: &str) -> StatusResponse {
        let result = (|| -> Result<(), CommandError> {
            let state = lock_state(&self.state);
            let document: Value = serde_json::from_str(json)?;
            state.session.session()?.from_json(&document)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                info!("configuration applied");
                StatusResponse::new(0, "OK")
            }
            Err(e) => {
                error!(error = %e, "config failed");
                StatusResponse::new(e.status(), e.message())
            }
        }
    }

    /// Software trigger
    #[instrument(name = "command_trigger", skip(self))]
    pub fn trigger(&self) -> StatusResponse {
        let mut state = lock_state(&self.state);
        let status = match state.session.software_trigger() {
            Ok(()) => 0,
            Err(e) => {
                warn!(error = %e, "software trigger failed");
                e.code
            }
        };
        drop(state);

        warn!("{}", TRIGGER_MESSAGE);
        StatusResponse::new(status, TRIGGER_MESSAGE)
    }

    /// Put the data port into IDLE or RUN and switch the timing regime
    ///
    /// Replies with the applied fragment. On failure the regime is untouched.
    #[instrument(name = "command_port_state", skip(self), fields(port = self.pcic_port))]
    fn set_port_state(&self, target: PortState) -> StatusResponse {
        let port = self.port_key();
        let fragment = json!({ "ports": { port: { "state": target.as_str() } } });
        let msg = fragment.to_string();

        let mut state = lock_state(&self.state);
        let applied = state
            .session
            .session()
            .and_then(|session| session.from_json(&fragment));

        match applied {
            Ok(()) => {
                let policy: TimeoutPolicy = match target {
                    PortState::Idle => self.regimes.soft_off,
                    PortState::Run => self.regimes.soft_on,
                };
                state.timing.policy = policy;
                state.timing.assume_sw_triggered = false;
                warn!(
                    state = target.as_str(),
                    "applications are not available, switching the port state instead"
                );
                info!(
                    timeout_ms = policy.timeout.as_millis() as u64,
                    tolerance_secs = policy.tolerance.as_secs_f64(),
                    "timing regime switched"
                );
                StatusResponse::new(0, msg)
            }
            Err(e) => {
                error!(error = %e, state = target.as_str(), "port state change failed");
                StatusResponse::new(e.code, e.message)
            }
        }
    }
}

impl<C: DeviceClient> CommandService for CommandHandlers<C> {
    fn call(&self, request: CommandRequest) -> CommandResponse {
        let name = request.service_name();
        let response = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&request)))
            .unwrap_or_else(|_| {
                error!(command = name, "command handler panicked");
                let err = CommandError::Unknown(format!("Unknown error in `{}'", name));
                failure_response(&request, &err)
            });

        observability::record_command(name, response.status());
        response
    }
}

/// Response shape for a failed request; `Dump` carries an empty config
fn failure_response(request: &CommandRequest, err: &CommandError) -> CommandResponse {
    match request {
        CommandRequest::Dump => CommandResponse::Dump(DumpResponse {
            status: err.status(),
            config: String::new(),
        }),
        _ => CommandResponse::Status(StatusResponse::new(err.status(), err.message())),
    }
}
