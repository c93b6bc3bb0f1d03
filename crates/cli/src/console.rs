//! Interactive command console
//!
//! Reads one command per stdin line and prints the JSON response. Commands
//! run on the blocking pool since they contend for the device lock.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use contracts::{CommandRequest, CommandService};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{CliError, Result};

/// Parse one console line; `None` for blank lines
pub fn parse_command(line: &str) -> Result<Option<CommandRequest>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, argument) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let request = match name.to_ascii_lowercase().as_str() {
        "dump" => CommandRequest::Dump,
        "trigger" => CommandRequest::Trigger,
        "soft-on" | "softon" => CommandRequest::SoftOn,
        "soft-off" | "softoff" => CommandRequest::SoftOff,
        "config" if argument.is_empty() => return Err(CliError::missing_argument(name)),
        "config" => CommandRequest::Config {
            json: argument.to_string(),
        },
        _ => return Err(CliError::unknown_command(name)),
    };
    Ok(Some(request))
}

/// Forward stdin lines from a detached reader thread
///
/// A blocked stdin read must not hold up runtime shutdown.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    let spawned = thread::Builder::new()
        .name("tofcam-console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start console reader");
    }
    rx
}

/// Serve stdin commands until EOF
pub async fn serve(commands: Arc<dyn CommandService>) {
    info!("interactive console ready");
    let mut lines = stdin_lines();

    while let Some(line) = lines.recv().await {
        let request = match parse_command(&line) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        debug!(command = request.service_name(), "console command");
        let service = commands.clone();
        match tokio::task::spawn_blocking(move || service.call(request)).await {
            Ok(response) => match serde_json::to_string(&response) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!(error = %e, "failed to serialize response"),
            },
            Err(e) => warn!(error = %e, "command task failed"),
        }
    }
    info!("interactive console closed");
}
