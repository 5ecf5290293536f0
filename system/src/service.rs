use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{Result, SystemError};

/// What the node's run loop should do with this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceAction {
    Restart,
    Stop,
}

/// Sending half of the service action channel, handed to whoever may ask
/// this process to restart or stop.
#[derive(Debug, Clone)]
pub struct ServiceControl {
    sender: mpsc::UnboundedSender<ServiceAction>,
}

impl ServiceControl {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServiceAction>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn request(&self, action: ServiceAction) -> Result<()> {
        tracing::info!("Service action requested: {:?}", action);
        self.sender.send(action).map_err(|_| SystemError::ControlClosed)
    }
}

/// Replaces the current process with a fresh copy of itself, same
/// arguments. Only returns on failure.
#[cfg(unix)]
pub fn restart_process() -> SystemError {
    use std::os::unix::process::CommandExt;

    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => return e.into(),
    };
    tracing::info!("Restarting {:?}", exe);
    std::process::Command::new(exe)
        .args(std::env::args_os().skip(1))
        .exec()
        .into()
}

#[cfg(not(unix))]
pub fn restart_process() -> SystemError {
    SystemError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "in-place restart is only supported on unix",
    ))
}
