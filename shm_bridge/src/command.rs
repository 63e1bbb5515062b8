//! Request/acknowledge protocol over the single-slot mailbox.
//!
//! Only one command can be outstanding. A new write replaces whatever is in
//! the mailbox, acknowledged or not (last write wins), and the writer flips
//! `processed` from 0 to 1 once per command it consumes.

use std::{fmt, time::Duration};

use log::{debug, warn};

use crate::{
    bridge::Bridge,
    clock::Clock,
    layout::{ControlCommand, PENDING},
};

/// Parameter index sent with [`CommandKind::SetTemperature`].
///
/// The writer only reads `param_value` for that command; the index names the
/// slot for readers of the mailbox.
pub const TEMPERATURE_PARAM: i32 = 16;

/// Command types understood by the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    /// Forces the worker past its stagnation threshold so it reseeds.
    SoftReseed,
    /// Ends the worker's current cycle and reseeds.
    KillCycleAndReseed,
    /// Replaces the worker's temperature with the command's value.
    SetTemperature,
    Other(i32),
}

impl CommandKind {
    pub fn code(self) -> i32 {
        match self {
            Self::SoftReseed => 1,
            Self::KillCycleAndReseed => 2,
            Self::SetTemperature => 3,
            Self::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::SoftReseed,
            2 => Self::KillCycleAndReseed,
            3 => Self::SetTemperature,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoftReseed => write!(f, "soft reseed"),
            Self::KillCycleAndReseed => write!(f, "kill cycle & reseed"),
            Self::SetTemperature => write!(f, "set temperature"),
            Self::Other(code) => write!(f, "command {code}"),
        }
    }
}

/// A command addressed to one worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub target: i32,
    pub kind: CommandKind,
    pub param_index: i32,
    pub param_value: f64,
}

impl Command {
    /// A command without parameters.
    pub fn new(target: i32, kind: CommandKind) -> Self {
        Self {
            target,
            kind,
            param_index: 0,
            param_value: 0.0,
        }
    }

    /// Sets the temperature of worker `target` to `value`.
    pub fn set_temperature(target: i32, value: f64) -> Self {
        Self::new(target, CommandKind::SetTemperature).with_param(TEMPERATURE_PARAM, value)
    }

    pub fn with_param(mut self, index: i32, value: f64) -> Self {
        self.param_index = index;
        self.param_value = value;
        self
    }

    /// The mailbox record for this command, marked pending.
    pub fn to_record(&self) -> ControlCommand {
        ControlCommand {
            target_worker: self.target,
            command_type: self.kind.code(),
            processed: PENDING,
            param_index: self.param_index,
            param_value: self.param_value,
        }
    }
}

/// Bounds of the acknowledgement wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTiming {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for CommandTiming {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(5),
        }
    }
}

/// Writes `cmd` into the mailbox with `processed = 0`.
///
/// # Returns
/// `false` if no region is attached or the write fails.
pub fn send_command(bridge: &mut Bridge, cmd: &Command) -> bool {
    match bridge.write_command(&cmd.to_record()) {
        Ok(()) => {
            debug!("worker {}: {} written", cmd.target, cmd.kind);
            true
        }
        Err(e) => {
            warn!("worker {}: writing {} failed: {e}", cmd.target, cmd.kind);
            false
        }
    }
}

/// Writes `cmd` and polls the mailbox until the writer acknowledges it.
///
/// Never retries: on timeout the command may still be consumed later, and
/// the caller decides whether to send again.
///
/// # Returns
/// `true` only if `processed == 1` was observed within `timing.timeout`.
pub fn send_command_sync<C: Clock + ?Sized>(
    bridge: &mut Bridge,
    cmd: &Command,
    timing: &CommandTiming,
    clock: &C,
) -> bool {
    if !send_command(bridge, cmd) {
        return false;
    }

    let start = clock.now();
    while clock.now().duration_since(start) < timing.timeout {
        match bridge.read_command() {
            Ok(record) if record.is_acknowledged() => {
                debug!(
                    "worker {}: {} acknowledged after {:?}",
                    cmd.target,
                    cmd.kind,
                    clock.now().duration_since(start)
                );
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("worker {}: mailbox unreadable while waiting: {e}", cmd.target);
                return false;
            }
        }
        clock.sleep(timing.poll_interval);
    }

    warn!(
        "worker {}: {} not acknowledged within {:?}",
        cmd.target, cmd.kind, timing.timeout
    );
    false
}
