//! Reader side of the solver's shared memory telemetry region.
//!
//! The solver publishes a fixed-layout region (see [`layout`]); this crate
//! locates it through a platform backend, reads worker records out of it and
//! drives the single-slot command mailbox.

pub mod backend;
mod bridge;
pub mod clock;
pub mod command;
mod error;
pub mod layout;
mod region;

pub use backend::{Backend, BackendKind};
pub use bridge::{Bridge, LiveSnapshot, Snapshot, decode_workers};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{
    Command, CommandKind, CommandTiming, TEMPERATURE_PARAM, send_command, send_command_sync,
};
pub use error::{BridgeError, Result};
pub use layout::{ControlCommand, MonitorHeader, WorkerStatus};
pub use region::{MemoryRegion, Region};

/// Region name the solver publishes under.
pub const DEFAULT_REGION_NAME: &str = "SAMonitor4D";
