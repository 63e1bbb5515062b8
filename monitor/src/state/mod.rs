pub mod model;
mod monitor;
pub mod scoring;
pub mod throughput;

pub use monitor::{Monitor, TickOutcome};
