use std::time::Duration;

use shm_bridge::{CommandKind, WorkerStatus};

/// What the last tick saw of the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum WriterState {
    /// Region present with a valid header.
    Live,
    /// No region, or a header outside the worker count bounds.
    NotRunning,
    /// The read failed this tick; the message is shown in the error panel.
    ReadError(String),
}

/// One worker as shown in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerRow {
    pub status: WorkerStatus,
    /// Iterations per second since the previous tick.
    pub instant_rate: f64,
    /// Exponential moving average of `instant_rate`.
    pub smoothed_rate: f64,
}

/// A single log entry shown in the event panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub level: &'static str,
    pub message: String,
}

/// Result of the last command sent from the console.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandOutcome {
    pub target: i32,
    pub kind: CommandKind,
    pub acknowledged: bool,
}

/// Full snapshot rendered by the TUI.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorView {
    pub state: WriterState,
    pub shm_name: String,
    /// Backend description of the attached mapping.
    pub origin: Option<String>,
    pub elapsed: Duration,
    pub worker_count: i32,
    pub global_best_score: i64,
    pub workers: Vec<WorkerRow>,
    /// Worker indices skipped as torn this tick.
    pub skipped: Vec<usize>,
    /// Index into `[0, worker_count)` of the focused worker.
    pub focus: usize,
    pub last_command: Option<CommandOutcome>,
    pub logs: Vec<LogLine>,
}

impl MonitorView {
    pub fn new(shm_name: impl Into<String>) -> Self {
        Self {
            state: WriterState::NotRunning,
            shm_name: shm_name.into(),
            origin: None,
            elapsed: Duration::ZERO,
            worker_count: 0,
            global_best_score: 0,
            workers: Vec::new(),
            skipped: Vec::new(),
            focus: 0,
            last_command: None,
            logs: Vec::new(),
        }
    }

    /// Row of the focused worker, if its record was read this tick.
    ///
    /// The writer keeps `id == index`, so a torn record leaves a gap rather
    /// than shifting focus onto a neighbour.
    pub fn focused(&self) -> Option<&WorkerRow> {
        self.workers
            .iter()
            .find(|w| usize::try_from(w.status.id).is_ok_and(|id| id == self.focus))
    }

    pub fn is_live(&self) -> bool {
        self.state == WriterState::Live
    }
}
