//! Byte-exact layout of the monitor region published by the solver.
//!
//! The region is `MonitorHeader ++ ControlCommand ++ WorkerStatus[worker_count]`,
//! every field little-endian and tightly packed. Records are not
//! self-describing: offsets derive from `worker_count` and the fixed record
//! size alone, so a corrupt header desynchronizes every read after it.

/// Version of the layout below. Any change to the bounds, array lengths or
/// field order must bump this.
pub const LAYOUT_VERSION: u32 = 1;

/// Capacity of the mapping created by the writer.
pub const REGION_SIZE: usize = 64 * 1024;

/// Upper bound on `worker_count`; anything outside `(0, MAX_WORKERS]` means no writer.
pub const MAX_WORKERS: usize = 32;

/// Length of each per-action array.
pub const ACTION_SLOTS: usize = 24;

/// Leading slots of each per-action array that carry data.
pub const ACTIVE_ACTIONS: usize = 15;

pub const BOARD_ROWS: usize = 8;
pub const BOARD_COLS: usize = 14;
pub const BOARD_CELLS: usize = BOARD_ROWS * BOARD_COLS;

const I32: usize = size_of::<i32>();
const I64: usize = size_of::<i64>();
const F64: usize = size_of::<f64>();

pub const HEADER_SIZE: usize = I32 + I64;
pub const COMMAND_SIZE: usize = 4 * I32 + F64;
pub const WORKER_STATUS_SIZE: usize =
    6 * I32 + 3 * I64 + 5 * F64 + 3 * ACTION_SLOTS * F64 + BOARD_CELLS * I32;

pub const COMMAND_OFFSET: usize = HEADER_SIZE;
pub const WORKERS_OFFSET: usize = COMMAND_OFFSET + COMMAND_SIZE;

/// Offset of `ControlCommand::processed` inside the region.
pub const PROCESSED_OFFSET: usize = COMMAND_OFFSET + 2 * I32;

/// `processed` value written with every new command.
pub const PENDING: i32 = 0;
/// `processed` value the writer stores once it consumed the command.
pub const ACKNOWLEDGED: i32 = 1;

/// `(name, width)` of every `WorkerStatus` field in wire order.
pub const WORKER_FIELDS: &[(&str, usize)] = &[
    ("id", I32),
    ("current_score", I64),
    ("best_score", I64),
    ("temperature", F64),
    ("iteration_count", I64),
    ("scoring_mode", I32),
    ("strategy", I32),
    ("cycle_number", I32),
    ("seed", I32),
    ("trial_number", I32),
    ("reheat_factor", F64),
    ("overall_accept_rate", F64),
    ("bad_move_accept_rate", F64),
    ("score_std_dev", F64),
    ("action_weights", ACTION_SLOTS * F64),
    ("action_accept_rates", ACTION_SLOTS * F64),
    ("action_deltas", ACTION_SLOTS * F64),
    ("board", BOARD_CELLS * I32),
];

/// Returns whether `n` is a worker count a live writer can publish.
pub fn is_valid_worker_count(n: i32) -> bool {
    n > 0 && n as usize <= MAX_WORKERS
}

/// Byte offset of worker record `index`.
pub const fn worker_offset(index: usize) -> usize {
    WORKERS_OFFSET + index * WORKER_STATUS_SIZE
}

/// One past the last byte used by `worker_count` records.
pub const fn workers_extent(worker_count: usize) -> usize {
    worker_offset(worker_count)
}

/// Fixed prefix of the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorHeader {
    pub worker_count: i32,
    pub global_best_score: i64,
}

impl MonitorHeader {
    /// Decodes a header, `None` if `buf` is not exactly `HEADER_SIZE` bytes.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != HEADER_SIZE {
            return None;
        }

        let mut r = FieldReader::new(buf);
        Some(Self {
            worker_count: r.i32()?,
            global_best_score: r.i64()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(HEADER_SIZE);
        w.i32(self.worker_count);
        w.i64(self.global_best_score);
        w.finish()
    }

    /// Whether the header describes a running writer.
    pub fn is_live(&self) -> bool {
        is_valid_worker_count(self.worker_count)
    }
}

/// The single-slot mailbox used to signal the writer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    pub target_worker: i32,
    pub command_type: i32,
    /// `PENDING` until the writer consumes the command, then `ACKNOWLEDGED`.
    pub processed: i32,
    pub param_index: i32,
    pub param_value: f64,
}

impl ControlCommand {
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != COMMAND_SIZE {
            return None;
        }

        let mut r = FieldReader::new(buf);
        Some(Self {
            target_worker: r.i32()?,
            command_type: r.i32()?,
            processed: r.i32()?,
            param_index: r.i32()?,
            param_value: r.f64()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(COMMAND_SIZE);
        w.i32(self.target_worker);
        w.i32(self.command_type);
        w.i32(self.processed);
        w.i32(self.param_index);
        w.f64(self.param_value);
        w.finish()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.processed == ACKNOWLEDGED
    }
}

/// Live state of one solver worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStatus {
    pub id: i32,
    pub current_score: i64,
    pub best_score: i64,
    pub temperature: f64,
    pub iteration_count: i64,
    pub scoring_mode: i32,
    pub strategy: i32,
    pub cycle_number: i32,
    pub seed: i32,
    pub trial_number: i32,
    pub reheat_factor: f64,
    pub overall_accept_rate: f64,
    pub bad_move_accept_rate: f64,
    pub score_std_dev: f64,
    pub action_weights: [f64; ACTION_SLOTS],
    pub action_accept_rates: [f64; ACTION_SLOTS],
    pub action_deltas: [f64; ACTION_SLOTS],
    /// Row-major 8x14 board of single digits.
    pub board: [i32; BOARD_CELLS],
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self {
            id: 0,
            current_score: 0,
            best_score: 0,
            temperature: 0.0,
            iteration_count: 0,
            scoring_mode: 0,
            strategy: 0,
            cycle_number: 0,
            seed: 0,
            trial_number: 0,
            reheat_factor: 0.0,
            overall_accept_rate: 0.0,
            bad_move_accept_rate: 0.0,
            score_std_dev: 0.0,
            action_weights: [0.0; ACTION_SLOTS],
            action_accept_rates: [0.0; ACTION_SLOTS],
            action_deltas: [0.0; ACTION_SLOTS],
            board: [0; BOARD_CELLS],
        }
    }
}

impl WorkerStatus {
    /// Decodes a record, `None` if `buf` is not exactly `WORKER_STATUS_SIZE`
    /// bytes (a torn or truncated read).
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != WORKER_STATUS_SIZE {
            return None;
        }

        let mut r = FieldReader::new(buf);
        Some(Self {
            id: r.i32()?,
            current_score: r.i64()?,
            best_score: r.i64()?,
            temperature: r.f64()?,
            iteration_count: r.i64()?,
            scoring_mode: r.i32()?,
            strategy: r.i32()?,
            cycle_number: r.i32()?,
            seed: r.i32()?,
            trial_number: r.i32()?,
            reheat_factor: r.f64()?,
            overall_accept_rate: r.f64()?,
            bad_move_accept_rate: r.f64()?,
            score_std_dev: r.f64()?,
            action_weights: r.f64_array()?,
            action_accept_rates: r.f64_array()?,
            action_deltas: r.f64_array()?,
            board: r.i32_array()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(WORKER_STATUS_SIZE);
        w.i32(self.id);
        w.i64(self.current_score);
        w.i64(self.best_score);
        w.f64(self.temperature);
        w.i64(self.iteration_count);
        w.i32(self.scoring_mode);
        w.i32(self.strategy);
        w.i32(self.cycle_number);
        w.i32(self.seed);
        w.i32(self.trial_number);
        w.f64(self.reheat_factor);
        w.f64(self.overall_accept_rate);
        w.f64(self.bad_move_accept_rate);
        w.f64(self.score_std_dev);
        self.action_weights.iter().for_each(|&v| w.f64(v));
        self.action_accept_rates.iter().for_each(|&v| w.f64(v));
        self.action_deltas.iter().for_each(|&v| w.f64(v));
        self.board.iter().for_each(|&v| w.i32(v));
        w.finish()
    }

    /// Returns the 14 cells of board row `row`, `None` past the last row.
    pub fn board_row(&self, row: usize) -> Option<&[i32]> {
        let start = row.checked_mul(BOARD_COLS)?;
        self.board.get(start..start + BOARD_COLS)
    }

    /// Iterates `(slot, weight, accept_rate, delta)` over the active action slots.
    pub fn active_actions(&self) -> impl Iterator<Item = (usize, f64, f64, f64)> + '_ {
        (0..ACTIVE_ACTIONS).map(|i| {
            (
                i,
                self.action_weights[i],
                self.action_accept_rates[i],
                self.action_deltas[i],
            )
        })
    }
}

/// Sequential little-endian field reader over a borrowed buffer.
struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.buf.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn i64(&mut self) -> Option<i64> {
        self.take().map(i64::from_le_bytes)
    }

    fn f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn f64_array<const N: usize>(&mut self) -> Option<[f64; N]> {
        let mut out = [0.0; N];
        for v in out.iter_mut() {
            *v = self.f64()?;
        }
        Some(out)
    }

    fn i32_array<const N: usize>(&mut self) -> Option<[i32; N]> {
        let mut out = [0; N];
        for v in out.iter_mut() {
            *v = self.i32()?;
        }
        Some(out)
    }
}

struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}
