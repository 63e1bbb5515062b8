//! One-shot, non-interactive output.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use shm_bridge::{
    layout::{
        self, ACTION_SLOTS, ACTIVE_ACTIONS, BOARD_CELLS, COMMAND_OFFSET, COMMAND_SIZE,
        HEADER_SIZE, MAX_WORKERS, REGION_SIZE, WORKERS_OFFSET, WORKER_FIELDS, WORKER_STATUS_SIZE,
    },
    Bridge, Snapshot, WorkerStatus,
};

use crate::{config::Settings, ui::palette::RenderConfig};

/// Writes the sizes and offsets of every region structure.
///
/// # Errors
/// Returns an error if `out` cannot be written.
pub fn print_layout(out: &mut impl Write) -> Result<()> {
    writeln!(out, "layout version   {}", layout::LAYOUT_VERSION)?;
    writeln!(out, "region size      {REGION_SIZE}")?;
    writeln!(out, "max workers      {MAX_WORKERS}")?;
    writeln!(out)?;
    writeln!(out, "MonitorHeader    size {HEADER_SIZE:>5}  offset {:>5}", 0)?;
    writeln!(out, "ControlCommand   size {COMMAND_SIZE:>5}  offset {COMMAND_OFFSET:>5}")?;
    writeln!(out, "WorkerStatus     size {WORKER_STATUS_SIZE:>5}  offset {WORKERS_OFFSET:>5}")?;
    writeln!(
        out,
        "  {MAX_WORKERS} workers end at {} of {REGION_SIZE}",
        layout::workers_extent(MAX_WORKERS)
    )?;
    writeln!(out)?;

    let mut offset = 0;
    for (name, width) in WORKER_FIELDS {
        writeln!(out, "  {offset:>5}  {width:>5}  {name}")?;
        offset += width;
    }
    writeln!(
        out,
        "\naction slots {ACTION_SLOTS} ({ACTIVE_ACTIONS} active), board cells {BOARD_CELLS}"
    )?;
    Ok(())
}

/// A worker record as printed by `snapshot`.
#[derive(Debug, Serialize)]
pub struct WorkerSummary {
    pub id: i32,
    pub cycle: i32,
    pub trial: i32,
    pub seed: i32,
    pub mode: String,
    pub current_score: i64,
    pub best_score: i64,
    pub normalized_best: f64,
    pub temperature: f64,
    pub iterations: i64,
    pub reheat_factor: f64,
    pub overall_accept_rate: f64,
    pub bad_move_accept_rate: f64,
    pub score_std_dev: f64,
    pub action_weights: Vec<f64>,
    pub board: Vec<String>,
}

impl WorkerSummary {
    pub fn new(s: &WorkerStatus, cfg: &RenderConfig) -> Self {
        let board = (0..layout::BOARD_ROWS)
            .filter_map(|r| s.board_row(r))
            .map(|row| row.iter().map(|v| v.to_string()).collect::<String>())
            .collect();

        Self {
            id: s.id,
            cycle: s.cycle_number,
            trial: s.trial_number,
            seed: s.seed,
            mode: cfg.mode_name(s.scoring_mode),
            current_score: s.current_score,
            best_score: s.best_score,
            normalized_best: cfg.scales.normalize(s.scoring_mode, s.best_score),
            temperature: s.temperature,
            iterations: s.iteration_count,
            reheat_factor: s.reheat_factor,
            overall_accept_rate: s.overall_accept_rate,
            bad_move_accept_rate: s.bad_move_accept_rate,
            score_std_dev: s.score_std_dev,
            action_weights: s.active_actions().map(|(_, w, _, _)| w).collect(),
            board,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SnapshotReport {
    NotRunning,
    Live {
        origin: Option<String>,
        worker_count: i32,
        global_best_score: i64,
        skipped: Vec<usize>,
        workers: Vec<WorkerSummary>,
    },
}

/// Reads the region once.
///
/// # Errors
/// Returns an error if an attached region cannot be read.
pub fn snapshot(bridge: &mut Bridge, cfg: &RenderConfig) -> Result<SnapshotReport> {
    let report = match bridge.read_snapshot()? {
        Snapshot::NotRunning => SnapshotReport::NotRunning,
        Snapshot::Live(live) => SnapshotReport::Live {
            origin: bridge.origin(),
            worker_count: live.header.worker_count,
            global_best_score: live.header.global_best_score,
            skipped: live.skipped,
            workers: live.workers.iter().map(|w| WorkerSummary::new(w, cfg)).collect(),
        },
    };
    Ok(report)
}

/// Prints one snapshot of the configured region as JSON.
///
/// # Errors
/// Returns an error if the region cannot be read or `out` cannot be written.
pub fn print_snapshot(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let mut bridge = Bridge::for_platform(&settings.shm_name, settings.backend, &settings.shm_dir);
    let report = snapshot(&mut bridge, &settings.render)?;
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use shm_bridge::{
        backend::MemoryBackend, layout::worker_offset, MemoryRegion, MonitorHeader,
    };

    use super::*;

    #[test]
    fn layout_lists_known_offsets() {
        let mut out = Vec::new();
        print_layout(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("MonitorHeader    size    12  offset     0"));
        assert!(text.contains("ControlCommand   size    24  offset    12"));
        assert!(text.contains("WorkerStatus     size  1112  offset    36"));
        assert!(text.contains("  664    448  board"));
    }

    #[test]
    fn snapshot_without_writer() {
        let mut bridge = Bridge::new("SAMonitor4D", vec![Box::new(MemoryBackend::new())]);
        let report = snapshot(&mut bridge, &RenderConfig::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "not_running" }));
    }

    #[test]
    fn snapshot_of_live_region() {
        let backend = MemoryBackend::new();
        let region = MemoryRegion::new(REGION_SIZE);
        region.store(0, &MonitorHeader { worker_count: 1, global_best_score: 42 }.encode());
        let mut status = WorkerStatus { id: 0, best_score: 99, scoring_mode: 2, ..Default::default() };
        status.board[0] = 7;
        region.store(worker_offset(0), &status.encode());
        backend.publish("SAMonitor4D", region);

        let mut bridge = Bridge::new("SAMonitor4D", vec![Box::new(backend)]);
        let json = serde_json::to_value(snapshot(&mut bridge, &RenderConfig::default()).unwrap()).unwrap();

        assert_eq!(json["state"], "live");
        assert_eq!(json["global_best_score"], 42);
        assert_eq!(json["workers"][0]["mode"], "SUM");
        assert_eq!(json["workers"][0]["board"][0], "70000000000000");
        assert_eq!(json["workers"][0]["action_weights"].as_array().unwrap().len(), 15);
    }
}
