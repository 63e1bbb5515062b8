use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shm_bridge::{backend::DEFAULT_SHM_DIR, BackendKind, DEFAULT_REGION_NAME};

/// Monitor configuration as read from JSON. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub shm_name: String,
    pub backend: BackendKind,
    pub shm_dir: PathBuf,
    pub tick_ms: u64,
    pub command_timeout_ms: u64,
    pub command_poll_ms: u64,
    /// Weight of the newest sample in the throughput average.
    pub ema_alpha: f64,
    /// The solver's `BASIS_MAX_RANGE`, used to normalise scores per mode.
    pub basis_max_range: u32,
    /// Overrides for the action slot names, in slot order.
    pub action_names: Vec<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            shm_name: DEFAULT_REGION_NAME.to_string(),
            backend: BackendKind::Auto,
            shm_dir: PathBuf::from(DEFAULT_SHM_DIR),
            tick_ms: 200,
            command_timeout_ms: 200,
            command_poll_ms: 5,
            ema_alpha: 0.2,
            basis_max_range: 13_000,
            action_names: Vec::new(),
            log_file: None,
        }
    }
}

impl MonitorConfig {
    /// Where logs go when `log_file` is not set.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("shm_monitor.log"))
    }
}
