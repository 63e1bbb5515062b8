use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::model::MonitorConfig;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "SHM_MONITOR_CONFIG";

/// Loads a [`MonitorConfig`] from `path`, or defaults when no path is given
/// and `SHM_MONITOR_CONFIG` is unset.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid JSON for the
/// config schema.
pub fn load(path: Option<&Path>) -> Result<MonitorConfig> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let Some(path) = path.map(Path::to_path_buf).or(from_env) else {
        return Ok(MonitorConfig::default());
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("invalid config '{}'", path.display()))
}

/// Applies `SHM_NAME` / `SHM_DIR` style overrides looked up through `var`.
pub fn apply_overrides(config: &mut MonitorConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(name) = var("SHM_NAME").filter(|v| !v.trim().is_empty()) {
        config.shm_name = name.trim().to_string();
    }
    if let Some(dir) = var("SHM_DIR").filter(|v| !v.trim().is_empty()) {
        config.shm_dir = PathBuf::from(dir.trim());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use shm_bridge::BackendKind;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "shm_name": "Local\\Other", "backend": "file", "tick_ms": 250 }}"#).unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.shm_name, "Local\\Other");
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.tick_ms, 250);
        assert_eq!(config.command_timeout_ms, 200);
        assert_eq!(config.ema_alpha, 0.2);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "tick": 250 }}"#).unwrap();

        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load(Some(Path::new("/definitely/not/here.json"))).is_err());
    }

    #[test]
    fn env_overrides_name_and_dir() {
        let mut config = MonitorConfig::default();
        apply_overrides(&mut config, |key| match key {
            "SHM_NAME" => Some("Custom".into()),
            "SHM_DIR" => Some("/tmp/regions".into()),
            _ => None,
        });

        assert_eq!(config.shm_name, "Custom");
        assert_eq!(config.shm_dir, PathBuf::from("/tmp/regions"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = MonitorConfig::default();
        apply_overrides(&mut config, |_| Some("  ".into()));
        assert_eq!(config, MonitorConfig::default());
    }
}
