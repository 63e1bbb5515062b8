use std::{path::PathBuf, time::Duration};

use shm_bridge::{BackendKind, CommandTiming};

use super::model::MonitorConfig;
use crate::ui::palette::RenderConfig;

/// Validated runtime settings derived from a [`MonitorConfig`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub shm_name: String,
    pub backend: BackendKind,
    pub shm_dir: PathBuf,
    pub tick: Duration,
    pub timing: CommandTiming,
    pub ema_alpha: f64,
    pub render: RenderConfig,
}

/// Checks every value of `config` and converts it into [`Settings`].
///
/// # Errors
/// Returns a human-readable error if any value is invalid.
pub fn build(config: &MonitorConfig) -> Result<Settings, String> {
    let shm_name = config.shm_name.trim();
    if shm_name.is_empty() {
        return Err("shm_name must not be empty".into());
    }

    if config.tick_ms == 0 {
        return Err("tick_ms must be greater than 0".into());
    }

    if config.command_poll_ms == 0 {
        return Err("command_poll_ms must be greater than 0".into());
    }

    if config.command_timeout_ms < config.command_poll_ms {
        return Err(format!(
            "command_timeout_ms ({}) must be at least command_poll_ms ({})",
            config.command_timeout_ms, config.command_poll_ms
        ));
    }

    if !(config.ema_alpha > 0.0 && config.ema_alpha <= 1.0) {
        return Err(format!("ema_alpha must be in (0, 1], got {}", config.ema_alpha));
    }

    if config.basis_max_range < 2 {
        return Err(format!(
            "basis_max_range must be at least 2, got {}",
            config.basis_max_range
        ));
    }

    let render = RenderConfig::new(config.basis_max_range).with_action_names(&config.action_names);

    Ok(Settings {
        shm_name: shm_name.to_string(),
        backend: config.backend,
        shm_dir: config.shm_dir.clone(),
        tick: Duration::from_millis(config.tick_ms),
        timing: CommandTiming {
            timeout: Duration::from_millis(config.command_timeout_ms),
            poll_interval: Duration::from_millis(config.command_poll_ms),
        },
        ema_alpha: config.ema_alpha,
        render,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = build(&MonitorConfig::default()).unwrap();
        assert_eq!(settings.shm_name, "SAMonitor4D");
        assert_eq!(settings.tick, Duration::from_millis(200));
        assert_eq!(settings.timing, CommandTiming::default());
        assert_eq!(settings.ema_alpha, 0.2);
    }

    #[test]
    fn rejects_zero_tick() {
        let config = MonitorConfig { tick_ms: 0, ..Default::default() };
        assert!(build(&config).unwrap_err().contains("tick_ms"));
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        for alpha in [0.0, -0.5, 1.5, f64::NAN] {
            let config = MonitorConfig { ema_alpha: alpha, ..Default::default() };
            assert!(build(&config).is_err(), "alpha {alpha} accepted");
        }
        let config = MonitorConfig { ema_alpha: 1.0, ..Default::default() };
        assert!(build(&config).is_ok());
    }

    #[test]
    fn rejects_timeout_shorter_than_poll() {
        let config = MonitorConfig {
            command_timeout_ms: 2,
            command_poll_ms: 5,
            ..Default::default()
        };
        assert!(build(&config).is_err());
    }

    #[test]
    fn action_name_overrides_apply() {
        let config = MonitorConfig {
            action_names: vec!["Swap".into()],
            ..Default::default()
        };
        let settings = build(&config).unwrap();
        assert_eq!(settings.render.action_name(0), "Swap");
        assert_eq!(settings.render.action_name(1), "Dist 2 Swap");
    }
}
