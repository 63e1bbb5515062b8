use std::io;
use std::time::Instant;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use shm_bridge::{Bridge, Clock, SystemClock};

use crate::{
    config::Settings,
    input::TerminalInput,
    state::{Monitor, TickOutcome},
    ui,
};

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Runs the monitor console until the operator quits.
///
/// Each tick reads the region, applies pending input, draws, then sleeps for
/// what is left of the tick interval. Region failures never end the loop.
///
/// # Errors
/// Returns an error if terminal setup or rendering fails.
pub fn run(settings: &Settings) -> Result<()> {
    let bridge = Bridge::for_platform(&settings.shm_name, settings.backend, &settings.shm_dir);
    let mut monitor = Monitor::new(bridge, SystemClock, settings.timing, settings.ema_alpha);
    let mut input = TerminalInput;

    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    info!(
        "monitoring '{}' every {:?} (command timeout {:?})",
        settings.shm_name, settings.tick, settings.timing.timeout
    );

    loop {
        let started = Instant::now();

        if monitor.tick(&mut input) == TickOutcome::Quit {
            break;
        }
        terminal.draw(|f| ui::draw(f, monitor.view(), &settings.render))?;

        if let Some(rest) = settings.tick.checked_sub(started.elapsed()) {
            SystemClock.sleep(rest);
        }
    }

    terminal.show_cursor()?;
    info!("monitor stopped");
    Ok(())
}
