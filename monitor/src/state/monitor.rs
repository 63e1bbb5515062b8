use std::time::Instant;

use log::{info, warn};
use shm_bridge::{
    send_command_sync, Bridge, Clock, Command, CommandKind, CommandTiming, LiveSnapshot, Snapshot,
};

use super::{
    model::{CommandOutcome, LogLine, MonitorView, WorkerRow, WriterState},
    throughput::ThroughputTracker,
};
use crate::input::{Input, InputSource};

const MAX_LOGS: usize = 200;

/// Whether the loop should keep ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Quit,
}

/// Drives the monitor view from the shared region and operator input.
///
/// Nothing here is fatal: read failures become [`WriterState::ReadError`]
/// for one tick and a missing writer becomes [`WriterState::NotRunning`].
pub struct Monitor<C: Clock> {
    bridge: Bridge,
    clock: C,
    timing: CommandTiming,
    tracker: ThroughputTracker,
    started_at: Instant,
    view: MonitorView,
}

impl<C: Clock> Monitor<C> {
    /// Creates a new `Monitor`.
    ///
    /// # Args
    /// * `bridge` - Handle to the region; it attaches lazily.
    /// * `clock` - Time source for tick timing and command waits.
    /// * `timing` - Bounds of every command acknowledgement wait.
    /// * `ema_alpha` - Smoothing factor of the throughput average.
    pub fn new(bridge: Bridge, clock: C, timing: CommandTiming, ema_alpha: f64) -> Self {
        let started_at = clock.now();
        let mut view = MonitorView::new(bridge.name());
        view.logs.push(LogLine {
            level: "INFO",
            message: format!("waiting for region '{}'...", bridge.name()),
        });

        Self {
            bridge,
            clock,
            timing,
            tracker: ThroughputTracker::new(ema_alpha),
            started_at,
            view,
        }
    }

    /// Returns the current snapshot for rendering.
    pub fn view(&self) -> &MonitorView {
        &self.view
    }

    /// Runs one read / derive / input cycle.
    ///
    /// Should be called once per TUI frame tick. Drains every pending input
    /// without blocking. At most one command is sent per tick and later ones
    /// are dropped, so a tick waits for no more than one acknowledgement
    /// timeout.
    pub fn tick(&mut self, input: &mut dyn InputSource) -> TickOutcome {
        self.view.elapsed = self.clock.now().saturating_duration_since(self.started_at);
        self.refresh();

        let mut sent = false;
        let mut dropped = 0;
        loop {
            match input.poll_input() {
                Ok(Some(Input::Quit)) => return TickOutcome::Quit,
                Ok(Some(i)) if i.is_command() && sent => dropped += 1,
                Ok(Some(i)) => sent |= self.handle(i),
                Ok(None) => break,
                Err(e) => {
                    warn!("input unavailable: {e}");
                    break;
                }
            }
        }

        if dropped > 0 {
            self.push_log("WARN", format!("{dropped} queued command(s) dropped, one per tick"));
        }

        TickOutcome::Continue
    }

    fn refresh(&mut self) {
        match self.bridge.read_snapshot() {
            Ok(Snapshot::Live(live)) => self.apply(live),
            Ok(Snapshot::NotRunning) => self.lost_writer(),
            Err(e) => {
                let message = e.to_string();
                if self.view.state != WriterState::ReadError(message.clone()) {
                    self.push_log("ERROR", format!("read failed: {message}"));
                }
                self.view.state = WriterState::ReadError(message);
            }
        }
    }

    fn apply(&mut self, live: LiveSnapshot) {
        let count = live.header.worker_count;

        if !self.view.is_live() {
            let origin = self.bridge.origin().unwrap_or_else(|| "?".into());
            self.push_log("INFO", format!("writer attached via {origin} ({count} workers)"));
            self.view.origin = Some(origin);
        } else if count != self.view.worker_count {
            self.push_log(
                "INFO",
                format!("worker count changed {} -> {count}", self.view.worker_count),
            );
        }

        self.tracker.begin_tick(self.clock.now());
        let workers = live
            .workers
            .into_iter()
            .map(|status| {
                let (instant_rate, smoothed_rate) =
                    self.tracker.observe(status.id, status.iteration_count);
                WorkerRow {
                    status,
                    instant_rate,
                    smoothed_rate,
                }
            })
            .collect();
        self.tracker.retain_workers(count);

        let n = count.max(1) as usize;
        if self.view.focus >= n {
            self.view.focus = n - 1;
        }

        self.view.state = WriterState::Live;
        self.view.worker_count = count;
        self.view.global_best_score = live.header.global_best_score;
        self.view.workers = workers;
        self.view.skipped = live.skipped;
    }

    fn lost_writer(&mut self) {
        if self.view.state != WriterState::NotRunning {
            self.push_log("WARN", "writer not running".into());
        }

        self.tracker.reset();
        self.view.state = WriterState::NotRunning;
        self.view.origin = None;
        self.view.worker_count = 0;
        self.view.workers.clear();
        self.view.skipped.clear();
    }

    /// Applies one input. Returns whether a command went out to the writer.
    fn handle(&mut self, input: Input) -> bool {
        let n = self.view.worker_count.max(0) as usize;

        match input {
            Input::FocusUp if n > 0 => self.view.focus = (self.view.focus + n - 1) % n,
            Input::FocusDown if n > 0 => self.view.focus = (self.view.focus + 1) % n,
            Input::FocusUp | Input::FocusDown | Input::Quit => {}
            Input::SoftReseed => {
                return self.dispatch(|t| Some(Command::new(t, CommandKind::SoftReseed)));
            }
            Input::KillAndReseed => {
                return self.dispatch(|t| Some(Command::new(t, CommandKind::KillCycleAndReseed)));
            }
            Input::HeatUp => return self.retemper(2.0),
            Input::CoolDown => return self.retemper(0.5),
        }
        false
    }

    fn retemper(&mut self, factor: f64) -> bool {
        let temperature = self.view.focused().map(|w| w.status.temperature);
        self.dispatch(|t| temperature.map(|temp| Command::set_temperature(t, temp * factor)))
    }

    /// Sends the command built for the focused worker and records the outcome.
    ///
    /// # Returns
    /// `true` if the command was written and waited on, whatever the outcome.
    fn dispatch(&mut self, build: impl FnOnce(i32) -> Option<Command>) -> bool {
        if !self.view.is_live() {
            self.push_log("WARN", "no active writer, command ignored".into());
            return false;
        }

        let target = self.view.focus as i32;
        let Some(cmd) = build(target) else {
            self.push_log("WARN", format!("worker {target}: no data this tick, command ignored"));
            return false;
        };

        let acknowledged = send_command_sync(&mut self.bridge, &cmd, &self.timing, &self.clock);
        self.view.last_command = Some(CommandOutcome {
            target,
            kind: cmd.kind,
            acknowledged,
        });

        let detail = match cmd.kind {
            CommandKind::SetTemperature => format!(" to {:.2}", cmd.param_value),
            _ => String::new(),
        };
        if acknowledged {
            info!("worker {target}: {}{detail} acknowledged", cmd.kind);
            self.push_log("INFO", format!("worker {target}: {}{detail} acknowledged", cmd.kind));
        } else {
            self.push_log(
                "WARN",
                format!(
                    "worker {target}: {}{detail} not acknowledged within {:?}",
                    cmd.kind, self.timing.timeout
                ),
            );
        }
        true
    }

    fn push_log(&mut self, level: &'static str, message: String) {
        self.view.logs.push(LogLine { level, message });
        if self.view.logs.len() > MAX_LOGS {
            let overflow = self.view.logs.len() - MAX_LOGS;
            self.view.logs.drain(..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shm_bridge::{
        backend::MemoryBackend,
        layout::{
            worker_offset, ACKNOWLEDGED, COMMAND_OFFSET, COMMAND_SIZE, PROCESSED_OFFSET,
            REGION_SIZE, WORKER_STATUS_SIZE,
        },
        ControlCommand, ManualClock, MemoryRegion, MonitorHeader, Region, WorkerStatus,
        TEMPERATURE_PARAM,
    };

    use super::*;
    use crate::input::ScriptedInput;

    const NAME: &str = "SAMonitor4D";

    fn publish(backend: &MemoryBackend, workers: i32) -> MemoryRegion {
        let region = MemoryRegion::new(REGION_SIZE);
        region.store(0, &MonitorHeader { worker_count: workers, global_best_score: 1000 }.encode());
        for id in 0..workers {
            set_worker(&region, WorkerStatus { id, temperature: 8.0, ..Default::default() });
        }
        backend.publish(NAME, region.clone());
        region
    }

    fn set_worker(region: &MemoryRegion, status: WorkerStatus) {
        region.store(worker_offset(status.id as usize), &status.encode());
    }

    fn mailbox(region: &MemoryRegion) -> ControlCommand {
        ControlCommand::decode(&region.read_range(COMMAND_OFFSET, COMMAND_SIZE).unwrap()).unwrap()
    }

    fn monitor<C: Clock>(backend: &MemoryBackend, clock: C) -> Monitor<C> {
        let bridge = Bridge::new(NAME, vec![Box::new(backend.clone())]);
        Monitor::new(bridge, clock, CommandTiming::default(), 0.2)
    }

    /// Manual clock whose writer acknowledges the mailbox after a delay.
    struct AckingClock {
        clock: ManualClock,
        region: MemoryRegion,
        deadline: Instant,
    }

    impl AckingClock {
        fn new(region: MemoryRegion) -> Self {
            let clock = ManualClock::new();
            let deadline = clock.now() + Duration::from_secs(3600);
            Self { clock, region, deadline }
        }

        fn ack_in(&mut self, delay: Duration) {
            self.deadline = self.clock.now() + delay;
        }
    }

    impl Clock for AckingClock {
        fn now(&self) -> Instant {
            self.clock.now()
        }

        fn sleep(&self, duration: Duration) {
            self.clock.sleep(duration);
            if self.clock.now() >= self.deadline {
                self.region.store(PROCESSED_OFFSET, &ACKNOWLEDGED.to_le_bytes());
            }
        }
    }

    #[test]
    fn absent_writer_is_not_running() {
        let backend = MemoryBackend::new();
        let mut monitor = monitor(&backend, ManualClock::new());

        assert_eq!(monitor.tick(&mut ScriptedInput::default()), TickOutcome::Continue);
        let view = monitor.view();
        assert_eq!(view.state, WriterState::NotRunning);
        assert!(view.workers.is_empty());
    }

    #[test]
    fn zero_workers_is_not_running() {
        let backend = MemoryBackend::new();
        publish(&backend, 0);
        let mut monitor = monitor(&backend, ManualClock::new());

        monitor.tick(&mut ScriptedInput::default());
        assert_eq!(monitor.view().state, WriterState::NotRunning);
    }

    #[test]
    fn reads_workers_and_smooths_throughput() {
        let backend = MemoryBackend::new();
        let region = publish(&backend, 3);
        let clock = ManualClock::new();
        let mut monitor = monitor(&backend, &clock);

        set_worker(&region, WorkerStatus { id: 1, iteration_count: 500, ..Default::default() });
        monitor.tick(&mut ScriptedInput::default());
        assert_eq!(monitor.view().workers.len(), 3);
        assert_eq!(monitor.view().global_best_score, 1000);

        clock.advance(Duration::from_millis(500));
        set_worker(&region, WorkerStatus { id: 1, iteration_count: 700, ..Default::default() });
        monitor.tick(&mut ScriptedInput::default());

        let row = &monitor.view().workers[1];
        assert!((row.instant_rate - 400.0).abs() < 1e-9);
        assert!((row.smoothed_rate - 80.0).abs() < 1e-9);
    }

    #[test]
    fn torn_record_is_skipped_for_the_tick() {
        let backend = MemoryBackend::new();
        let region = publish(&backend, 5);
        region.resize(worker_offset(4) + WORKER_STATUS_SIZE / 2);
        let mut monitor = monitor(&backend, ManualClock::new());

        monitor.tick(&mut ScriptedInput::default());
        let view = monitor.view();
        assert!(view.is_live());
        assert_eq!(view.workers.len(), 4);
        assert_eq!(view.skipped, vec![4]);
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let backend = MemoryBackend::new();
        publish(&backend, 3);
        let mut monitor = monitor(&backend, ManualClock::new());

        monitor.tick(&mut ScriptedInput::new([Input::FocusUp]));
        assert_eq!(monitor.view().focus, 2);

        monitor.tick(&mut ScriptedInput::new([Input::FocusDown, Input::FocusDown]));
        assert_eq!(monitor.view().focus, 1);
        assert_eq!(monitor.view().focused().map(|w| w.status.id), Some(1));
    }

    #[test]
    fn focus_is_clamped_when_workers_shrink() {
        let backend = MemoryBackend::new();
        let region = publish(&backend, 4);
        let mut monitor = monitor(&backend, ManualClock::new());
        monitor.tick(&mut ScriptedInput::new([Input::FocusUp]));
        assert_eq!(monitor.view().focus, 3);

        region.store(0, &MonitorHeader { worker_count: 2, global_best_score: 1000 }.encode());
        monitor.tick(&mut ScriptedInput::default());
        assert_eq!(monitor.view().focus, 1);
    }

    #[test]
    fn quit_stops_draining_input() {
        let backend = MemoryBackend::new();
        publish(&backend, 2);
        let mut monitor = monitor(&backend, ManualClock::new());
        let mut input = ScriptedInput::new([Input::Quit]);
        input.push(Input::FocusDown);

        assert_eq!(monitor.tick(&mut input), TickOutcome::Quit);
        assert!(!input.is_drained());
        assert_eq!(monitor.view().focus, 0);
    }

    #[test]
    fn kill_and_reseed_acknowledged() {
        let backend = MemoryBackend::new();
        let region = publish(&backend, 2);
        let mut clock = AckingClock::new(region.clone());
        clock.ack_in(Duration::from_millis(50));
        let mut monitor = monitor(&backend, clock);

        monitor.tick(&mut ScriptedInput::new([Input::KillAndReseed]));

        let outcome = monitor.view().last_command.unwrap();
        assert!(outcome.acknowledged);
        assert_eq!(outcome.target, 0);
        assert_eq!(outcome.kind, CommandKind::KillCycleAndReseed);
        assert_eq!(mailbox(&region).command_type, 2);
        assert!(monitor.view().logs.last().unwrap().message.contains("acknowledged"));
    }

    #[test]
    fn silent_writer_times_out() {
        let backend = MemoryBackend::new();
        let region = publish(&backend, 2);
        let clock = ManualClock::new();
        let mut monitor = monitor(&backend, &clock);
        let before = clock.now();

        monitor.tick(&mut ScriptedInput::new([Input::FocusDown, Input::SoftReseed]));

        let outcome = monitor.view().last_command.unwrap();
        assert!(!outcome.acknowledged);
        assert_eq!(outcome.target, 1);
        assert_eq!(clock.now() - before, Duration::from_millis(200));
        assert_eq!(mailbox(&region).processed, 0);
        assert_eq!(monitor.view().logs.last().unwrap().level, "WARN");
    }

    #[test]
    fn one_command_per_tick() {
        let backend = MemoryBackend::new();
        publish(&backend, 3);
        let clock = ManualClock::new();
        let mut monitor = monitor(&backend, &clock);
        let before = clock.now();

        let mut input = ScriptedInput::new(std::iter::repeat(Input::SoftReseed).take(10));
        input.push(Input::FocusDown);
        monitor.tick(&mut input);

        assert!(input.is_drained());
        assert_eq!(clock.now() - before, CommandTiming::default().timeout);
        assert_eq!(monitor.view().focus, 1);
        assert_eq!(monitor.view().last_command.unwrap().target, 0);
        assert!(monitor.view().logs.last().unwrap().message.starts_with("9 queued"));
    }

    #[test]
    fn heat_up_doubles_focused_temperature() {
        let backend = MemoryBackend::new();
        let region = publish(&backend, 1);
        let mut monitor = monitor(&backend, AckingClock::new(region.clone()));

        monitor.tick(&mut ScriptedInput::new([Input::HeatUp]));

        let cmd = mailbox(&region);
        assert_eq!(cmd.command_type, 3);
        assert_eq!(cmd.param_index, TEMPERATURE_PARAM);
        assert_eq!(cmd.param_value, 16.0);
    }

    #[test]
    fn commands_without_writer_are_ignored() {
        let backend = MemoryBackend::new();
        let mut monitor = monitor(&backend, ManualClock::new());

        monitor.tick(&mut ScriptedInput::new([Input::SoftReseed]));
        assert_eq!(monitor.view().last_command, None);
        assert!(monitor.view().logs.last().unwrap().message.contains("ignored"));
    }

    #[test]
    fn writer_restart_resets_throughput() {
        let backend = MemoryBackend::new();
        publish(&backend, 1);
        let clock = ManualClock::new();
        let mut monitor = monitor(&backend, &clock);
        monitor.tick(&mut ScriptedInput::default());

        backend.withdraw(NAME);
        clock.advance(Duration::from_millis(200));
        monitor.tick(&mut ScriptedInput::default());
        assert_eq!(monitor.view().state, WriterState::NotRunning);

        let region = publish(&backend, 1);
        set_worker(&region, WorkerStatus { id: 0, iteration_count: 1_000_000, ..Default::default() });
        clock.advance(Duration::from_millis(200));
        monitor.tick(&mut ScriptedInput::default());

        let row = &monitor.view().workers[0];
        assert!(monitor.view().is_live());
        assert_eq!(row.smoothed_rate, 0.0);
    }

    #[test]
    fn event_log_is_capped() {
        let backend = MemoryBackend::new();
        let mut monitor = monitor(&backend, ManualClock::new());
        let mut input = ScriptedInput::new(std::iter::repeat(Input::SoftReseed).take(250));

        monitor.tick(&mut input);
        assert_eq!(monitor.view().logs.len(), MAX_LOGS);
    }
}
