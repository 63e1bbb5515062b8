use ratatui::{
    layout::{Alignment, Constraint},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use super::{palette::RenderConfig, theme::Theme};
use crate::state::model::{MonitorView, WorkerRow, WriterState};

/// Width of the action weight bars.
pub const BAR_WIDTH: usize = 20;

const HELP: &str = "↑/↓ w/s: focus  r: soft reseed  k: kill & reseed  +/-: temp  q: quit";

fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(Span::styled(title.into(), Theme::title()))
}

pub fn header<'a>(view: &'a MonitorView) -> Paragraph<'a> {
    let state = match &view.state {
        WriterState::Live => Span::styled("LIVE", Theme::ok()),
        WriterState::NotRunning => Span::styled("NOT RUNNING", Theme::warn()),
        WriterState::ReadError(_) => Span::styled("READ ERROR", Theme::error()),
    };

    let line1 = Line::from(vec![
        Span::styled(format!("Region: {}", view.shm_name), Theme::text()),
        Span::raw("  |  "),
        state,
        Span::raw("  |  "),
        Span::styled(HELP, Theme::muted()),
    ]);

    let secs = view.elapsed.as_secs();
    let mut line2 = vec![Span::raw(format!(
        "Elapsed: {:02}:{:02}  |  Workers: {}  |  Global best: ",
        secs / 60,
        secs % 60,
        view.worker_count
    ))];
    line2.push(Span::styled(thousands(view.global_best_score), Theme::ok()));
    if let Some(origin) = &view.origin {
        line2.push(Span::styled(format!("  |  {origin}"), Theme::muted()));
    }
    if let Some(cmd) = &view.last_command {
        let (verdict, style) = if cmd.acknowledged {
            ("ack", Theme::ok())
        } else {
            ("timeout", Theme::warn())
        };
        line2.push(Span::raw(format!("  |  W{} {}: ", cmd.target, cmd.kind)));
        line2.push(Span::styled(verdict, style));
    }

    Paragraph::new(vec![line1, Line::from(line2)])
        .block(panel("SA Monitor"))
        .wrap(Wrap { trim: true })
}

pub fn workers_table<'a>(view: &'a MonitorView, cfg: &'a RenderConfig) -> Table<'a> {
    let header = Row::new(vec![
        "ID", "Cyc", "IPS", "Current", "Best", "Norm", "Mode", "Temp", "O.AR%", "B.AR%", "StdDev",
    ])
    .style(Theme::header());

    let rows = view.workers.iter().map(|w| {
        let s = &w.status;
        let row = Row::new(vec![
            Cell::from(s.id.to_string()),
            Cell::from(format!("C{}", s.cycle_number)),
            Cell::from(thousands(w.smoothed_rate.round() as i64)),
            Cell::from(Span::styled(thousands(s.current_score), Theme::score())),
            Cell::from(Span::styled(thousands(s.best_score), Theme::ok())),
            Cell::from(format!("{:.1}", cfg.scales.normalize(s.scoring_mode, s.best_score))),
            Cell::from(cfg.mode_name(s.scoring_mode)),
            Cell::from(Span::styled(format!("{:.2}", s.temperature), Theme::temperature(s.temperature))),
            Cell::from(Span::styled(
                percent(s.overall_accept_rate),
                Theme::accept_rate(s.overall_accept_rate),
            )),
            Cell::from(percent(s.bad_move_accept_rate)),
            Cell::from(format!("{:.1}", s.score_std_dev)),
        ]);

        if is_focused(view, w) {
            row.style(Theme::focus())
        } else {
            row
        }
    });

    let title = match view.skipped.as_slice() {
        [] => "Workers".to_string(),
        skipped => format!("Workers (torn: {skipped:?})"),
    };

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(15),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(6),
        ],
    )
    .header(header)
    .block(panel(title))
}

pub fn board<'a>(view: &'a MonitorView, cfg: &'a RenderConfig) -> Paragraph<'a> {
    let title = format!("Worker {} Board", view.focus);
    let Some(worker) = view.focused() else {
        return Paragraph::new(Span::styled("No data", Theme::muted())).block(panel(title));
    };

    let lines = (0..shm_bridge::layout::BOARD_ROWS)
        .filter_map(|r| worker.status.board_row(r))
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&v| Span::styled(format!("{v:^3}"), Theme::header().fg(cfg.cell_color(v))))
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();

    Paragraph::new(lines).block(panel(title))
}

pub fn actions<'a>(view: &'a MonitorView, cfg: &'a RenderConfig) -> Table<'a> {
    let Some(worker) = view.focused() else {
        return Table::new(Vec::<Row>::new(), [Constraint::Min(1)])
            .block(panel(format!("Worker {} Actions", view.focus)));
    };
    let s = &worker.status;

    let max_weight = s
        .active_actions()
        .map(|(_, weight, _, _)| weight)
        .fold(0.0, f64::max);
    let scale = if max_weight > 0.0 { max_weight } else { 1.0 };

    let header =
        Row::new(vec!["Band", "Action", "Weight", "Prob", "AR", "Delta"]).style(Theme::header());

    let rows = s.active_actions().map(|(slot, weight, accept, delta)| {
        let band = cfg.band(slot);
        let style = band.map_or_else(Theme::text, |b| Theme::text().fg(b.color));
        Row::new(vec![
            Cell::from(Span::styled(band.map_or("", |b| b.name), style)),
            Cell::from(Span::styled(cfg.action_name(slot).to_string(), style)),
            Cell::from(Span::styled(weight_bar(weight / scale, BAR_WIDTH), style)),
            Cell::from(percent(weight)),
            Cell::from(percent(accept)),
            Cell::from(format!("{delta:.2}")),
        ])
    });

    let title = format!(
        "Worker {} Probabilities & Physics  |  trial {}  seed {}  reheat {:.2}  now {}/s",
        s.id,
        s.trial_number,
        s.seed,
        s.reheat_factor,
        thousands(worker.instant_rate.round() as i64)
    );

    Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(15),
            Constraint::Length(BAR_WIDTH as u16 + 1),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(panel(title))
}

pub fn logs<'a>(view: &'a MonitorView, height: u16) -> Paragraph<'a> {
    let visible = usize::from(height.saturating_sub(2));
    let skip = view.logs.len().saturating_sub(visible);

    let lines = view.logs[skip..]
        .iter()
        .map(|l| {
            Line::from(vec![
                Span::styled(format!("[{}] ", l.level), Theme::level(l.level)),
                Span::raw(l.message.as_str()),
            ])
        })
        .collect::<Vec<_>>();

    Paragraph::new(lines)
        .block(panel("Events"))
        .wrap(Wrap { trim: true })
}

pub fn not_running<'a>(view: &'a MonitorView) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(Span::styled("Solver is not running", Theme::warn())),
        Line::from(Span::styled(
            format!("waiting for region '{}'", view.shm_name),
            Theme::muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(panel("Workers"))
}

pub fn error_panel(message: &str) -> Paragraph<'_> {
    Paragraph::new(vec![
        Line::from(Span::styled("Read error", Theme::error())),
        Line::from(Span::raw(message)),
    ])
    .alignment(Alignment::Center)
    .block(panel("Workers"))
    .wrap(Wrap { trim: true })
}

/// Horizontal bar of `value` in `[0, 1]` scaled to `width` cells.
///
/// Full blocks for the integer part, a half block when the remainder is
/// above one half, padded with spaces to `width`.
pub fn weight_bar(value: f64, width: usize) -> String {
    let scaled = value.clamp(0.0, 1.0) * width as f64;
    let full = scaled.floor() as usize;

    let mut bar = "█".repeat(full);
    if scaled - full as f64 > 0.5 {
        bar.push('▌');
    }

    let pad = width.saturating_sub(bar.chars().count());
    bar.extend(std::iter::repeat(' ').take(pad));
    bar
}

/// `n` with `,` thousands separators.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn is_focused(view: &MonitorView, w: &WorkerRow) -> bool {
    usize::try_from(w.status.id).is_ok_and(|id| id == view.focus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(weight_bar(1.0, 4), "████");
        assert_eq!(weight_bar(0.0, 4), "    ");
        assert_eq!(weight_bar(0.5, 4), "██  ");
    }

    #[test]
    fn bar_adds_half_block_above_half_remainder() {
        assert_eq!(weight_bar(0.65, 4), "██▌ ");
        assert_eq!(weight_bar(0.6, 4), "██  ");
    }

    #[test]
    fn bar_is_clamped() {
        assert_eq!(weight_bar(3.0, 2), "██");
        assert_eq!(weight_bar(-1.0, 2), "  ");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(-1234567), "-1,234,567");
        assert_eq!(thousands(i64::MIN), "-9,223,372,036,854,775,808");
    }
}
