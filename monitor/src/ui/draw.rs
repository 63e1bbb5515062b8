use ratatui::Frame;

use super::{layout, palette::RenderConfig, widgets};
use crate::state::model::{MonitorView, WriterState};

/// Draws the entire UI. A pure function of `view` and `cfg`.
pub fn draw(f: &mut Frame, view: &MonitorView, cfg: &RenderConfig) {
    let area = f.size();

    let (header_area, body_area, logs_area) = layout::vertical(area);
    f.render_widget(widgets::header(view), header_area);
    f.render_widget(widgets::logs(view, logs_area.height), logs_area);

    match &view.state {
        WriterState::NotRunning => f.render_widget(widgets::not_running(view), body_area),
        WriterState::ReadError(message) => f.render_widget(widgets::error_panel(message), body_area),
        WriterState::Live => {
            let (top_area, actions_area) = layout::body(body_area, view.workers.len());
            let (workers_area, board_area) = layout::top(top_area);

            f.render_widget(widgets::workers_table(view, cfg), workers_area);
            f.render_widget(widgets::board(view, cfg), board_area);
            f.render_widget(widgets::actions(view, cfg), actions_area);
        }
    }
}
