use ratatui::layout::{Constraint, Direction, Layout, Rect};

use shm_bridge::layout::{ACTIVE_ACTIONS, BOARD_COLS, BOARD_ROWS};

/// Width of one board cell in columns.
pub const CELL_WIDTH: u16 = 3;

/// Computes the main layout regions.
///
/// # Returns
/// (header, body, logs)
pub fn vertical(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(10), Constraint::Length(7)])
        .split(area);

    (chunks[0], chunks[1], chunks[2])
}

/// Splits body into (top, actions). The top holds the table and board.
pub fn body(area: Rect, worker_rows: usize) -> (Rect, Rect) {
    let board_height = BOARD_ROWS as u16 + 2;
    let table_height = worker_rows as u16 + 3;
    let actions_height = ACTIVE_ACTIONS as u16 + 3;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(table_height.max(board_height)),
            Constraint::Min(actions_height.min(area.height / 2)),
        ])
        .split(area);

    (rows[0], rows[1])
}

/// Splits top into (workers, board).
pub fn top(area: Rect) -> (Rect, Rect) {
    let board_width = BOARD_COLS as u16 * CELL_WIDTH + 2;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(board_width)])
        .split(area);

    (cols[0], cols[1])
}
