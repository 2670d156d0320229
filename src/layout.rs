use ratatui::layout::{Constraint, Layout, Rect};

/// Vertical split shared by every page: the canvas on top, two rows of
/// status bar below.
pub fn canvas_and_statusbar(area: Rect) -> (Rect, Rect) {
    let [canvas, statusbar] =
        Layout::vertical([Constraint::Min(5), Constraint::Length(2)]).areas(area);
    (canvas, statusbar)
}
