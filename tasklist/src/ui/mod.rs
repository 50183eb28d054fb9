//! Terminal UI rendering.

pub mod input;
pub mod status_bar;
pub mod task_list;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::App;

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Length(1), // Filter tabs
            Constraint::Min(3),    // Tasks
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    input::render(frame, chunks[0], app);
    task_list::render_tabs(frame, chunks[1], app);
    task_list::render(frame, chunks[2], app);
    status_bar::render(frame, chunks[3], app);
}
