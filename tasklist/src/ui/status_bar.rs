//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, Focus};
use crate::store::Phase;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.focus {
        Focus::Input => "Enter: add | Ctrl-P: priority | Tab: list | F1-F3: filter | Esc: quit",
        Focus::List => {
            "Space: toggle | d: delete | ↑↓/jk: move | 1-3: filter | Ctrl-R: refresh | Esc: quit"
        }
    };

    let (dot_color, phase_text) = match app.phase {
        Phase::Loading => (theme::WARNING, "Loading"),
        Phase::Ready => (theme::SUCCESS, "Ready"),
    };

    let active = app.counts().active;
    let left = if active == 1 { "item" } else { "items" };

    let mut spans = vec![
        Span::styled("tasklist", theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {phase_text} ({})", app.backend)),
        Span::raw(format!(" | {active} {left} left | ")),
    ];
    match &app.status {
        Some(err) => spans.push(Span::styled(err.as_str(), theme::normal().fg(theme::ERROR))),
        None => spans.push(Span::styled(help_text, theme::dimmed())),
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
