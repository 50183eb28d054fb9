//! New-task input box.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::{App, Focus};

/// Render the input line with the pending priority in the title.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == Focus::Input;

    let input_line = if app.input.is_empty() && !is_focused {
        Line::from(Span::styled("What needs to be done?", theme::dimmed()))
    } else if is_focused {
        let split = app
            .input
            .char_indices()
            .nth(app.cursor_position)
            .map_or(app.input.len(), |(i, _)| i);
        let (before, after) = app.input.split_at(split);
        Line::from(vec![
            Span::styled(before, theme::normal()),
            Span::styled("█", theme::bold()),
            Span::styled(after, theme::normal()),
        ])
    } else {
        Line::from(Span::styled(app.input.as_str(), theme::normal()))
    };

    let title = Line::from(vec![
        Span::raw("New task "),
        Span::styled(format!("[{}]", app.priority), theme::priority_badge(app.priority)),
    ]);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused));

    frame.render_widget(Paragraph::new(input_line).block(block), area);
}
