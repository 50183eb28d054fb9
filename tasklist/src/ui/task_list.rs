//! Filter tabs and the task list.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
};

use tasklist_proto::task::{Filter, Task};

use super::theme;
use crate::app::{App, Focus};
use crate::store::Phase;

/// Render the filter tabs with per-filter counts.
pub fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let counts = app.counts();
    let titles: Vec<Line> = Filter::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| Line::from(format!("F{} {} ({})", i + 1, f, counts.for_filter(*f))))
        .collect();
    let selected = Filter::ALL
        .iter()
        .position(|f| *f == app.filter)
        .unwrap_or_default();

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(theme::dimmed())
        .highlight_style(theme::highlighted())
        .divider("|");
    frame.render_widget(tabs, area);
}

/// Render the filtered task list.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == Focus::List;

    let block = Block::default()
        .title(Span::styled("Tasks", theme::panel_title(theme::TASKS_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused));

    let visible = app.visible_tasks();
    if visible.is_empty() {
        let placeholder = match app.phase {
            Phase::Loading => "Loading tasks…",
            Phase::Ready if app.tasks.is_empty() => "Nothing to do yet",
            Phase::Ready => "No tasks in this view",
        };
        let paragraph = Paragraph::new(Span::styled(placeholder, theme::dimmed())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = visible.into_iter().map(task_item).collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(if is_focused {
            theme::selected()
        } else {
            theme::highlighted()
        });

    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn task_item(task: &Task) -> ListItem<'_> {
    let checkbox = if task.done { "[✓]" } else { "[ ]" };
    let text_style = if task.done {
        theme::done_task()
    } else {
        theme::normal()
    };

    let line = Line::from(vec![
        Span::styled(checkbox, theme::normal()),
        Span::raw(" "),
        Span::styled("●", theme::priority_badge(task.priority)),
        Span::raw(" "),
        Span::styled(task.text.as_str(), text_style),
    ]);

    ListItem::new(line)
}
