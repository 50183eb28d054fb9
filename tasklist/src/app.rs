//! Application state and event handling.
//!
//! [`App`] is pure UI state. It never talks to the repository: key handling
//! returns a [`SyncCommand`] for the main loop to forward, and results come
//! back through [`App::apply_event`].

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use tasklist_proto::task::{Filter, Priority, Task, TaskId};

use crate::repository::RepositoryKind;
use crate::store::{Phase, TaskCounts, count_tasks, filter_tasks};
use crate::sync::{SyncCommand, SyncEvent};

/// Which area has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// New-task input line (default).
    Input,
    /// Task list.
    List,
}

/// Main application state.
pub struct App {
    /// Current text input.
    pub input: String,
    /// Cursor position in input (character index).
    pub cursor_position: usize,
    /// Priority for the next submitted task.
    pub priority: Priority,
    /// Priority restored after each submit.
    pub default_priority: Priority,
    /// Active list filter.
    pub filter: Filter,
    /// Selected row within the filtered list.
    pub selected: usize,
    /// Which area is focused.
    pub focus: Focus,
    /// Latest list value received from the sync worker.
    pub tasks: Arc<[Task]>,
    /// Store phase as last reported.
    pub phase: Phase,
    /// Last failure, cleared by the next successful change.
    pub status: Option<String>,
    /// Which repository backs the store.
    pub backend: RepositoryKind,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create an empty app waiting for its first list.
    #[must_use]
    pub fn new(backend: RepositoryKind) -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            priority: Priority::default(),
            default_priority: Priority::default(),
            filter: Filter::default(),
            selected: 0,
            focus: Focus::Input,
            tasks: Arc::from(Vec::new()),
            phase: Phase::Loading,
            status: None,
            backend,
            should_quit: false,
        }
    }

    /// Set the priority preselected for new tasks.
    #[must_use]
    pub const fn with_default_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self.default_priority = priority;
        self
    }

    /// Set the view shown at startup.
    #[must_use]
    pub const fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Tasks visible under the active filter.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<&Task> {
        filter_tasks(&self.tasks, self.filter)
    }

    /// Per-filter counts of the current list.
    #[must_use]
    pub fn counts(&self) -> TaskCounts {
        count_tasks(&self.tasks)
    }

    /// The task under the selection cursor, if any.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected).copied()
    }

    /// Handle a key event.
    ///
    /// Returns the command to forward to the sync worker, if the key maps
    /// to a store operation.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        // Global shortcuts
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                self.should_quit = true;
                return None;
            }
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => return Some(SyncCommand::Refresh),
            (KeyCode::Tab | KeyCode::BackTab, _) => {
                self.toggle_focus();
                return None;
            }
            (KeyCode::F(n @ 1..=3), _) => {
                self.select_filter_number(n);
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::List => self.handle_list_key(key),
        }
    }

    /// Apply an event from the sync worker.
    pub fn apply_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Loaded(tasks) => {
                self.phase = Phase::Ready;
                self.replace_tasks(tasks);
                self.status = None;
            }
            SyncEvent::ListChanged(tasks) => {
                self.replace_tasks(tasks);
                self.status = None;
            }
            SyncEvent::Failed { op, message } => {
                self.status = Some(format!("{op} failed: {message}"));
            }
        }
    }

    /// Record a problem that never reached the worker.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('p') {
                self.priority = self.priority.next();
            }
            return None;
        }

        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Char(c) => self.enter_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.input.chars().count(),
            _ => {}
        }
        None
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                return self.selected_id().map(|id| SyncCommand::Toggle { id });
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                return self.selected_id().map(|id| SyncCommand::Delete { id });
            }
            KeyCode::Char(c @ '1'..='3') => {
                if let Some(n) = c.to_digit(10).and_then(|d| u8::try_from(d).ok()) {
                    self.select_filter_number(n);
                }
            }
            _ => {}
        }
        None
    }

    /// Whitespace-only input is refused without a command.
    fn submit(&mut self) -> Option<SyncCommand> {
        if self.input.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor_position = 0;
        let priority = std::mem::replace(&mut self.priority, self.default_priority);
        Some(SyncCommand::Add {
            text,
            priority: Some(priority),
        })
    }

    const fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::List,
            Focus::List => Focus::Input,
        };
    }

    fn select_filter_number(&mut self, n: u8) {
        let Some(filter) = Filter::ALL.get(usize::from(n).wrapping_sub(1)) else {
            return;
        };
        if *filter != self.filter {
            self.filter = *filter;
            self.selected = 0;
        }
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.selected_task().map(|t| t.id)
    }

    /// Swap in a new list, keeping the cursor on the same task when it
    /// survives.
    fn replace_tasks(&mut self, tasks: Arc<[Task]>) {
        let kept = self.selected_id();
        self.tasks = tasks;
        let visible = filter_tasks(&self.tasks, self.filter);
        let selected = kept
            .and_then(|id| visible.iter().position(|t| t.id == id))
            .unwrap_or_else(|| self.selected.min(visible.len().saturating_sub(1)));
        self.selected = selected;
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn enter_char(&mut self, c: char) {
        let index = self.byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index();
            self.input.remove(index);
        }
    }

    const fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    const fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.visible_tasks().len() {
            self.selected += 1;
        }
    }
}
