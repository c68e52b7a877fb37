//! Task screen state and event handling.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use taskdesk_proto::task::{TaskId, TaskRecord};

use crate::api::ErrorCategory;
use crate::config::UiOptions;
use crate::notify::Notice;
use crate::tasks::{RestoredInput, SyncOutcome, TaskDraft, TaskError, TaskFilter, TaskStats};

/// How long a notice stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

/// What the input line is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Typing a new task (default).
    Add,
    /// Editing an existing task.
    Edit(TaskId),
    /// Typing a search query; the list filters as you type.
    Search,
}

/// Which part of the screen has the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Input line is focused (default).
    Input,
    /// Task list is focused.
    List,
}

/// A task operation requested by the user, to be run in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a task.
    Add(TaskDraft),
    /// Replace a task's fields.
    Edit(TaskId, TaskDraft),
    /// Delete a task.
    Delete(TaskId),
    /// Flip a task between pending and completed.
    Toggle(TaskId),
    /// Complete every pending task.
    CompleteAll,
    /// Delete every completed task.
    ClearCompleted,
    /// Reload the list from the server.
    Refresh,
}

/// Task screen state.
pub struct App {
    /// Current text input.
    pub input: String,
    /// Cursor position in input (character index).
    pub cursor_position: usize,
    /// What the input line is for.
    pub mode: InputMode,
    /// Which part of the screen is focused.
    pub focus: Focus,
    /// Selected row among the visible tasks.
    pub selected: usize,
    /// Active filter.
    pub filter: TaskFilter,
    /// Notice on screen and when it was shown.
    pub toast: Option<(Notice, Instant)>,
    /// Task awaiting delete confirmation.
    pub confirm_delete: Option<TaskId>,
    /// Display options.
    pub ui: UiOptions,
    /// The backend rejected the session.
    pub session_expired: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create the screen state.
    #[must_use]
    pub fn new(ui: UiOptions) -> Self {
        let filter = TaskFilter {
            date_field: ui.filter_date_field,
            ..TaskFilter::default()
        };
        Self {
            input: String::new(),
            cursor_position: 0,
            mode: InputMode::Add,
            focus: Focus::Input,
            selected: 0,
            filter,
            toast: None,
            confirm_delete: None,
            ui,
            session_expired: false,
            should_quit: false,
        }
    }

    /// Records that pass the filter, in list order.
    #[must_use]
    pub fn visible<'a>(&self, records: &'a [TaskRecord]) -> Vec<&'a TaskRecord> {
        self.filter.apply(records)
    }

    /// Counts over the whole list, ignoring the filter.
    #[must_use]
    pub fn stats(records: &[TaskRecord]) -> TaskStats {
        TaskStats::from_records(records)
    }

    /// The selected record, if the visible list is not empty.
    #[must_use]
    pub fn selected_record<'a>(&self, records: &'a [TaskRecord]) -> Option<&'a TaskRecord> {
        self.visible(records).get(self.selected).copied()
    }

    /// Handle a key event. Returns the operation to run, if any.
    pub fn handle_key_event(&mut self, key: KeyEvent, records: &[TaskRecord]) -> Option<Action> {
        if let Some(id) = self.confirm_delete.take() {
            return matches!(key.code, KeyCode::Char('y' | 'Y')).then_some(Action::Delete(id));
        }

        // Global shortcuts
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return None;
            }
            (KeyCode::Esc, _) => {
                if self.mode == InputMode::Add {
                    self.should_quit = true;
                } else {
                    self.reset_input();
                }
                return None;
            }
            (KeyCode::Tab | KeyCode::BackTab, _) => {
                self.focus = match self.focus {
                    Focus::Input => Focus::List,
                    Focus::List => Focus::Input,
                };
                return None;
            }
            _ => {}
        }

        let action = match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::List => self.handle_list_key(key, records),
        };
        self.clamp_selection(records);
        action
    }

    /// Handle key event when input is focused.
    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Action> {
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
        if self.mode == InputMode::Search {
            self.filter.search.clone_from(&self.input);
            self.selected = 0;
        }
        None
    }

    /// Handle key event when the list is focused.
    fn handle_list_key(&mut self, key: KeyEvent, records: &[TaskRecord]) -> Option<Action> {
        let selected = self.selected_record(records).map(|r| r.id.clone());
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => self.selected += 1,
            KeyCode::Enter | KeyCode::Char(' ') => return selected.map(Action::Toggle),
            KeyCode::Char('d') | KeyCode::Delete => self.confirm_delete = selected,
            KeyCode::Char('e') => {
                if let Some(record) = self.selected_record(records) {
                    let line = TaskDraft::from_record(record).to_inline();
                    self.mode = InputMode::Edit(record.id.clone());
                    self.set_input(line);
                    self.focus = Focus::Input;
                }
            }
            KeyCode::Char('/') => {
                self.mode = InputMode::Search;
                let query = self.filter.search.clone();
                self.set_input(query);
                self.focus = Focus::Input;
            }
            KeyCode::Char('n' | 'i') => {
                self.reset_input();
                self.focus = Focus::Input;
            }
            KeyCode::Char('f') => {
                self.filter.status = self.filter.status.next();
                self.selected = 0;
            }
            KeyCode::Char('p') => {
                self.filter.cycle_priority();
                self.selected = 0;
            }
            KeyCode::Char('x') => {
                self.filter = TaskFilter {
                    date_field: self.ui.filter_date_field,
                    ..TaskFilter::default()
                };
            }
            KeyCode::Char('a') => return Some(Action::CompleteAll),
            KeyCode::Char('c') => return Some(Action::ClearCompleted),
            KeyCode::Char('r') => return Some(Action::Refresh),
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
        None
    }

    /// Submit the input line according to the mode.
    fn submit(&mut self) -> Option<Action> {
        match self.mode.clone() {
            InputMode::Add => {
                if self.input.trim().is_empty() {
                    return None;
                }
                let draft = TaskDraft::parse_inline(&self.input);
                self.reset_input();
                Some(Action::Add(draft))
            }
            InputMode::Edit(id) => {
                let draft = TaskDraft::parse_inline(&self.input);
                self.reset_input();
                self.focus = Focus::List;
                Some(Action::Edit(id, draft))
            }
            InputMode::Search => {
                self.mode = InputMode::Add;
                self.input.clear();
                self.cursor_position = 0;
                self.focus = Focus::List;
                None
            }
        }
    }

    /// Reflect the result of a background operation.
    ///
    /// A rolled-back add or edit puts its input back when the line is free,
    /// in the mode it was typed in.
    pub fn apply_result(&mut self, result: Result<SyncOutcome, TaskError>) {
        match result {
            Ok(SyncOutcome::RolledBack {
                restored_input: Some(restored),
                ..
            }) if self.input.is_empty() && self.mode == InputMode::Add => {
                let (mode, text) = match restored {
                    RestoredInput::Add(text) => (InputMode::Add, text),
                    RestoredInput::Edit(id, text) => (InputMode::Edit(id), text),
                };
                self.mode = mode;
                self.set_input(text);
                self.focus = Focus::Input;
            }
            Ok(SyncOutcome::SessionExpired) => {
                self.session_expired = true;
                self.should_quit = true;
            }
            // These never reach the notice channel.
            Err(
                e @ (TaskError::PendingSync(_) | TaskError::TaskNotFound(_) | TaskError::Store(_)),
            ) => {
                self.push_notice(Notice::error(ErrorCategory::Validation, e.to_string()));
            }
            Ok(_) | Err(_) => {}
        }
    }

    /// Show a notice.
    pub fn push_notice(&mut self, notice: Notice) {
        self.toast = Some((notice, Instant::now()));
    }

    /// Drop the notice once it has been shown long enough.
    pub fn tick(&mut self, now: Instant) {
        if let Some((_, shown)) = &self.toast
            && now.duration_since(*shown) >= TOAST_TTL
        {
            self.toast = None;
        }
    }

    /// Keep the selection inside the visible list.
    pub fn clamp_selection(&mut self, records: &[TaskRecord]) {
        let len = self.visible(records).len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn set_input(&mut self, text: String) {
        self.cursor_position = text.chars().count();
        self.input = text;
    }

    fn reset_input(&mut self) {
        if self.mode == InputMode::Search {
            self.filter.search.clear();
        }
        self.mode = InputMode::Add;
        self.input.clear();
        self.cursor_position = 0;
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.input.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor position.
    fn enter_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor.
    fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let at = self.byte_index();
            self.input.remove(at);
        }
    }

    const fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }
}
