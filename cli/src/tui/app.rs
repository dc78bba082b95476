use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use todos_core::Filter;

use crate::dispatch::Settled;
use crate::state::{Entry, LocalId, Phase, Request, TodoState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Adding,
    Editing(LocalId),
}

pub struct App {
    pub todos: TodoState,
    pub state: TableState,
    pub input: String,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> App {
        App {
            todos: TodoState::new(),
            state: TableState::default(),
            input: String::new(),
            input_mode: InputMode::Normal,
            cursor_position: 0,
            should_quit: false,
        }
    }

    pub fn start(&mut self) -> Request {
        self.todos.begin_load()
    }

    /// Maps a key press to an action, returning the request it produced.
    pub fn on_key(&mut self, key: KeyEvent) -> Option<Request> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.next();
                    None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.previous();
                    None
                }
                KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
                KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
                KeyCode::Char('c') => self.todos.clear_completed(),
                KeyCode::Char('a') => {
                    self.enter_add_mode();
                    None
                }
                KeyCode::Char('e') => {
                    self.enter_edit_mode();
                    None
                }
                KeyCode::Tab => {
                    self.set_filter(self.todos.filter().next());
                    None
                }
                KeyCode::Char('1') => {
                    self.set_filter(Filter::All);
                    None
                }
                KeyCode::Char('2') => {
                    self.set_filter(Filter::Active);
                    None
                }
                KeyCode::Char('3') => {
                    self.set_filter(Filter::Completed);
                    None
                }
                KeyCode::Char('x') => {
                    self.todos.dismiss_error();
                    None
                }
                _ => None,
            },
            InputMode::Adding | InputMode::Editing(_) => match key.code {
                KeyCode::Enter => self.submit(),
                KeyCode::Esc => {
                    self.exit_input_mode();
                    None
                }
                KeyCode::Char(c) => {
                    self.input_char(c);
                    None
                }
                KeyCode::Backspace => {
                    self.delete_char();
                    None
                }
                KeyCode::Left => {
                    self.move_cursor_left();
                    None
                }
                KeyCode::Right => {
                    self.move_cursor_right();
                    None
                }
                _ => None,
            },
        }
    }

    pub fn settle(&mut self, settled: Settled) -> Phase {
        let phase = self.todos.settle(settled.ticket, settled.reply);
        self.clamp_selection();
        phase
    }

    pub fn selected(&self) -> Option<&Entry> {
        let visible = self.todos.visible();
        self.state.selected().and_then(|i| visible.get(i).copied())
    }

    fn selected_id(&self) -> Option<LocalId> {
        self.selected().map(|e| e.id)
    }

    pub fn next(&mut self) {
        let len = self.todos.visible().len();
        if len == 0 {
            return;
        }

        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.todos.visible().len();
        if len == 0 {
            return;
        }

        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn toggle_selected(&mut self) -> Option<Request> {
        let id = self.selected_id()?;
        let request = self.todos.toggle(&id);
        self.clamp_selection();
        request
    }

    pub fn delete_selected(&mut self) -> Option<Request> {
        let id = self.selected_id()?;
        let request = self.todos.delete(&id);
        self.clamp_selection();
        request
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.todos.set_filter(filter);
        self.state.select(None);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.todos.visible().len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(selected);
    }

    pub fn enter_add_mode(&mut self) {
        self.input_mode = InputMode::Adding;
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Opens the editor prefilled with the selected todo's text.
    pub fn enter_edit_mode(&mut self) {
        let (id, text) = match self.selected() {
            Some(entry) if matches!(entry.id, LocalId::Stored(_)) => {
                (entry.id, entry.text.to_string())
            }
            _ => return,
        };
        self.input = text;
        self.cursor_position = self.input.chars().count();
        self.input_mode = InputMode::Editing(id);
    }

    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.byte_index(self.cursor_position);
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index = self.byte_index(self.cursor_position - 1);
            self.input.remove(byte_index);
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.input.chars().take(chars).map(char::len_utf8).sum()
    }

    /// Submits the popup. An edit that blanks the text deletes the todo.
    pub fn submit(&mut self) -> Option<Request> {
        let request = match self.input_mode {
            InputMode::Adding => {
                let request = self.todos.add(&self.input);
                if request.is_some() {
                    self.state.select(Some(0));
                }
                request
            }
            InputMode::Editing(id) if self.input.trim().is_empty() => self.todos.delete(&id),
            InputMode::Editing(id) => self.todos.edit(&id, &self.input),
            InputMode::Normal => None,
        };

        self.exit_input_mode();
        self.clamp_selection();
        request
    }
}
