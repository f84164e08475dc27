use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use tui_textarea::{CursorMove, Input, TextArea};

fn fresh_textarea(lines: Vec<String>) -> TextArea<'static> {
    let mut textarea = TextArea::new(lines);
    textarea.set_cursor_line_style(Style::default().add_modifier(Modifier::UNDERLINED));
    textarea
}

/// What a single-line prompt collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// `:` command line.
    Command,
    /// Filter text for a result column.
    Filter { column_id: String },
    /// Search box of the sidebar.
    SidebarSearch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    Continue,
    Submit(String),
    Cancel,
}

/// A one-line input shown as a bottom overlay.
pub struct LinePrompt {
    pub kind: Option<PromptKind>,
    pub textarea: TextArea<'static>,
}

impl LinePrompt {
    pub fn new() -> Self {
        Self {
            kind: None,
            textarea: fresh_textarea(vec![String::new()]),
        }
    }

    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }

    pub fn open(&mut self, kind: PromptKind, initial: &str) {
        self.kind = Some(kind);
        self.textarea = fresh_textarea(vec![initial.to_string()]);
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn close(&mut self) {
        self.kind = None;
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("")
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            Some(PromptKind::Command) => ": Command (Enter run, Esc cancel)",
            Some(PromptKind::Filter { .. }) => "Filter column (empty clears, Esc cancel)",
            Some(PromptKind::SidebarSearch) => "Search queries (Enter apply, Esc cancel)",
            None => "",
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => PromptAction::Cancel,
            (KeyCode::Enter, _) => PromptAction::Submit(self.text()),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.textarea = fresh_textarea(vec![String::new()]);
                PromptAction::Continue
            }
            _ => {
                let input: Input = key.into();
                self.textarea.input(input);
                PromptAction::Continue
            }
        }
    }
}

impl Default for LinePrompt {
    fn default() -> Self {
        Self::new()
    }
}

/// Editor for the active tab's query text.
pub struct QueryEditor {
    pub textarea: TextArea<'static>,
    /// Tab whose text is loaded.
    tab_id: Option<String>,
}

impl QueryEditor {
    pub fn new() -> Self {
        Self {
            textarea: fresh_textarea(vec![String::new()]),
            tab_id: None,
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn tab_id(&self) -> Option<&str> {
        self.tab_id.as_deref()
    }

    pub fn set_text(&mut self, s: &str) {
        let lines: Vec<String> = if s.is_empty() {
            vec![String::new()]
        } else {
            s.split('\n').map(|l| l.to_string()).collect()
        };
        self.textarea = fresh_textarea(lines);
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
    }

    /// Load a tab's text, keeping cursor and undo state when it is already
    /// loaded with the same text.
    pub fn sync(&mut self, tab_id: Option<&str>, text: &str) {
        if self.tab_id.as_deref() == tab_id && self.text() == text {
            return;
        }
        self.tab_id = tab_id.map(str::to_string);
        self.set_text(text);
    }

    /// Feed a key to the textarea. Returns true when the text changed.
    pub fn input(&mut self, key: KeyEvent) -> bool {
        let input: Input = key.into();
        self.textarea.input(input)
    }
}

impl Default for QueryEditor {
    fn default() -> Self {
        Self::new()
    }
}
