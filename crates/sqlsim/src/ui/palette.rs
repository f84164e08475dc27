//! Fuzzy command palette.
//!
//! Lists every app action, the predefined queries and the open tabs, and
//! narrows them with nucleo as the user types.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nucleo_matcher::{
    pattern::{CaseMatching, Normalization, Pattern},
    Config, Matcher, Utf32Str,
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::centered_rect;

/// Something the palette can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteAction {
    RunQuery,
    NewTab,
    CloseTab,
    ClearQuery,
    HistoryBack,
    HistoryForward,
    SaveQuery,
    CopySql,
    ToggleSidebar,
    ToggleChart,
    ExportCsv,
    ClearFilters,
    ClearSort,
    ResetColumns,
    Help,
    Quit,
    OpenPredefined(&'static str),
    OpenSaved(String),
    SwitchTab(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteItem {
    pub label: String,
    pub hint: &'static str,
    pub action: PaletteAction,
}

impl PaletteItem {
    pub fn new(label: impl Into<String>, hint: &'static str, action: PaletteAction) -> Self {
        Self {
            label: label.into(),
            hint,
            action,
        }
    }
}

/// The fixed actions, in display order.
pub fn builtin_items() -> Vec<PaletteItem> {
    use PaletteAction::*;
    vec![
        PaletteItem::new("Run query", "Ctrl+Enter", RunQuery),
        PaletteItem::new("New tab", "Ctrl+N", NewTab),
        PaletteItem::new("Close tab", "Ctrl+W", CloseTab),
        PaletteItem::new("Clear query and result", "Ctrl+L", ClearQuery),
        PaletteItem::new("History back", "Alt+Left", HistoryBack),
        PaletteItem::new("History forward", "Alt+Right", HistoryForward),
        PaletteItem::new("Save query", "Ctrl+S", SaveQuery),
        PaletteItem::new("Copy SQL", "Ctrl+Y", CopySql),
        PaletteItem::new("Toggle sidebar", "Ctrl+B", ToggleSidebar),
        PaletteItem::new("Toggle chart", "v", ToggleChart),
        PaletteItem::new("Export CSV", "e", ExportCsv),
        PaletteItem::new("Clear filters", "F", ClearFilters),
        PaletteItem::new("Clear sort", "", ClearSort),
        PaletteItem::new("Reset columns", "", ResetColumns),
        PaletteItem::new("Help", "F1", Help),
        PaletteItem::new("Quit", "Ctrl+Q", Quit),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteResult {
    Continue,
    Selected(PaletteAction),
    Cancelled,
}

struct Scored {
    index: usize,
    score: u32,
    indices: Vec<u32>,
}

pub struct CommandPalette {
    items: Vec<PaletteItem>,
    filtered: Vec<Scored>,
    query: String,
    selected: usize,
    matcher: Matcher,
    list_state: ListState,
}

impl CommandPalette {
    pub fn new(items: Vec<PaletteItem>) -> Self {
        let mut palette = Self {
            items,
            filtered: Vec::new(),
            query: String::new(),
            selected: 0,
            matcher: Matcher::new(Config::DEFAULT),
            list_state: ListState::default(),
        };
        palette.update_filtered();
        palette
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn selected_item(&self) -> Option<&PaletteItem> {
        self.filtered
            .get(self.selected)
            .and_then(|s| self.items.get(s.index))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PaletteResult {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                PaletteResult::Cancelled
            }
            (KeyCode::Enter, _) => match self.selected_item() {
                Some(item) => PaletteResult::Selected(item.action.clone()),
                None => PaletteResult::Cancelled,
            },
            (KeyCode::Up, _) | (KeyCode::Char('p'), KeyModifiers::CONTROL) => {
                self.selected = self.selected.saturating_sub(1);
                PaletteResult::Continue
            }
            (KeyCode::Down, _) | (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
                if self.selected + 1 < self.filtered.len() {
                    self.selected += 1;
                }
                PaletteResult::Continue
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.query.clear();
                self.update_filtered();
                PaletteResult::Continue
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.query.push(c);
                self.update_filtered();
                PaletteResult::Continue
            }
            (KeyCode::Backspace, _) => {
                if self.query.pop().is_some() {
                    self.update_filtered();
                }
                PaletteResult::Continue
            }
            _ => PaletteResult::Continue,
        }
    }

    fn update_filtered(&mut self) {
        if self.query.is_empty() {
            self.filtered = (0..self.items.len())
                .map(|index| Scored {
                    index,
                    score: 0,
                    indices: Vec::new(),
                })
                .collect();
        } else {
            let pattern = Pattern::parse(&self.query, CaseMatching::Ignore, Normalization::Smart);
            let mut buf = Vec::new();
            let mut matches: Vec<Scored> = Vec::new();
            for (index, item) in self.items.iter().enumerate() {
                let mut indices = Vec::new();
                let haystack = Utf32Str::new(&item.label, &mut buf);
                if let Some(score) = pattern.indices(haystack, &mut self.matcher, &mut indices) {
                    matches.push(Scored {
                        index,
                        score,
                        indices,
                    });
                }
            }
            // Stable, so equal scores keep list order.
            matches.sort_by(|a, b| b.score.cmp(&a.score));
            self.filtered = matches;
        }
        self.selected = 0;
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = (area.width * 60 / 100).clamp(40, 80);
        let height = (self.filtered.len() as u16 + 4).clamp(6, (area.height * 70 / 100).max(6));
        let popup = centered_rect(width, height, area);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Command Palette ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [input_area, list_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let input = Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(self.query.clone()),
            Span::styled(" ", Style::default().bg(Color::White)),
        ]);
        frame.render_widget(Paragraph::new(input), input_area);

        let hint_w = list_area.width as usize;
        let items: Vec<ListItem> = self
            .filtered
            .iter()
            .filter_map(|s| self.items.get(s.index).map(|item| (s, item)))
            .map(|(scored, item)| {
                let mut line = highlight_matches(&item.label, &scored.indices);
                let used = item.label.chars().count() + 2;
                if !item.hint.is_empty() && used + item.hint.len() < hint_w {
                    line.spans.push(Span::raw(" ".repeat(hint_w - used - item.hint.len())));
                    line.spans.push(Span::styled(
                        item.hint,
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(line)
            })
            .collect();

        self.list_state.select(if self.filtered.is_empty() {
            None
        } else {
            Some(self.selected)
        });
        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, list_area, &mut self.list_state);

        let status = format!(
            " {}/{} ",
            if self.filtered.is_empty() { 0 } else { self.selected + 1 },
            self.filtered.len()
        );
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
            status_area,
        );
    }
}

fn highlight_matches(text: &str, indices: &[u32]) -> Line<'static> {
    let matched = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut spans: Vec<Span> = Vec::new();
    let mut current = String::new();
    let mut current_is_match = false;

    for (i, c) in text.chars().enumerate() {
        let is_match = indices.contains(&(i as u32));
        if is_match != current_is_match && !current.is_empty() {
            let style = if current_is_match { matched } else { Style::default() };
            spans.push(Span::styled(std::mem::take(&mut current), style));
        }
        current.push(c);
        current_is_match = is_match;
    }
    if !current.is_empty() {
        let style = if current_is_match { matched } else { Style::default() };
        spans.push(Span::styled(current, style));
    }

    Line::from(spans)
}
