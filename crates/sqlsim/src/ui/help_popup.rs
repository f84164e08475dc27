//! Scrollable key binding reference.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use super::centered_rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpAction {
    Continue,
    Close,
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

impl KeyBinding {
    pub const fn new(keys: &'static str, description: &'static str) -> Self {
        Self { keys, description }
    }
}

#[derive(Debug, Clone)]
pub struct HelpSection {
    pub title: &'static str,
    pub bindings: &'static [KeyBinding],
}

impl HelpSection {
    pub const fn new(title: &'static str, bindings: &'static [KeyBinding]) -> Self {
        Self { title, bindings }
    }

    /// Title, rule, bindings.
    fn line_count(&self) -> usize {
        2 + self.bindings.len()
    }
}

const GLOBAL: HelpSection = HelpSection::new(
    "Global",
    &[
        KeyBinding::new("Ctrl-Enter / F5", "Run the active tab's query"),
        KeyBinding::new("Ctrl-n", "New tab"),
        KeyBinding::new("Ctrl-w", "Close tab"),
        KeyBinding::new("Alt-1..9", "Switch to tab N"),
        KeyBinding::new("Ctrl-l", "Clear query and result"),
        KeyBinding::new("Alt-Left/Right", "Query history back/forward"),
        KeyBinding::new("Ctrl-s", "Save query"),
        KeyBinding::new("Ctrl-y", "Copy SQL to clipboard"),
        KeyBinding::new("Ctrl-p", "Command palette"),
        KeyBinding::new("Ctrl-b", "Toggle sidebar"),
        KeyBinding::new("Tab / Shift-Tab", "Cycle focus (sidebar, editor, results)"),
        KeyBinding::new("F1", "Toggle this help"),
        KeyBinding::new("Ctrl-q", "Quit"),
    ],
);

const EDITOR: HelpSection = HelpSection::new(
    "Query Editor",
    &[
        KeyBinding::new("Esc", "Move focus to the results"),
        KeyBinding::new("Ctrl-z / Ctrl-r", "Undo / redo"),
    ],
);

const SIDEBAR: HelpSection = HelpSection::new(
    "Sidebar",
    &[
        KeyBinding::new("j/k", "Move selection"),
        KeyBinding::new("Enter", "Open query in a new tab"),
        KeyBinding::new("/", "Search predefined queries"),
        KeyBinding::new("d", "Delete saved query"),
        KeyBinding::new("Esc", "Back to the editor"),
    ],
);

const GRID: HelpSection = HelpSection::new(
    "Results",
    &[
        KeyBinding::new("j/k", "Move down/up one row"),
        KeyBinding::new("h/l", "Move left/right one column"),
        KeyBinding::new("g / G", "First/last row"),
        KeyBinding::new("PgUp/PgDn", "Page up/down"),
        KeyBinding::new("s", "Sort by column (cycles)"),
        KeyBinding::new("f", "Filter column"),
        KeyBinding::new("F", "Clear all filters"),
        KeyBinding::new("c", "Choose visible columns"),
        KeyBinding::new("v", "Toggle table/chart"),
        KeyBinding::new("e", "Export CSV to the default path"),
        KeyBinding::new("y", "Copy cell"),
        KeyBinding::new("i / Enter", "Back to the editor"),
        KeyBinding::new(":", "Command prompt"),
        KeyBinding::new("?", "Toggle this help"),
    ],
);

const COMMANDS: HelpSection = HelpSection::new(
    "Commands",
    &[
        KeyBinding::new(":export [path]", "Export visible rows as CSV"),
        KeyBinding::new(":rename <title>", "Rename the active tab"),
        KeyBinding::new(":save", "Save the active query"),
        KeyBinding::new(":q / :quit", "Quit"),
    ],
);

const ALL_SECTIONS: &[HelpSection] = &[GLOBAL, EDITOR, SIDEBAR, GRID, COMMANDS];

const KEY_COLUMN_WIDTH: usize = 20;

pub struct HelpPopup {
    sections: &'static [HelpSection],
    scroll_offset: usize,
    total_lines: usize,
    /// Updated on every render.
    visible_height: usize,
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpPopup {
    pub fn new() -> Self {
        Self::with_sections(ALL_SECTIONS)
    }

    fn with_sections(sections: &'static [HelpSection]) -> Self {
        // One blank line between sections.
        let total_lines = sections.iter().map(HelpSection::line_count).sum::<usize>()
            + sections.len().saturating_sub(1);
        Self {
            sections,
            scroll_offset: 0,
            total_lines,
            visible_height: 0,
        }
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.visible_height)
    }

    fn scroll_by(&mut self, delta: isize) {
        let next = self.scroll_offset.saturating_add_signed(delta);
        self.scroll_offset = next.min(self.max_scroll());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> HelpAction {
        let half = (self.visible_height / 2) as isize;
        let page = self.visible_height.saturating_sub(2) as isize;

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _)
            | (KeyCode::F(1), _)
            | (KeyCode::Char('q'), _)
            | (KeyCode::Char('?'), _) => return HelpAction::Close,
            (KeyCode::Char('j'), _) | (KeyCode::Down, _) => self.scroll_by(1),
            (KeyCode::Char('k'), _) | (KeyCode::Up, _) => self.scroll_by(-1),
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => self.scroll_by(half),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.scroll_by(-half),
            (KeyCode::PageDown, _) => self.scroll_by(page),
            (KeyCode::PageUp, _) => self.scroll_by(-page),
            (KeyCode::Char('g'), _) | (KeyCode::Home, _) => self.scroll_offset = 0,
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => self.scroll_offset = self.max_scroll(),
            _ => {}
        }
        HelpAction::Continue
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = (area.width * 80 / 100).clamp(60, 100);
        let height = (area.height * 85 / 100).clamp(20, 50);
        let popup = centered_rect(width, height, area);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Help ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [header, rule, content, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(header_line()), header);
        frame.render_widget(
            Paragraph::new("─".repeat(rule.width as usize))
                .style(Style::default().fg(Color::DarkGray)),
            rule,
        );

        self.visible_height = content.height as usize;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());

        let lines: Vec<Line> = self
            .lines(content.width as usize)
            .into_iter()
            .skip(self.scroll_offset)
            .take(content.height as usize)
            .collect();
        frame.render_widget(Paragraph::new(lines), content);

        frame.render_widget(Paragraph::new(self.footer_line(footer.width)), footer);

        if self.total_lines > self.visible_height {
            let mut state = ScrollbarState::new(self.max_scroll()).position(self.scroll_offset);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("▲"))
                    .end_symbol(Some("▼"))
                    .track_symbol(Some("│"))
                    .thumb_symbol("█"),
                content,
                &mut state,
            );
        }
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(self.total_lines);
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                format!(" {} ", section.title),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "─".repeat(width),
                Style::default().fg(Color::DarkGray),
            )));
            lines.extend(section.bindings.iter().map(binding_line));
        }
        lines
    }

    fn footer_line(&self, width: u16) -> Line<'static> {
        let position = if self.total_lines > self.visible_height {
            let seen = (self.scroll_offset + self.visible_height) * 100 / self.total_lines.max(1);
            format!("{}%", seen.min(100))
        } else {
            "All".to_string()
        };
        let key = Style::default().fg(Color::Yellow);
        let dim = Style::default().fg(Color::DarkGray);
        Line::from(vec![
            Span::styled(" j/k ", key),
            Span::styled("scroll  ", dim),
            Span::styled(" g/G ", key),
            Span::styled("top/bottom  ", dim),
            Span::styled(" PgUp/PgDn ", key),
            Span::styled("page  ", dim),
            Span::raw(" ".repeat(width.saturating_sub(50) as usize)),
            Span::styled(position, Style::default().fg(Color::Cyan)),
        ])
    }
}

fn header_line() -> Line<'static> {
    let key = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::DarkGray);
    Line::from(vec![
        Span::styled(
            "sqlsim",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - SQL query simulator  "),
        Span::styled("Press ", dim),
        Span::styled("q", key),
        Span::styled(" or ", dim),
        Span::styled("Esc", key),
        Span::styled(" to close", dim),
    ])
}

fn binding_line(binding: &KeyBinding) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("{:width$}", binding.keys, width = KEY_COLUMN_WIDTH),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(binding.description, Style::default().fg(Color::White)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn total_lines_counts_sections_and_gaps() {
        let popup = HelpPopup::new();
        let bindings: usize = ALL_SECTIONS.iter().map(|s| s.bindings.len()).sum();
        let expected = bindings + ALL_SECTIONS.len() * 2 + ALL_SECTIONS.len() - 1;
        assert_eq!(popup.total_lines, expected);
        assert_eq!(popup.lines(40).len(), expected);
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut popup = HelpPopup::new();
        popup.visible_height = 10;

        popup.handle_key(key(KeyCode::Char('k')));
        assert_eq!(popup.scroll_offset(), 0);

        popup.handle_key(key(KeyCode::Char('G')));
        assert_eq!(popup.scroll_offset(), popup.total_lines - 10);

        popup.handle_key(key(KeyCode::Char('j')));
        assert_eq!(popup.scroll_offset(), popup.total_lines - 10);

        popup.handle_key(key(KeyCode::Char('g')));
        assert_eq!(popup.scroll_offset(), 0);

        popup.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert_eq!(popup.scroll_offset(), 5);
    }

    #[test]
    fn close_keys() {
        let mut popup = HelpPopup::new();
        assert_eq!(popup.handle_key(key(KeyCode::Esc)), HelpAction::Close);
        assert_eq!(popup.handle_key(key(KeyCode::F(1))), HelpAction::Close);
        assert_eq!(popup.handle_key(key(KeyCode::Char('x'))), HelpAction::Continue);
    }

    #[test]
    fn renders_sections() {
        let mut terminal = Terminal::new(TestBackend::new(100, 60)).unwrap();
        let mut popup = HelpPopup::new();
        terminal.draw(|f| popup.render(f, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = (0..buffer.area.height)
            .flat_map(|y| (0..buffer.area.width).map(move |x| (x, y)))
            .map(|(x, y)| buffer[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Global"));
        assert!(text.contains("Copy SQL to clipboard"));
        assert!(popup.visible_height > 0);
    }
}
