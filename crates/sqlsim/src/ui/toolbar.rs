//! Editor toolbar and the results summary line.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

/// Which toolbar buttons are usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toolbar {
    pub can_back: bool,
    pub can_forward: bool,
    pub can_run: bool,
    pub can_clear: bool,
    pub can_copy: bool,
}

impl Toolbar {
    fn button(label: &'static str, keys: &'static str, enabled: bool, primary: bool) -> Vec<Span<'static>> {
        let style = match (enabled, primary) {
            (false, _) => Style::default().fg(Color::DarkGray),
            (true, true) => Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Color::White),
        };
        vec![
            Span::styled(format!(" {} ", label), style),
            Span::styled(format!("{}  ", keys), Style::default().fg(Color::DarkGray)),
        ]
    }
}

impl Widget for Toolbar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = [
            Self::button("◀ Back", "Alt+←", self.can_back, false),
            Self::button("Forward ▶", "Alt+→", self.can_forward, false),
            Self::button("Run", "Ctrl+Enter/F5", self.can_run, true),
            Self::button("Clear", "Ctrl+L", self.can_clear, false),
            Self::button("Copy", "Ctrl+Y", self.can_copy, false),
        ]
        .into_iter()
        .flatten()
        .collect();
        Line::from(spans).render(area, buf);
    }
}

/// `1234567` -> `1,234,567`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `{rows} rows • {ms} ms`, with filtered counts when they differ.
pub fn results_summary(row_count: usize, visible: usize, execution_ms: u64) -> String {
    let rows = if visible == row_count {
        format!("{} rows", format_thousands(row_count as u64))
    } else {
        format!(
            "{} of {} rows",
            format_thousands(visible as u64),
            format_thousands(row_count as u64)
        )
    };
    format!("{} • {} ms", rows, format_thousands(execution_ms))
}
