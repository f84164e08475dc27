use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Tabs, Widget};

use crate::model::SqlTab;

const MAX_TITLE_WIDTH: usize = 20;

/// One line listing the open tabs.
pub struct TabBar<'a> {
    pub tabs: &'a [SqlTab],
    pub active: Option<&'a str>,
    /// Whether a tab has a run in flight.
    pub is_loading: &'a dyn Fn(&str) -> bool,
}

fn short_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_WIDTH {
        return title.to_string();
    }
    let mut out: String = title.chars().take(MAX_TITLE_WIDTH - 1).collect();
    out.push('…');
    out
}

impl<'a> Widget for TabBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.tabs.is_empty() {
            Line::from(Span::styled(
                " No tabs (Ctrl+N new tab)",
                Style::default().fg(Color::DarkGray),
            ))
            .render(area, buf);
            return;
        }

        let titles: Vec<Line> = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let marker = if (self.is_loading)(&t.id) { " ●" } else { "" };
                Line::from(format!("{}:{}{}", i + 1, short_title(&t.title), marker))
            })
            .collect();

        let selected = self
            .active
            .and_then(|id| self.tabs.iter().position(|t| t.id == id));

        Tabs::new(titles)
            .select(selected)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("│")
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_titles_are_shortened() {
        assert_eq!(short_title("Query 1"), "Query 1");
        let long = short_title("A very long tab title that goes on");
        assert_eq!(long.chars().count(), MAX_TITLE_WIDTH);
        assert!(long.ends_with('…'));
    }

    #[test]
    fn renders_active_and_loading_tabs() {
        let tabs = vec![SqlTab::new("One", ""), SqlTab::new("Two", "")];
        let loading_id = tabs[1].id.clone();
        let is_loading = |id: &str| id == loading_id;

        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        TabBar {
            tabs: &tabs,
            active: Some(&tabs[0].id),
            is_loading: &is_loading,
        }
        .render(area, &mut buf);

        let text: String = (0..40).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(text.contains("1:One"));
        assert!(text.contains("2:Two ●"));
    }
}
