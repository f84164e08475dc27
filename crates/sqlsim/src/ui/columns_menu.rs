//! Checkbox popup for choosing the visible result columns.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

use super::centered_rect;
use crate::model::QueryResult;
use crate::results::ResultView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnsAction {
    Continue,
    Toggle(String),
    Reset,
    Close,
}

#[derive(Default)]
pub struct ColumnsMenu {
    pub active: bool,
    state: ListState,
}

impl ColumnsMenu {
    pub fn open(&mut self) {
        self.active = true;
        self.state.select(Some(0));
    }

    pub fn close(&mut self) {
        self.active = false;
    }

    pub fn selected(&self) -> usize {
        self.state.selected().unwrap_or(0)
    }

    pub fn handle_key(&mut self, key: KeyEvent, result: &QueryResult) -> ColumnsAction {
        let count = result.columns.len();
        let selected = self.selected();

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c') => ColumnsAction::Close,
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select(Some(selected.saturating_sub(1)));
                ColumnsAction::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if count > 0 {
                    self.state.select(Some((selected + 1).min(count - 1)));
                }
                ColumnsAction::Continue
            }
            KeyCode::Char(' ') | KeyCode::Enter => match result.columns.get(selected) {
                Some(column) => ColumnsAction::Toggle(column.id.clone()),
                None => ColumnsAction::Continue,
            },
            KeyCode::Char('r') => ColumnsAction::Reset,
            _ => ColumnsAction::Continue,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, result: &QueryResult, view: &ResultView) {
        let width = result
            .columns
            .iter()
            .map(|c| c.header.len() as u16 + 8)
            .max()
            .unwrap_or(20)
            .clamp(30, 60);
        let height = (result.columns.len() as u16 + 2).min(area.height.saturating_sub(2)).max(3);
        let popup = centered_rect(width, height, area);

        let items: Vec<ListItem> = result
            .columns
            .iter()
            .map(|c| {
                let mark = if view.is_visible(&c.id) { "[x] " } else { "[ ] " };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, Style::default().fg(Color::Yellow)),
                    Span::raw(c.header.clone()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Columns (Space toggle, r reset, Esc close) ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(Style::default().bg(Color::DarkGray));

        frame.render_widget(Clear, popup);
        frame.render_stateful_widget(list, popup, &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::local_dataset;
    use crate::model::LocalDataset;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn toggles_selected_column() {
        let result = local_dataset(LocalDataset::Teams);
        let mut menu = ColumnsMenu::default();
        menu.open();

        menu.handle_key(key(KeyCode::Down), &result);
        assert_eq!(
            menu.handle_key(key(KeyCode::Char(' ')), &result),
            ColumnsAction::Toggle("members".to_string())
        );

        menu.handle_key(key(KeyCode::Down), &result);
        menu.handle_key(key(KeyCode::Down), &result);
        assert_eq!(menu.selected(), 2);

        assert_eq!(menu.handle_key(key(KeyCode::Char('r')), &result), ColumnsAction::Reset);
        assert_eq!(menu.handle_key(key(KeyCode::Esc), &result), ColumnsAction::Close);
    }
}
