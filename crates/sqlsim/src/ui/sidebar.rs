//! Sidebar with the searchable predefined queries and the saved queries.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::model::{PredefinedQuery, SavedQuery};

/// Actions that can result from sidebar interactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    None,
    /// Open a predefined query in a new tab
    OpenPredefined(&'static str),
    /// Open a saved query in a new tab
    OpenSaved(String),
    DeleteSaved(String),
    /// Start editing the search box
    Search,
    FocusEditor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidebarSection {
    #[default]
    Predefined,
    Saved,
}

/// Indices of the predefined queries whose title, description or SQL
/// contains `search`, ignoring case. A blank search keeps everything.
pub fn filter_predefined(predefined: &[PredefinedQuery], search: &str) -> Vec<usize> {
    let needle = search.trim().to_lowercase();
    predefined
        .iter()
        .enumerate()
        .filter(|(_, q)| {
            needle.is_empty()
                || q.title.to_lowercase().contains(&needle)
                || q.description
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || q.sql.to_lowercase().contains(&needle)
        })
        .map(|(i, _)| i)
        .collect()
}

pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub struct Sidebar {
    pub search: String,
    pub section: SidebarSection,
    predefined_state: ListState,
    saved_state: ListState,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self::new()
    }
}

impl Sidebar {
    pub fn new() -> Self {
        Self {
            search: String::new(),
            section: SidebarSection::Predefined,
            predefined_state: ListState::default().with_selected(Some(0)),
            saved_state: ListState::default().with_selected(Some(0)),
        }
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.trim().to_string();
        self.predefined_state.select(Some(0));
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        predefined: &[PredefinedQuery],
        saved: &[SavedQuery],
    ) -> SidebarAction {
        let visible = filter_predefined(predefined, &self.search);

        let (state, count) = match self.section {
            SidebarSection::Predefined => (&mut self.predefined_state, visible.len()),
            SidebarSection::Saved => (&mut self.saved_state, saved.len()),
        };
        let selected = state.selected().unwrap_or(0).min(count.saturating_sub(1));

        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                if selected == 0 && self.section == SidebarSection::Saved {
                    self.section = SidebarSection::Predefined;
                } else {
                    state.select(Some(selected.saturating_sub(1)));
                }
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                if selected + 1 >= count {
                    if self.section == SidebarSection::Predefined && !saved.is_empty() {
                        self.section = SidebarSection::Saved;
                        self.saved_state.select(Some(0));
                    }
                } else {
                    state.select(Some(selected + 1));
                }
            }
            (KeyCode::Char('/'), _) => return SidebarAction::Search,
            (KeyCode::Enter, _) => {
                return match self.section {
                    SidebarSection::Predefined => visible
                        .get(selected)
                        .and_then(|&i| predefined.get(i))
                        .map(|q| SidebarAction::OpenPredefined(q.id))
                        .unwrap_or(SidebarAction::None),
                    SidebarSection::Saved => saved
                        .get(selected)
                        .map(|s| SidebarAction::OpenSaved(s.id.clone()))
                        .unwrap_or(SidebarAction::None),
                };
            }
            (KeyCode::Char('d'), KeyModifiers::NONE) | (KeyCode::Delete, _) => {
                if self.section == SidebarSection::Saved {
                    if let Some(s) = saved.get(selected) {
                        return SidebarAction::DeleteSaved(s.id.clone());
                    }
                }
            }
            (KeyCode::Esc, _) => return SidebarAction::FocusEditor,
            _ => {}
        }
        SidebarAction::None
    }

    /// Keep the selection valid after the saved list shrank.
    pub fn clamp(&mut self, saved_len: usize) {
        if saved_len == 0 {
            self.section = SidebarSection::Predefined;
        }
        let selected = self.saved_state.selected().unwrap_or(0);
        self.saved_state
            .select(Some(selected.min(saved_len.saturating_sub(1))));
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        predefined: &[PredefinedQuery],
        saved: &[SavedQuery],
        has_focus: bool,
    ) {
        let saved_height = if saved.is_empty() {
            0
        } else {
            (saved.len() as u16 * 2 + 2).min(area.height / 2)
        };
        let [search_area, list_area, saved_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(saved_height),
        ])
        .areas(area);

        let border = |focused: bool| {
            if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        };

        let search_text = if self.search.is_empty() {
            Span::styled("Search queries... (/)", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(self.search.clone())
        };
        frame.render_widget(
            Paragraph::new(Line::from(search_text)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border(false)),
            ),
            search_area,
        );

        let visible = filter_predefined(predefined, &self.search);
        let items: Vec<ListItem> = visible
            .iter()
            .filter_map(|&i| predefined.get(i))
            .map(|q| {
                let mut lines = vec![Line::from(Span::styled(
                    q.title,
                    Style::default().add_modifier(Modifier::BOLD),
                ))];
                if let Some(desc) = q.description {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", desc),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let predefined_focused = has_focus && self.section == SidebarSection::Predefined;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Predefined queries ")
            .border_style(border(predefined_focused));

        if items.is_empty() {
            frame.render_widget(
                Paragraph::new("No matching queries")
                    .block(block)
                    .style(Style::default().fg(Color::DarkGray)),
                list_area,
            );
        } else {
            let list = List::new(items)
                .block(block)
                .highlight_style(highlight(predefined_focused))
                .highlight_symbol("▶ ");
            frame.render_stateful_widget(list, list_area, &mut self.predefined_state);
        }

        if saved.is_empty() {
            return;
        }

        let saved_focused = has_focus && self.section == SidebarSection::Saved;
        let items: Vec<ListItem> = saved
            .iter()
            .map(|s| {
                ListItem::new(vec![
                    Line::from(s.title.clone()),
                    Line::from(Span::styled(
                        format!("  {}", format_timestamp(s.created_at)),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Saved (d delete) ")
                    .border_style(border(saved_focused)),
            )
            .highlight_style(highlight(saved_focused))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, saved_area, &mut self.saved_state);
    }
}

fn highlight(focused: bool) -> Style {
    if focused {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default().fg(Color::Yellow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::predefined_queries;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn saved(id: &str) -> SavedQuery {
        SavedQuery {
            id: id.to_string(),
            title: format!("Saved {}", id),
            sql: "SELECT 1;".to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn search_matches_title_description_and_sql() {
        let catalog = predefined_queries();
        assert_eq!(filter_predefined(&catalog, "").len(), catalog.len());
        assert_eq!(filter_predefined(&catalog, "  ORDERS "), vec![1, 4]);
        assert_eq!(filter_predefined(&catalog, "virtualized"), vec![1]);
        assert_eq!(filter_predefined(&catalog, "limit 200"), vec![0]);
        assert!(filter_predefined(&catalog, "nothing like this").is_empty());
    }

    #[test]
    fn enter_opens_selected_predefined() {
        let catalog = predefined_queries();
        let mut sidebar = Sidebar::new();
        sidebar.handle_key(key(KeyCode::Down), &catalog, &[]);
        assert_eq!(
            sidebar.handle_key(key(KeyCode::Enter), &catalog, &[]),
            SidebarAction::OpenPredefined("nw_orders")
        );
    }

    #[test]
    fn enter_uses_filtered_list() {
        let catalog = predefined_queries();
        let mut sidebar = Sidebar::new();
        sidebar.set_search("teams");
        assert_eq!(
            sidebar.handle_key(key(KeyCode::Enter), &catalog, &[]),
            SidebarAction::OpenPredefined("teams")
        );
    }

    #[test]
    fn moves_into_saved_section_and_deletes() {
        let catalog = predefined_queries();
        let saved = vec![saved("a"), saved("b")];
        let mut sidebar = Sidebar::new();
        sidebar.set_search("products");

        sidebar.handle_key(key(KeyCode::Down), &catalog, &saved);
        assert_eq!(sidebar.section, SidebarSection::Saved);
        sidebar.handle_key(key(KeyCode::Down), &catalog, &saved);
        assert_eq!(
            sidebar.handle_key(key(KeyCode::Char('d')), &catalog, &saved),
            SidebarAction::DeleteSaved("b".to_string())
        );
        assert_eq!(
            sidebar.handle_key(key(KeyCode::Enter), &catalog, &saved),
            SidebarAction::OpenSaved("b".to_string())
        );

        sidebar.clamp(0);
        assert_eq!(sidebar.section, SidebarSection::Predefined);
    }

    #[test]
    fn timestamps_format() {
        assert_eq!(format_timestamp(0).len(), 16);
    }
}
