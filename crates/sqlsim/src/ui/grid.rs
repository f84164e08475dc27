use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, StatefulWidget, Widget};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::DisplayConfig;
use crate::model::{QueryResult, TableColumn};
use crate::results::{virtual_range, ResultView};

/// Actions the grid hands back to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridKeyResult {
    None,
    ToggleSort,
    OpenFilter,
    ClearFilters,
    OpenColumns,
    ToggleChart,
    Export,
    CopyCell,
    OpenCommand,
    FocusEditor,
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct GridState {
    pub row_offset: usize,
    pub col_offset: usize,
    /// Position in the visible rows.
    pub cursor_row: usize,
    /// Position in the visible columns.
    pub cursor_col: usize,
    /// Body height of the last render, used for paging.
    pub viewport_rows: usize,
}

impl GridState {
    pub fn handle_key(&mut self, key: KeyEvent, row_count: usize, col_count: usize) -> GridKeyResult {
        let page = self.viewport_rows.max(1);

        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                if row_count > 0 {
                    self.cursor_row = (self.cursor_row + 1).min(row_count - 1);
                }
            }
            (KeyCode::PageUp, _) => {
                self.cursor_row = self.cursor_row.saturating_sub(page);
            }
            (KeyCode::PageDown, _) => {
                if row_count > 0 {
                    self.cursor_row = (self.cursor_row + page).min(row_count - 1);
                }
            }
            (KeyCode::Home, _) | (KeyCode::Char('g'), KeyModifiers::NONE) => {
                self.cursor_row = 0;
            }
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => {
                self.cursor_row = row_count.saturating_sub(1);
            }
            (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
                self.cursor_col = self.cursor_col.saturating_sub(1);
            }
            (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
                if col_count > 0 {
                    self.cursor_col = (self.cursor_col + 1).min(col_count - 1);
                }
            }

            (KeyCode::Char('s'), KeyModifiers::NONE) => return GridKeyResult::ToggleSort,
            (KeyCode::Char('f'), KeyModifiers::NONE) => return GridKeyResult::OpenFilter,
            (KeyCode::Char('F'), _) => return GridKeyResult::ClearFilters,
            (KeyCode::Char('c'), KeyModifiers::NONE) => return GridKeyResult::OpenColumns,
            (KeyCode::Char('v'), KeyModifiers::NONE) => return GridKeyResult::ToggleChart,
            (KeyCode::Char('e'), KeyModifiers::NONE) => return GridKeyResult::Export,
            (KeyCode::Char('y'), KeyModifiers::NONE) => return GridKeyResult::CopyCell,
            (KeyCode::Char(':'), _) => return GridKeyResult::OpenCommand,
            (KeyCode::Char('i'), KeyModifiers::NONE) | (KeyCode::Enter, _) => {
                return GridKeyResult::FocusEditor
            }

            _ => {}
        }
        GridKeyResult::None
    }

    /// Clamp the cursor after the row or column count changed.
    pub fn clamp(&mut self, row_count: usize, col_count: usize) {
        self.cursor_row = self.cursor_row.min(row_count.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(col_count.saturating_sub(1));
    }

    pub fn ensure_cursor_visible(&mut self, viewport_rows: usize, row_count: usize) {
        if viewport_rows == 0 || row_count == 0 {
            self.row_offset = 0;
            self.cursor_row = 0;
            return;
        }

        self.cursor_row = self.cursor_row.min(row_count - 1);

        if self.cursor_row < self.row_offset {
            self.row_offset = self.cursor_row;
        }

        let last_visible = self.row_offset + viewport_rows - 1;
        if self.cursor_row > last_visible {
            self.row_offset = self.cursor_row.saturating_sub(viewport_rows - 1);
        }

        self.row_offset = self.row_offset.min(row_count.saturating_sub(1));
    }
}

/// Virtualized results table.
pub struct DataGrid<'a> {
    pub result: &'a QueryResult,
    pub view: &'a ResultView,
    /// Visible row indices (filtered and sorted).
    pub rows: &'a [usize],
    pub display: &'a DisplayConfig,
    pub focused: bool,
}

impl<'a> StatefulWidget for DataGrid<'a> {
    type State = GridState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut GridState) {
        let title = "Results (s sort, f filter, c columns, v chart, e export)";

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let columns = self.view.visible_columns(self.result);
        if columns.is_empty() {
            Paragraph::new("All columns hidden (c to choose columns)")
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        let filter_row = self.view.has_filters();
        let header_lines: u16 = if filter_row { 2 } else { 1 };
        if inner.height <= header_lines {
            Paragraph::new("Window too small")
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        let body_area = Rect {
            x: inner.x,
            y: inner.y + header_lines,
            width: inner.width,
            height: inner.height - header_lines,
        };

        state.viewport_rows = body_area.height as usize;
        state.clamp(self.rows.len(), columns.len());
        state.ensure_cursor_visible(state.viewport_rows, self.rows.len());

        // Only the window around the viewport is materialized.
        let window = virtual_range(
            state.row_offset,
            state.viewport_rows,
            self.rows.len(),
            self.display.overscan_rows,
        );
        let window_rows = &self.rows[window.clone()];

        let header_texts: Vec<String> = columns
            .iter()
            .map(|c| match self.view.sort_direction(&c.id) {
                Some(dir) => format!("{} {}", c.header, dir.indicator()),
                None => c.header.clone(),
            })
            .collect();
        let widths = compute_column_widths(
            &header_texts,
            &columns,
            self.result,
            window_rows,
            self.display,
        );

        let marker_w: u16 = if self.display.show_row_numbers {
            (self.rows.len().max(1).to_string().len() as u16) + 2
        } else {
            2
        };
        let data_x = inner.x.saturating_add(marker_w);
        let data_w = inner.width.saturating_sub(marker_w);

        state.col_offset = scroll_columns(state.col_offset, state.cursor_col, &widths, data_w);

        // Header row (frozen).
        blank(inner.x, inner.y, marker_w, Style::default(), buf);
        render_row_cells(
            data_x,
            inner.y,
            data_w,
            &header_texts,
            &widths,
            state.col_offset,
            if self.focused { Some(state.cursor_col) } else { None },
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            buf,
        );

        if filter_row {
            let filters: Vec<String> = columns
                .iter()
                .map(|c| {
                    self.view
                        .filter(&c.id)
                        .map(|f| format!("~{}", f))
                        .unwrap_or_default()
                })
                .collect();
            blank(inner.x, inner.y + 1, marker_w, Style::default(), buf);
            render_row_cells(
                data_x,
                inner.y + 1,
                data_w,
                &filters,
                &widths,
                state.col_offset,
                None,
                Style::default().fg(Color::Yellow),
                buf,
            );
        }

        if self.rows.is_empty() {
            let msg = if self.result.rows.is_empty() {
                "(no rows)"
            } else {
                "(no rows match the filters)"
            };
            Paragraph::new(msg)
                .style(Style::default().fg(Color::Gray))
                .render(body_area, buf);
            return;
        }

        for i in 0..state.viewport_rows {
            let pos = state.row_offset + i;
            if pos >= window.end {
                break;
            }
            let row_idx = self.rows[pos];
            let y = body_area.y + i as u16;

            let is_cursor = pos == state.cursor_row;
            let row_style = if is_cursor {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            let marker = if self.display.show_row_numbers {
                format!("{:>w$} ", pos + 1, w = (marker_w - 2) as usize)
            } else {
                String::new()
            };
            let marker = format!("{}{}", if is_cursor { '>' } else { ' ' }, marker);
            buf.set_string(
                inner.x,
                y,
                fit_to_width(&marker, marker_w),
                row_style.fg(Color::DarkGray),
            );

            let cells: Vec<String> = columns
                .iter()
                .map(|c| match self.result.cell(row_idx, c) {
                    Some(v) if !v.is_null() => v.to_string(),
                    _ => self.display.null_indicator.clone(),
                })
                .collect();

            render_row_cells(
                data_x,
                y,
                data_w,
                &cells,
                &widths,
                state.col_offset,
                if is_cursor && self.focused {
                    Some(state.cursor_col)
                } else {
                    None
                },
                row_style,
                buf,
            );
        }
    }
}

/// Adjust the first drawn column so the cursor column is on screen.
fn scroll_columns(col_offset: usize, cursor_col: usize, widths: &[u16], available_w: u16) -> usize {
    let mut offset = col_offset.min(cursor_col);
    loop {
        let used: u32 = widths[offset..=cursor_col.min(widths.len().saturating_sub(1))]
            .iter()
            .map(|w| *w as u32 + 1)
            .sum();
        if used <= available_w as u32 || offset >= cursor_col {
            return offset;
        }
        offset += 1;
    }
}

fn blank(x: u16, y: u16, width: u16, style: Style, buf: &mut Buffer) {
    buf.set_string(x, y, " ".repeat(width as usize), style);
}

#[allow(clippy::too_many_arguments)]
fn render_row_cells(
    mut x: u16,
    y: u16,
    available_w: u16,
    cells: &[String],
    col_widths: &[u16],
    col_offset: usize,
    highlight_col: Option<usize>,
    style: Style,
    buf: &mut Buffer,
) {
    if available_w == 0 {
        return;
    }

    let padding: u16 = 1;
    let max_x = x.saturating_add(available_w);

    let mut col = col_offset;
    while col < cells.len() && col < col_widths.len() && x < max_x {
        let w = col_widths[col];
        let remaining = max_x - x;
        if remaining == 0 {
            break;
        }

        // Allow a partially visible last column.
        let draw_w = w.min(remaining);
        let content = fit_to_width(&cells[col], draw_w);
        let cell_style = if highlight_col == Some(col) {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        buf.set_string(x, y, content, cell_style);
        x += draw_w;

        if x < max_x {
            buf.set_string(x, y, " ", style);
            x = x.saturating_add(padding).min(max_x);
        }

        col += 1;
    }

    while x < max_x {
        buf.set_string(x, y, " ", style);
        x += 1;
    }
}

/// Column widths from the headers and the materialized rows only.
fn compute_column_widths(
    headers: &[String],
    columns: &[&TableColumn],
    result: &QueryResult,
    rows: &[usize],
    display: &DisplayConfig,
) -> Vec<u16> {
    let min_w = display.min_column_width.max(1);
    let max_w = display.max_column_width.max(min_w);

    let mut widths: Vec<u16> = headers
        .iter()
        .map(|h| clamp_u16(saturating_u16(display_width(h)), min_w, max_w))
        .collect();

    for &row in rows {
        for (i, column) in columns.iter().enumerate() {
            let w = result
                .cell(row, column)
                .map(|v| display_width(&v.to_string()))
                .unwrap_or(0);
            widths[i] = widths[i].max(clamp_u16(saturating_u16(w), min_w, max_w));
        }
    }

    widths
}

fn saturating_u16(v: usize) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

fn clamp_u16(v: u16, min_v: u16, max_v: u16) -> u16 {
    v.max(min_v).min(max_v)
}

fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn fit_to_width(s: &str, width: u16) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }

    let current = display_width(s);
    if current == width {
        return s.to_string();
    }

    if current < width {
        let mut out = s.to_string();
        out.push_str(&" ".repeat(width - current));
        return out;
    }

    if width <= 3 {
        return truncate_by_display_width(s, width);
    }

    let prefix_w = width.saturating_sub(3);
    let mut out = truncate_by_display_width(s, prefix_w);
    out.push_str("...");

    truncate_by_display_width(&out, width)
}

fn truncate_by_display_width(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
        if used == width {
            break;
        }
    }

    let out_w = display_width(&out);
    if out_w < width {
        out.push_str(&" ".repeat(width - out_w));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::local_dataset;
    use crate::model::LocalDataset;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn oversized_header_width_saturates() {
        let header = "x".repeat(usize::from(u16::MAX) + 8);
        let column = TableColumn::from_key("wide");
        let result = QueryResult::new(vec![column.clone()], Vec::new(), 0);
        let display = DisplayConfig {
            max_column_width: u16::MAX,
            ..DisplayConfig::default()
        };

        let widths = compute_column_widths(&[header], &[&column], &result, &[], &display);
        assert_eq!(widths, vec![u16::MAX]);
    }

    #[test]
    fn cursor_moves_within_bounds() {
        let mut state = GridState::default();
        state.handle_key(key('k'), 10, 3);
        assert_eq!(state.cursor_row, 0);
        state.handle_key(key('G'), 10, 3);
        assert_eq!(state.cursor_row, 9);
        state.handle_key(key('j'), 10, 3);
        assert_eq!(state.cursor_row, 9);
        state.handle_key(key('l'), 10, 3);
        state.handle_key(key('l'), 10, 3);
        state.handle_key(key('l'), 10, 3);
        assert_eq!(state.cursor_col, 2);
    }

    #[test]
    fn action_keys() {
        let mut state = GridState::default();
        assert_eq!(state.handle_key(key('s'), 1, 1), GridKeyResult::ToggleSort);
        assert_eq!(state.handle_key(key('f'), 1, 1), GridKeyResult::OpenFilter);
        assert_eq!(state.handle_key(key('F'), 1, 1), GridKeyResult::ClearFilters);
        assert_eq!(state.handle_key(key('c'), 1, 1), GridKeyResult::OpenColumns);
        assert_eq!(state.handle_key(key('v'), 1, 1), GridKeyResult::ToggleChart);
        assert_eq!(state.handle_key(key('e'), 1, 1), GridKeyResult::Export);
    }

    #[test]
    fn ensure_cursor_visible_scrolls() {
        let mut state = GridState {
            cursor_row: 25,
            ..Default::default()
        };
        state.ensure_cursor_visible(10, 100);
        assert_eq!(state.row_offset, 16);
        state.cursor_row = 3;
        state.ensure_cursor_visible(10, 100);
        assert_eq!(state.row_offset, 3);
    }

    #[test]
    fn scroll_columns_follows_cursor() {
        let widths = [10, 10, 10, 10];
        assert_eq!(scroll_columns(0, 1, &widths, 25), 0);
        assert_eq!(scroll_columns(0, 3, &widths, 25), 2);
        assert_eq!(scroll_columns(3, 1, &widths, 25), 1);
    }

    #[test]
    fn fit_truncates_with_ellipsis() {
        assert_eq!(fit_to_width("abcdef", 5), "ab...");
        assert_eq!(fit_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn renders_only_the_window() {
        let result = local_dataset(LocalDataset::Sales);
        let view = ResultView::new();
        let rows = view.visible_rows(&result);
        let display = DisplayConfig::default();
        let mut state = GridState {
            cursor_row: 4000,
            ..Default::default()
        };

        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);
        DataGrid {
            result: &result,
            view: &view,
            rows: &rows,
            display: &display,
            focused: true,
        }
        .render(area, &mut buf, &mut state);

        assert_eq!(state.viewport_rows, 9);
        assert_eq!(state.row_offset, 4000 - 8);
        let text: String = (0..80)
            .map(|x| buf[(x, 10)].symbol().to_string())
            .collect();
        assert!(text.contains("4001"));
    }
}
