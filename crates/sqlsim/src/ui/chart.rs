//! Bar chart of one result column with its aggregates.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Widget};

use crate::model::{QueryResult, TableColumn, Value};
use crate::results::{ColumnStats, ResultView};

const BAR_WIDTH: u16 = 5;
const BAR_GAP: u16 = 1;

pub struct ResultsChart<'a> {
    pub result: &'a QueryResult,
    pub view: &'a ResultView,
    pub rows: &'a [usize],
    pub column: &'a TableColumn,
    /// First visible row, so the chart follows the grid cursor.
    pub start: usize,
    pub focused: bool,
}

impl<'a> ResultsChart<'a> {
    fn label_column(&self) -> Option<&'a TableColumn> {
        self.result
            .columns
            .iter()
            .filter(|c| c.id != self.column.id && self.view.is_visible(&c.id))
            .find(|c| {
                self.rows
                    .first()
                    .and_then(|&r| self.result.cell(r, c))
                    .is_some_and(|v| matches!(v, Value::Text(_)))
            })
    }
}

pub fn stats_line(column: &TableColumn, stats: Option<ColumnStats>) -> Line<'static> {
    let Some(stats) = stats else {
        return Line::from(Span::styled(
            format!("{} has no numeric values", column.header),
            Style::default().fg(Color::DarkGray),
        ));
    };

    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    Line::from(vec![
        Span::styled(format!("{}  ", column.header), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled("count ", label),
        Span::styled(stats.count.to_string(), value),
        Span::styled("  sum ", label),
        Span::styled(format_number(stats.sum), value),
        Span::styled("  avg ", label),
        Span::styled(format_number(stats.avg), value),
        Span::styled("  min ", label),
        Span::styled(format_number(stats.min), value),
        Span::styled("  max ", label),
        Span::styled(format_number(stats.max), value),
    ])
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

impl<'a> Widget for ResultsChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title("Chart (h/l column, v table)")
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 {
            return;
        }

        let [stats_area, chart_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(inner);

        let stats = self.view.column_stats(self.result, &self.column.id);
        Paragraph::new(stats_line(self.column, stats)).render(stats_area, buf);
        if stats.is_none() {
            return;
        }

        let capacity = (chart_area.width / (BAR_WIDTH + BAR_GAP)).max(1) as usize;
        let labels = self.label_column();
        let start = self.start.min(self.rows.len().saturating_sub(1));

        let bars: Vec<Bar> = self.rows[start..]
            .iter()
            .take(capacity)
            .enumerate()
            .map(|(i, &row)| {
                let value = self
                    .result
                    .cell(row, self.column)
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                let label = labels
                    .and_then(|c| self.result.cell(row, c))
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| (start + i + 1).to_string());
                Bar::default()
                    .value(value.max(0.0).round() as u64)
                    .text_value(format_number(value))
                    .label(Line::from(label))
            })
            .collect();

        BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(BAR_WIDTH)
            .bar_gap(BAR_GAP)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .render(chart_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::local_dataset;
    use crate::model::LocalDataset;

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(10.756), "10.76");
    }

    #[test]
    fn stats_line_mentions_aggregates() {
        let column = TableColumn::from_key("members");
        let line = stats_line(
            &column,
            Some(ColumnStats {
                count: 4,
                sum: 35.0,
                avg: 8.75,
                min: 6.0,
                max: 12.0,
            }),
        );
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("count 4"));
        assert!(text.contains("avg 8.75"));
        assert!(text.contains("max 12"));
    }

    #[test]
    fn renders_team_members() {
        let result = local_dataset(LocalDataset::Teams);
        let view = ResultView::new();
        let rows = view.visible_rows(&result);
        let column = result.columns[1].clone();

        let area = Rect::new(0, 0, 60, 14);
        let mut buf = Buffer::empty(area);
        ResultsChart {
            result: &result,
            view: &view,
            rows: &rows,
            column: &column,
            start: 0,
            focused: false,
        }
        .render(area, &mut buf);

        let bottom: String = (0..60).map(|x| buf[(x, 12)].symbol().to_string()).collect();
        assert!(bottom.contains("Analy"));
    }
}
