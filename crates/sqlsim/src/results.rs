//! View state over a query result: sorting, column filters and visibility.
//!
//! The view never copies rows. Everything derived from it is expressed as
//! row indices into the underlying [`QueryResult`].

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use crate::model::{QueryResult, Row, TableColumn, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
    /// Direction the cycle started with, so the third toggle clears it.
    first: SortDirection,
}

/// Aggregates over the numeric cells of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultView {
    sort: Option<SortState>,
    filters: BTreeMap<String, String>,
    hidden: HashSet<String>,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- sorting -----

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn sort_direction(&self, column_id: &str) -> Option<SortDirection> {
        self.sort
            .as_ref()
            .filter(|s| s.column == column_id)
            .map(|s| s.direction)
    }

    /// Cycle the sort of a column: none, first direction, opposite, none.
    /// Sorting another column starts a new cycle there.
    pub fn toggle_sort(&mut self, result: &QueryResult, column_id: &str) {
        self.sort = match self.sort.take() {
            Some(state) if state.column == column_id => {
                if state.direction == state.first {
                    Some(SortState {
                        direction: state.direction.flip(),
                        ..state
                    })
                } else {
                    None
                }
            }
            _ => {
                let first = first_sort_direction(result, column_id);
                Some(SortState {
                    column: column_id.to_string(),
                    direction: first,
                    first,
                })
            }
        };
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    // ----- filters -----

    /// Set a column filter. An empty value removes it; whitespace is kept
    /// and matched like any other text.
    pub fn set_filter(&mut self, column_id: &str, value: &str) {
        if value.is_empty() {
            self.filters.remove(column_id);
        } else {
            self.filters
                .insert(column_id.to_string(), value.to_string());
        }
    }

    pub fn filter(&self, column_id: &str) -> Option<&str> {
        self.filters.get(column_id).map(String::as_str)
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    // ----- visibility -----

    pub fn is_visible(&self, column_id: &str) -> bool {
        !self.hidden.contains(column_id)
    }

    pub fn toggle_column(&mut self, column_id: &str) {
        if !self.hidden.remove(column_id) {
            self.hidden.insert(column_id.to_string());
        }
    }

    pub fn reset_columns(&mut self) {
        self.hidden.clear();
    }

    pub fn visible_columns<'a>(&self, result: &'a QueryResult) -> Vec<&'a TableColumn> {
        result
            .columns
            .iter()
            .filter(|c| self.is_visible(&c.id))
            .collect()
    }

    // ----- derived rows -----

    /// Indices of the rows that pass every filter, in input order.
    pub fn filtered_rows(&self, result: &QueryResult) -> Vec<usize> {
        let filters: Vec<(&TableColumn, String)> = self
            .filters
            .iter()
            .filter_map(|(id, needle)| {
                result
                    .columns
                    .iter()
                    .find(|c| &c.id == id)
                    .map(|c| (c, needle.to_lowercase()))
            })
            .collect();

        result
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                filters.iter().all(|(column, needle)| {
                    display_text(row, column).to_lowercase().contains(needle)
                })
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Filtered rows in sort order.
    pub fn visible_rows(&self, result: &QueryResult) -> Vec<usize> {
        let mut rows = self.filtered_rows(result);

        let Some(sort) = &self.sort else {
            return rows;
        };
        let Some(column) = result.columns.iter().find(|c| c.id == sort.column) else {
            return rows;
        };

        let key = &column.accessor_key;
        rows.sort_by(|&a, &b| {
            let left = result.rows[a].get(key).unwrap_or(&Value::Null);
            let right = result.rows[b].get(key).unwrap_or(&Value::Null);
            compare_nulls_last(left, right, sort.direction)
        });
        rows
    }

    /// Numeric aggregates of a column over the filtered rows.
    pub fn column_stats(&self, result: &QueryResult, column_id: &str) -> Option<ColumnStats> {
        let column = result.columns.iter().find(|c| c.id == column_id)?;
        let values = self
            .filtered_rows(result)
            .into_iter()
            .filter_map(|i| result.rows[i].get(&column.accessor_key))
            .filter_map(Value::as_f64);
        stats_of(values)
    }

    /// CSV text of the visible columns and rows.
    pub fn to_csv(&self, result: &QueryResult) -> String {
        let columns = self.visible_columns(result);

        let header = columns
            .iter()
            .map(|c| escape_csv_field(&c.id))
            .collect::<Vec<_>>()
            .join(",");

        let mut lines = vec![header];
        for i in self.visible_rows(result) {
            let row = &result.rows[i];
            let line = columns
                .iter()
                .map(|c| escape_csv_field(&display_text(row, c)).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            lines.push(line);
        }
        lines.join("\n")
    }
}

fn display_text(row: &Row, column: &TableColumn) -> String {
    row.get(&column.accessor_key)
        .map(Value::to_string)
        .unwrap_or_default()
}

/// Descending when the column's first row holds a number, else ascending.
fn first_sort_direction(result: &QueryResult, column_id: &str) -> SortDirection {
    let numeric = result
        .columns
        .iter()
        .find(|c| c.id == column_id)
        .and_then(|c| result.cell(0, c))
        .is_some_and(Value::is_number);
    if numeric {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

fn compare_nulls_last(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            SortDirection::Asc => a.compare(b),
            SortDirection::Desc => b.compare(a),
        },
    }
}

fn stats_of(values: impl Iterator<Item = f64>) -> Option<ColumnStats> {
    let mut stats: Option<ColumnStats> = None;
    for v in values {
        let s = stats.get_or_insert(ColumnStats {
            count: 0,
            sum: 0.0,
            avg: 0.0,
            min: v,
            max: v,
        });
        s.count += 1;
        s.sum += v;
        s.min = s.min.min(v);
        s.max = s.max.max(v);
    }
    stats.map(|mut s| {
        s.avg = s.sum / s.count as f64;
        s
    })
}

/// Quote a CSV field when it contains a quote, comma or newline.
pub fn escape_csv_field(field: &str) -> Cow<'_, str> {
    if field.contains(['"', ',', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Row window to render for a scrolled viewport, padded by `overscan` rows
/// on both sides and clamped to `total`.
pub fn virtual_range(offset: usize, viewport: usize, total: usize, overscan: usize) -> Range<usize> {
    let start = offset.saturating_sub(overscan).min(total);
    let end = offset
        .saturating_add(viewport)
        .saturating_add(overscan)
        .min(total);
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::make_columns;
    use pretty_assertions::assert_eq;

    fn result() -> QueryResult {
        let columns = make_columns(&["name", "qty", "note"]);
        let rows = vec![
            ("banana", Value::Int(3), Value::from("ok")),
            ("Apple", Value::Int(10), Value::Null),
            ("cherry", Value::Null, Value::from("has, comma")),
            ("date", Value::Float(2.5), Value::from("say \"hi\"")),
        ]
        .into_iter()
        .map(|(name, qty, note)| {
            Row::from([
                ("name".to_string(), Value::from(name)),
                ("qty".to_string(), qty),
                ("note".to_string(), note),
            ])
        })
        .collect();
        QueryResult::new(columns, rows, 0)
    }

    fn names(result: &QueryResult, rows: &[usize]) -> Vec<String> {
        rows.iter()
            .map(|&i| result.rows[i]["name"].to_string())
            .collect()
    }

    #[test]
    fn unsorted_rows_keep_input_order() {
        let r = result();
        let view = ResultView::new();
        assert_eq!(view.visible_rows(&r), vec![0, 1, 2, 3]);
    }

    #[test]
    fn text_sort_cycles_asc_desc_none() {
        let r = result();
        let mut view = ResultView::new();

        view.toggle_sort(&r, "name");
        assert_eq!(view.sort_direction("name"), Some(SortDirection::Asc));
        assert_eq!(
            names(&r, &view.visible_rows(&r)),
            vec!["Apple", "banana", "cherry", "date"]
        );

        view.toggle_sort(&r, "name");
        assert_eq!(view.sort_direction("name"), Some(SortDirection::Desc));
        assert_eq!(
            names(&r, &view.visible_rows(&r)),
            vec!["date", "cherry", "banana", "Apple"]
        );

        view.toggle_sort(&r, "name");
        assert_eq!(view.sort(), None);
    }

    #[test]
    fn numeric_sort_starts_descending_with_nulls_last() {
        let r = result();
        let mut view = ResultView::new();

        view.toggle_sort(&r, "qty");
        assert_eq!(view.sort_direction("qty"), Some(SortDirection::Desc));
        assert_eq!(
            names(&r, &view.visible_rows(&r)),
            vec!["Apple", "banana", "date", "cherry"]
        );

        view.toggle_sort(&r, "qty");
        assert_eq!(
            names(&r, &view.visible_rows(&r)),
            vec!["date", "banana", "Apple", "cherry"]
        );
    }

    #[test]
    fn sorting_another_column_restarts_cycle() {
        let r = result();
        let mut view = ResultView::new();
        view.toggle_sort(&r, "qty");
        view.toggle_sort(&r, "qty");
        view.toggle_sort(&r, "name");
        assert_eq!(view.sort_direction("qty"), None);
        assert_eq!(view.sort_direction("name"), Some(SortDirection::Asc));
    }

    #[test]
    fn filters_are_case_insensitive_and_combined() {
        let r = result();
        let mut view = ResultView::new();

        view.set_filter("name", "A");
        assert_eq!(
            names(&r, &view.visible_rows(&r)),
            vec!["banana", "Apple", "date"]
        );

        view.set_filter("note", "O");
        assert_eq!(names(&r, &view.visible_rows(&r)), vec!["banana"]);

        view.set_filter("note", "");
        assert_eq!(view.filter("note"), None);
        assert_eq!(view.visible_rows(&r).len(), 3);

        view.clear_filters();
        assert!(!view.has_filters());
    }

    #[test]
    fn whitespace_filter_is_kept_and_matched() {
        let r = result();
        let mut view = ResultView::new();
        view.set_filter("note", " ");
        assert_eq!(view.filter("note"), Some(" "));
        assert_eq!(names(&r, &view.visible_rows(&r)), vec!["cherry", "date"]);
    }

    #[test]
    fn filter_matches_numeric_display_text() {
        let r = result();
        let mut view = ResultView::new();
        view.set_filter("qty", "2.5");
        assert_eq!(names(&r, &view.visible_rows(&r)), vec!["date"]);
    }

    #[test]
    fn stats_over_filtered_numeric_cells() {
        let r = result();
        let mut view = ResultView::new();

        let stats = view.column_stats(&r, "qty").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.sum, 15.5);
        assert_eq!(stats.min, 2.5);
        assert_eq!(stats.max, 10.0);
        assert!((stats.avg - 15.5 / 3.0).abs() < 1e-9);

        view.set_filter("name", "an");
        let stats = view.column_stats(&r, "qty").unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.sum, 3.0);

        assert_eq!(view.column_stats(&r, "name"), None);
        assert_eq!(view.column_stats(&r, "missing"), None);
    }

    #[test]
    fn column_visibility_toggle_and_reset() {
        let r = result();
        let mut view = ResultView::new();

        view.toggle_column("qty");
        let ids: Vec<&str> = view.visible_columns(&r).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "note"]);

        view.toggle_column("qty");
        assert!(view.is_visible("qty"));

        view.toggle_column("name");
        view.toggle_column("note");
        view.reset_columns();
        assert_eq!(view.visible_columns(&r).len(), 3);
    }

    #[test]
    fn csv_escapes_and_respects_view() {
        let r = result();
        let mut view = ResultView::new();
        view.toggle_column("qty");
        view.set_filter("name", "e");

        assert_eq!(
            view.to_csv(&r),
            "name,note\nApple,\ncherry,\"has, comma\"\ndate,\"say \"\"hi\"\"\""
        );
    }

    #[test]
    fn csv_of_empty_result_is_header_only() {
        let r = QueryResult::placeholder();
        assert_eq!(ResultView::new().to_csv(&r), "placeholder");
    }

    #[test]
    fn escape_newlines() {
        assert_eq!(escape_csv_field("a\nb"), "\"a\nb\"");
        assert_eq!(escape_csv_field("plain"), "plain");
    }

    #[test]
    fn virtual_range_clamps() {
        assert_eq!(virtual_range(0, 20, 5000, 10), 0..30);
        assert_eq!(virtual_range(100, 20, 5000, 10), 90..130);
        assert_eq!(virtual_range(4990, 20, 5000, 10), 4980..5000);
        assert_eq!(virtual_range(0, 20, 0, 10), 0..0);
        assert_eq!(virtual_range(50, 20, 10, 5), 10..10);
    }
}
