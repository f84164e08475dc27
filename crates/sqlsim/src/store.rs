//! The query store: tabs, per-tab results, loading flags and query history.
//!
//! Running a query is split in three steps so the UI can do the slow part on
//! a worker thread: [`QueryStore::begin_run`] records the run and returns a
//! [`RunRequest`], [`execute_run`] produces the result (falling back to the
//! canned result on load failure) and [`QueryStore::finish_run`] stores it.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::catalog::{self, DEFAULT_SQL};
use crate::loader::{resolve_source, Fetcher};
use crate::model::{
    now_ms, short_id, PredefinedQuery, QueryResult, QuerySource, SavedQuery, SqlTab,
};
use crate::persistence::{load_tabs_or_default, save_tabs_to_path, PersistedTabs};

/// Result state of a tab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultState<'a> {
    /// The tab has never been run.
    NotRun,
    /// The result was cleared by the user.
    Cleared,
    Ready(&'a QueryResult),
}

/// Query text history of a single tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabHistory {
    pub entries: Vec<String>,
    /// Position in `entries`; `None` before the first entry.
    pub index: Option<usize>,
}

impl TabHistory {
    fn starting_with(query: &str) -> Self {
        if query.is_empty() {
            Self::default()
        } else {
            Self {
                entries: vec![query.to_string()],
                index: Some(0),
            }
        }
    }

    /// Append `query` unless it is empty or equal to the last entry.
    fn snapshot(&mut self, query: &str, max_entries: usize) -> bool {
        if query.is_empty() || self.entries.last().map(String::as_str) == Some(query) {
            return false;
        }
        self.entries.push(query.to_string());
        while self.entries.len() > max_entries.max(1) {
            self.entries.remove(0);
        }
        self.index = Some(self.entries.len() - 1);
        true
    }
}

/// A query run handed to a worker.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub tab_id: String,
    pub run_id: u64,
    pub matched: PredefinedQuery,
    /// Where the result comes from, looked up by the matched id.
    pub source: QuerySource,
}

/// What a worker hands back to the store.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub tab_id: String,
    pub run_id: u64,
    pub result: QueryResult,
    /// Load error when the canned fallback was used instead.
    pub fallback_reason: Option<String>,
}

/// Resolve the matched query's result, using its canned result on failure.
pub fn execute_run(request: &RunRequest, fetcher: &dyn Fetcher, base_url: &str) -> RunOutcome {
    match resolve_source(fetcher, base_url, request.source) {
        Ok(result) => {
            info!(
                tab = %request.tab_id,
                query = request.matched.id,
                rows = result.row_count,
                elapsed_ms = result.execution_ms,
                "query resolved"
            );
            RunOutcome {
                tab_id: request.tab_id.clone(),
                run_id: request.run_id,
                result,
                fallback_reason: None,
            }
        }
        Err(e) => {
            warn!(
                tab = %request.tab_id,
                query = request.matched.id,
                error = %e,
                "load failed, using canned result"
            );
            RunOutcome {
                tab_id: request.tab_id.clone(),
                run_id: request.run_id,
                result: catalog::fallback_result(&request.matched),
                fallback_reason: Some(e.to_string()),
            }
        }
    }
}

pub struct QueryStore {
    tabs: Vec<SqlTab>,
    active_tab_id: Option<String>,
    results: HashMap<String, Option<QueryResult>>,
    loading: HashSet<String>,
    history: HashMap<String, TabHistory>,
    saved_queries: Vec<SavedQuery>,
    predefined: Vec<PredefinedQuery>,

    latest_run: HashMap<String, u64>,
    next_run_id: u64,
    max_history: usize,

    path: Option<PathBuf>,
    dirty: bool,
}

impl QueryStore {
    /// Create an empty store. With `path` set, tab changes are written there.
    pub fn new(predefined: Vec<PredefinedQuery>, path: Option<PathBuf>, max_history: usize) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: None,
            results: HashMap::new(),
            loading: HashSet::new(),
            history: HashMap::new(),
            saved_queries: Vec::new(),
            predefined,
            latest_run: HashMap::new(),
            next_run_id: 1,
            max_history,
            path,
            dirty: false,
        }
    }

    /// Restore persisted tabs; with none stored, open "Query 1" with the
    /// first predefined query.
    pub fn hydrate(&mut self) {
        let saved = self
            .path
            .as_deref()
            .map(load_tabs_or_default)
            .unwrap_or_default();

        self.saved_queries = saved.saved_queries;

        if saved.tabs.is_empty() {
            let sql = self.predefined.first().map(|p| p.sql).unwrap_or(DEFAULT_SQL);
            let first = SqlTab::new("Query 1", sql);
            self.active_tab_id = Some(first.id.clone());
            self.tabs = vec![first];
            self.save_now();
        } else {
            let active_exists = saved
                .active_tab_id
                .as_ref()
                .is_some_and(|id| saved.tabs.iter().any(|t| &t.id == id));
            self.active_tab_id = if active_exists {
                saved.active_tab_id
            } else {
                saved.tabs.last().map(|t| t.id.clone())
            };
            self.tabs = saved.tabs;
        }
        info!(tabs = self.tabs.len(), "store hydrated");
    }

    // ----- accessors -----

    pub fn tabs(&self) -> &[SqlTab] {
        &self.tabs
    }

    pub fn tab(&self, id: &str) -> Option<&SqlTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn active_tab(&self) -> Option<&SqlTab> {
        self.active_tab_id.as_deref().and_then(|id| self.tab(id))
    }

    pub fn result(&self, id: &str) -> ResultState<'_> {
        match self.results.get(id) {
            None => ResultState::NotRun,
            Some(None) => ResultState::Cleared,
            Some(Some(result)) => ResultState::Ready(result),
        }
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loading.contains(id)
    }

    pub fn history(&self, id: &str) -> Option<&TabHistory> {
        self.history.get(id)
    }

    pub fn saved_queries(&self) -> &[SavedQuery] {
        &self.saved_queries
    }

    pub fn predefined(&self) -> &[PredefinedQuery] {
        &self.predefined
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ----- tabs -----

    /// Open a new tab and make it active. Returns its id.
    pub fn create_tab(&mut self, title: Option<&str>, query: Option<&str>) -> String {
        let query = query.unwrap_or("");
        let tab = SqlTab::new(title.unwrap_or("New Query"), query);
        let id = tab.id.clone();

        self.history
            .insert(id.clone(), TabHistory::starting_with(query));
        self.tabs.push(tab);
        self.active_tab_id = Some(id.clone());
        debug!(tab = %id, "tab created");
        self.save_now();
        id
    }

    /// Close a tab and drop its derived state. If it was active, the last
    /// remaining tab becomes active.
    pub fn close_tab(&mut self, id: &str) {
        let before = self.tabs.len();
        self.tabs.retain(|t| t.id != id);
        if self.tabs.len() == before {
            return;
        }

        if self.active_tab_id.as_deref() == Some(id) {
            self.active_tab_id = self.tabs.last().map(|t| t.id.clone());
        }
        self.results.remove(id);
        self.loading.remove(id);
        self.history.remove(id);
        self.latest_run.remove(id);
        debug!(tab = %id, "tab closed");
        self.save_now();
    }

    pub fn set_active_tab(&mut self, id: &str) {
        if self.tab(id).is_some() {
            self.active_tab_id = Some(id.to_string());
            self.dirty = true;
        }
    }

    pub fn rename_tab(&mut self, id: &str, title: &str) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            tab.title = title.to_string();
            tab.updated_at = now_ms();
            self.save_now();
        }
    }

    /// Replace a tab's text. Saving is deferred to [`QueryStore::flush`].
    pub fn update_query(&mut self, id: &str, query: &str) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            if tab.query != query {
                tab.query = query.to_string();
                tab.updated_at = now_ms();
                self.dirty = true;
            }
        }
    }

    // ----- running -----

    /// Mark the tab loading, snapshot its text into history and pick the
    /// predefined query to run. `None` for unknown tabs or an empty catalog.
    pub fn begin_run(&mut self, id: &str) -> Option<RunRequest> {
        let query = self.tab(id)?.query.clone();
        let matched = catalog::match_query(&self.predefined, &query)?.clone();

        self.loading.insert(id.to_string());
        self.history_snapshot(id);

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.latest_run.insert(id.to_string(), run_id);

        info!(tab = %id, run_id, matched = matched.id, "query run started");
        let source = catalog::source_for_id(&self.predefined, matched.id);
        Some(RunRequest {
            tab_id: id.to_string(),
            run_id,
            matched,
            source,
        })
    }

    /// Store a finished run. Returns false when the outcome was dropped
    /// because the tab is gone or a newer run was started.
    pub fn finish_run(&mut self, outcome: RunOutcome) -> bool {
        if self.latest_run.get(&outcome.tab_id) != Some(&outcome.run_id) {
            debug!(tab = %outcome.tab_id, run_id = outcome.run_id, "dropping stale result");
            return false;
        }
        self.latest_run.remove(&outcome.tab_id);
        self.loading.remove(&outcome.tab_id);
        self.results
            .insert(outcome.tab_id, Some(outcome.result));
        true
    }

    /// Run synchronously on the current thread.
    pub fn run_query_blocking(&mut self, id: &str, fetcher: &dyn Fetcher, base_url: &str) -> Option<RunOutcome> {
        let request = self.begin_run(id)?;
        let outcome = execute_run(&request, fetcher, base_url);
        self.finish_run(outcome.clone());
        Some(outcome)
    }

    pub fn clear_result(&mut self, id: &str) {
        self.results.insert(id.to_string(), None);
    }

    // ----- history -----

    pub fn can_history_back(&self, id: &str) -> bool {
        self.history
            .get(id)
            .and_then(|h| h.index)
            .is_some_and(|i| i > 0)
    }

    pub fn can_history_forward(&self, id: &str) -> bool {
        self.history
            .get(id)
            .is_some_and(|h| h.index.map_or(0, |i| i + 1) < h.entries.len())
    }

    pub fn history_back(&mut self, id: &str) {
        let Some(target) = self
            .history
            .get(id)
            .and_then(|h| h.index)
            .and_then(|i| i.checked_sub(1))
        else {
            return;
        };
        self.move_history(id, target);
    }

    pub fn history_forward(&mut self, id: &str) {
        let Some(history) = self.history.get(id) else {
            return;
        };
        let target = history.index.map_or(0, |i| i + 1);
        if target < history.entries.len() {
            self.move_history(id, target);
        }
    }

    fn move_history(&mut self, id: &str, target: usize) {
        let Some(history) = self.history.get_mut(id) else {
            return;
        };
        let Some(text) = history.entries.get(target).cloned() else {
            return;
        };
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return;
        };
        history.index = Some(target);
        tab.query = text;
        tab.updated_at = now_ms();
        self.save_now();
    }

    /// Push the tab's current text onto its history when it changed.
    pub fn history_snapshot(&mut self, id: &str) {
        let Some(query) = self.tab(id).map(|t| t.query.clone()) else {
            return;
        };
        let max = self.max_history;
        self.history
            .entry(id.to_string())
            .or_default()
            .snapshot(&query, max);
    }

    // ----- saved queries -----

    pub fn save_current_query(&mut self, id: &str) -> Option<&SavedQuery> {
        let tab = self.tab(id)?;
        let title = if tab.title.is_empty() {
            "Saved Query".to_string()
        } else {
            tab.title.clone()
        };
        let entry = SavedQuery {
            id: short_id(),
            title,
            sql: tab.query.clone(),
            created_at: now_ms(),
        };
        self.saved_queries.insert(0, entry);
        self.save_now();
        self.saved_queries.first()
    }

    pub fn delete_saved_query(&mut self, id: &str) {
        let before = self.saved_queries.len();
        self.saved_queries.retain(|q| q.id != id);
        if self.saved_queries.len() != before {
            self.save_now();
        }
    }

    // ----- persistence -----

    fn snapshot_state(&self) -> PersistedTabs {
        PersistedTabs {
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id.clone(),
            saved_queries: self.saved_queries.clone(),
        }
    }

    fn save_now(&mut self) {
        self.dirty = true;
        self.flush();
    }

    /// Write pending changes. Failures are logged and retried on the next
    /// change.
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        let Some(path) = self.path.clone() else {
            self.dirty = false;
            return;
        };
        match save_tabs_to_path(&self.snapshot_state(), &path) {
            Ok(()) => self.dirty = false,
            Err(e) => warn!(error = %e, "failed to save tabs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::predefined_queries;
    use crate::loader::tests::StubFetcher;
    use crate::model::Value;
    use crate::persistence::load_tabs_from_path;
    use pretty_assertions::assert_eq;

    const BASE: &str = "http://data";

    fn store() -> QueryStore {
        QueryStore::new(predefined_queries(), None, 100)
    }

    fn tab_text(store: &QueryStore, id: &str) -> String {
        store.tab(id).unwrap().query.clone()
    }

    #[test]
    fn hydrate_creates_first_tab() {
        let mut s = store();
        s.hydrate();
        assert_eq!(s.tabs().len(), 1);
        let tab = s.active_tab().unwrap();
        assert_eq!(tab.title, "Query 1");
        assert_eq!(tab.query, "SELECT * FROM Customers LIMIT 200;");
    }

    #[test]
    fn hydrate_with_empty_catalog_uses_select_one() {
        let mut s = QueryStore::new(Vec::new(), None, 100);
        s.hydrate();
        assert_eq!(s.active_tab().unwrap().query, "SELECT 1;");
    }

    #[test]
    fn hydrate_restores_persisted_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabs-v1.json");

        let (first, second) = {
            let mut s = QueryStore::new(predefined_queries(), Some(path.clone()), 100);
            s.hydrate();
            let first = s.active_tab_id().unwrap().to_string();
            let second = s.create_tab(Some("Orders"), Some("SELECT * FROM Orders;"));
            s.update_query(&second, "SELECT * FROM Orders LIMIT 5;");
            s.set_active_tab(&first);
            s.flush();
            (first, second)
        };

        let mut restored = QueryStore::new(predefined_queries(), Some(path), 100);
        restored.hydrate();
        assert_eq!(restored.tabs().len(), 2);
        assert_eq!(restored.active_tab_id(), Some(first.as_str()));
        assert_eq!(tab_text(&restored, &second), "SELECT * FROM Orders LIMIT 5;");
        // History is not persisted.
        assert!(restored.history(&second).is_none());
    }

    #[test]
    fn hydrate_keeps_unreadable_file_as_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabs-v1.json");
        let original = r#"{"version": 9, "tabs": [{"id": "future"}]}"#;
        std::fs::write(&path, original).unwrap();

        let mut s = QueryStore::new(predefined_queries(), Some(path.clone()), 100);
        s.hydrate();
        assert_eq!(s.tabs().len(), 1);

        let backup = dir.path().join("tabs-v1.json.bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), original);
        // The fresh default state went to the regular path.
        assert_eq!(load_tabs_from_path(&path).unwrap().tabs.len(), 1);
    }

    #[test]
    fn create_tab_initializes_history() {
        let mut s = store();
        let with_query = s.create_tab(Some("A"), Some("SELECT 1;"));
        let empty = s.create_tab(None, None);

        assert_eq!(
            s.history(&with_query).unwrap(),
            &TabHistory {
                entries: vec!["SELECT 1;".to_string()],
                index: Some(0)
            }
        );
        assert_eq!(s.history(&empty).unwrap(), &TabHistory::default());
        assert_eq!(s.tab(&empty).unwrap().title, "New Query");
        assert_eq!(s.active_tab_id(), Some(empty.as_str()));
    }

    #[test]
    fn close_active_tab_activates_last_remaining() {
        let mut s = store();
        let a = s.create_tab(Some("A"), None);
        let b = s.create_tab(Some("B"), None);
        let c = s.create_tab(Some("C"), None);
        s.set_active_tab(&a);

        s.close_tab(&a);
        assert_eq!(s.active_tab_id(), Some(c.as_str()));

        s.close_tab(&b);
        assert_eq!(s.active_tab_id(), Some(c.as_str()));

        s.close_tab(&c);
        assert_eq!(s.active_tab_id(), None);
        assert!(s.tabs().is_empty());
    }

    #[test]
    fn close_tab_drops_derived_state() {
        let mut s = store();
        let id = s.create_tab(None, Some("SELECT * FROM teams;"));
        let stub = StubFetcher::default();
        s.run_query_blocking(&id, &stub, BASE).unwrap();
        assert!(matches!(s.result(&id), ResultState::Ready(_)));

        s.close_tab(&id);
        assert_eq!(s.result(&id), ResultState::NotRun);
        assert!(s.history(&id).is_none());
        assert!(!s.is_loading(&id));
    }

    #[test]
    fn run_local_query() {
        let mut s = store();
        let id = s.create_tab(None, Some("SELECT * FROM teams;"));
        let stub = StubFetcher::default();

        let outcome = s.run_query_blocking(&id, &stub, BASE).unwrap();
        assert!(outcome.fallback_reason.is_none());
        match s.result(&id) {
            ResultState::Ready(result) => assert_eq!(result.row_count, 4),
            other => panic!("unexpected result state: {:?}", other),
        }
        assert!(!s.is_loading(&id));
    }

    #[test]
    fn run_remote_query() {
        let mut s = store();
        let id = s.create_tab(None, Some("SELECT * FROM Products;"));
        let stub = StubFetcher::with(
            "http://data/products.csv",
            "productID,productName,unitPrice\n1,Chai,18\n2,Chang,19\n",
        );

        s.run_query_blocking(&id, &stub, BASE).unwrap();
        let ResultState::Ready(result) = s.result(&id) else {
            panic!("expected a result");
        };
        assert_eq!(result.row_count, 2);
        assert_eq!(result.columns[1].header, "PRODUCTNAME");
        assert_eq!(result.rows[0]["unitPrice"], Value::Int(18));
    }

    #[test]
    fn run_falls_back_to_canned_result() {
        let mut s = store();
        let id = s.create_tab(None, Some("SELECT * FROM Orders;"));
        let stub = StubFetcher::default();

        let outcome = s.run_query_blocking(&id, &stub, BASE).unwrap();
        assert!(outcome.fallback_reason.is_some());
        let ResultState::Ready(result) = s.result(&id) else {
            panic!("expected a result");
        };
        assert_eq!(result.columns[0].id, "placeholder");
        assert_eq!(result.row_count, 0);
    }

    #[test]
    fn unmatched_query_runs_first_predefined() {
        let mut s = store();
        let id = s.create_tab(None, Some("select 42"));
        let request = s.begin_run(&id).unwrap();
        assert_eq!(request.matched.id, "nw_customers");
        assert!(s.is_loading(&id));
    }

    #[test]
    fn unknown_id_resolves_to_limited_customers() {
        let body: String = std::iter::once("id".to_string())
            .chain((0..150).map(|i| i.to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        let stub = StubFetcher::with(&format!("{}/customers.csv", BASE), &body);
        let mut retired = predefined_queries()[0].clone();
        retired.id = "nw_regions";

        let request = RunRequest {
            tab_id: "t".to_string(),
            run_id: 1,
            source: catalog::source_for_id(&predefined_queries(), retired.id),
            matched: retired,
        };
        assert_eq!(request.source, catalog::UNKNOWN_QUERY_SOURCE);
        let outcome = execute_run(&request, &stub, BASE);
        assert_eq!(outcome.fallback_reason, None);
        assert_eq!(outcome.result.row_count, 100);
    }

    #[test]
    fn stale_and_orphaned_results_are_dropped() {
        let mut s = store();
        let id = s.create_tab(None, Some("SELECT * FROM teams;"));
        let stub = StubFetcher::default();

        let first = s.begin_run(&id).unwrap();
        let second = s.begin_run(&id).unwrap();
        assert!(!s.finish_run(execute_run(&first, &stub, BASE)));
        assert!(s.is_loading(&id));
        assert!(s.finish_run(execute_run(&second, &stub, BASE)));
        assert!(!s.is_loading(&id));

        let third = s.begin_run(&id).unwrap();
        s.close_tab(&id);
        assert!(!s.finish_run(execute_run(&third, &stub, BASE)));
        assert_eq!(s.result(&id), ResultState::NotRun);
    }

    #[test]
    fn run_pushes_changed_text_to_history() {
        let mut s = store();
        let id = s.create_tab(None, Some("SELECT * FROM teams;"));
        let stub = StubFetcher::default();

        s.run_query_blocking(&id, &stub, BASE);
        assert_eq!(s.history(&id).unwrap().entries.len(), 1);

        s.update_query(&id, "SELECT * FROM teams LIMIT 1;");
        s.run_query_blocking(&id, &stub, BASE);
        let history = s.history(&id).unwrap();
        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.index, Some(1));
    }

    #[test]
    fn history_back_and_forward() {
        let mut s = store();
        let id = s.create_tab(None, Some("q1"));
        s.update_query(&id, "q2");
        s.history_snapshot(&id);
        s.update_query(&id, "q3");
        s.history_snapshot(&id);

        assert!(s.can_history_back(&id));
        assert!(!s.can_history_forward(&id));

        s.history_back(&id);
        assert_eq!(tab_text(&s, &id), "q2");
        s.history_back(&id);
        assert_eq!(tab_text(&s, &id), "q1");
        assert!(!s.can_history_back(&id));

        // Out of range is a no-op.
        s.history_back(&id);
        assert_eq!(tab_text(&s, &id), "q1");

        s.history_forward(&id);
        s.history_forward(&id);
        assert_eq!(tab_text(&s, &id), "q3");
        s.history_forward(&id);
        assert_eq!(tab_text(&s, &id), "q3");
    }

    #[test]
    fn history_on_empty_tab_is_noop() {
        let mut s = store();
        let id = s.create_tab(None, None);
        s.history_back(&id);
        s.history_forward(&id);
        assert_eq!(tab_text(&s, &id), "");
        assert!(!s.can_history_back(&id));
        assert!(!s.can_history_forward(&id));
    }

    #[test]
    fn snapshot_skips_empty_and_duplicate() {
        let mut s = store();
        let id = s.create_tab(None, Some("q1"));
        s.history_snapshot(&id);
        s.update_query(&id, "");
        s.history_snapshot(&id);
        assert_eq!(s.history(&id).unwrap().entries, vec!["q1".to_string()]);
    }

    #[test]
    fn history_is_capped() {
        let mut s = QueryStore::new(predefined_queries(), None, 3);
        let id = s.create_tab(None, Some("q0"));
        for i in 1..6 {
            s.update_query(&id, &format!("q{}", i));
            s.history_snapshot(&id);
        }
        let history = s.history(&id).unwrap();
        assert_eq!(history.entries, vec!["q3", "q4", "q5"]);
        assert_eq!(history.index, Some(2));
    }

    #[test]
    fn clear_result_differs_from_not_run() {
        let mut s = store();
        let id = s.create_tab(None, None);
        assert_eq!(s.result(&id), ResultState::NotRun);
        s.clear_result(&id);
        assert_eq!(s.result(&id), ResultState::Cleared);
    }

    #[test]
    fn update_query_touches_timestamp_only_on_change() {
        let mut s = store();
        let id = s.create_tab(None, Some("a"));
        let before = s.tab(&id).unwrap().updated_at;
        s.update_query(&id, "a");
        assert_eq!(s.tab(&id).unwrap().updated_at, before);
        s.update_query(&id, "b");
        assert!(s.tab(&id).unwrap().updated_at >= before);
        assert_eq!(tab_text(&s, &id), "b");
    }

    #[test]
    fn saved_queries_are_prepended_and_deletable() {
        let mut s = store();
        let id = s.create_tab(Some(""), Some("SELECT 1;"));
        let first = s.save_current_query(&id).unwrap().id.clone();
        s.rename_tab(&id, "Mine");
        s.save_current_query(&id);

        let saved = s.saved_queries();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].title, "Mine");
        assert_eq!(saved[1].title, "Saved Query");

        s.delete_saved_query(&first);
        assert_eq!(s.saved_queries().len(), 1);
        assert_eq!(s.saved_queries()[0].title, "Mine");
    }

    #[test]
    fn structural_changes_are_written_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabs-v1.json");
        let mut s = QueryStore::new(predefined_queries(), Some(path.clone()), 100);

        let id = s.create_tab(Some("A"), Some("SELECT 1;"));
        assert!(!s.is_dirty());
        assert_eq!(load_tabs_from_path(&path).unwrap().tabs.len(), 1);

        s.update_query(&id, "SELECT 2;");
        assert!(s.is_dirty());
        assert_eq!(load_tabs_from_path(&path).unwrap().tabs[0].query, "SELECT 1;");

        s.flush();
        assert!(!s.is_dirty());
        assert_eq!(load_tabs_from_path(&path).unwrap().tabs[0].query, "SELECT 2;");
    }
}
