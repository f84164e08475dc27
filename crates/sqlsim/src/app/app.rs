use std::collections::HashMap;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use throbber_widgets_tui::{Throbber, ThrobberState, WhichUse, BRAILLE_SIX};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::state::{Focus, ResultsMode};
use crate::clipboard;
use crate::config::Config;
use crate::loader::Fetcher;
use crate::model::QueryResult;
use crate::results::ResultView;
use crate::store::{execute_run, QueryStore, ResultState, RunOutcome, RunRequest};
use crate::ui::{
    builtin_items, results_summary, ColumnsAction, ColumnsMenu, CommandPalette, DataGrid,
    GridKeyResult, GridState, HelpAction, HelpPopup, LinePrompt, PaletteAction, PaletteItem,
    PaletteResult, PromptAction, PromptKind, QueryEditor, ResultsChart, Sidebar, SidebarAction,
    TabBar, Toolbar,
};

const SIDEBAR_WIDTH: u16 = 34;
const EDITOR_HEIGHT: u16 = 8;

pub enum AppEvent {
    RunFinished(RunOutcome),
}

/// View state of one tab's result. Reset whenever a new result arrives.
#[derive(Default)]
struct TabView {
    view: ResultView,
    grid: GridState,
    mode: ResultsMode,
    /// Cached `view.visible_rows`, cleared when sort or filters change.
    rows: Option<Vec<usize>>,
}

impl TabView {
    fn ensure_rows(&mut self, result: &QueryResult) {
        if self.rows.is_none() {
            self.rows = Some(self.view.visible_rows(result));
        }
    }

    fn touch(&mut self) {
        self.rows = None;
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

pub struct App {
    pub config: Config,
    pub store: QueryStore,
    pub fetcher: Arc<dyn Fetcher>,

    pub rt: tokio::runtime::Handle,
    pub events_tx: mpsc::UnboundedSender<AppEvent>,
    pub events_rx: mpsc::UnboundedReceiver<AppEvent>,

    pub focus: Focus,
    pub editor: QueryEditor,
    pub prompt: LinePrompt,
    pub palette: Option<CommandPalette>,
    pub help: Option<HelpPopup>,
    pub columns_menu: ColumnsMenu,
    pub sidebar: Sidebar,
    pub sidebar_visible: bool,
    views: HashMap<String, TabView>,
    throbber: ThrobberState,

    pub last_status: Option<String>,
    pub last_error: Option<String>,
    last_flush: Instant,
}

impl App {
    pub fn new(
        config: Config,
        store: QueryStore,
        fetcher: Arc<dyn Fetcher>,
        rt: tokio::runtime::Handle,
        events_tx: mpsc::UnboundedSender<AppEvent>,
        events_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> Self {
        let sidebar_visible = config.display.sidebar_visible;
        let mut app = Self {
            config,
            store,
            fetcher,

            rt,
            events_tx,
            events_rx,

            focus: Focus::Editor,
            editor: QueryEditor::new(),
            prompt: LinePrompt::new(),
            palette: None,
            help: None,
            columns_menu: ColumnsMenu::default(),
            sidebar: Sidebar::new(),
            sidebar_visible,
            views: HashMap::new(),
            throbber: ThrobberState::default(),

            last_status: None,
            last_error: None,
            last_flush: Instant::now(),
        };
        app.sync_editor();
        app
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let save_interval = Duration::from_millis(self.config.editor.save_interval_ms);

        loop {
            self.drain_events();

            if self.last_flush.elapsed() >= save_interval {
                self.store.flush();
                self.last_flush = Instant::now();
            }
            if self.any_loading() {
                self.throbber.calc_next();
            }

            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }

        self.store.flush();
        Ok(())
    }

    fn active_id(&self) -> Option<String> {
        self.store.active_tab_id().map(str::to_string)
    }

    fn any_loading(&self) -> bool {
        self.store.tabs().iter().any(|t| self.store.is_loading(&t.id))
    }

    /// Load the active tab's text into the editor when it changed underneath.
    fn sync_editor(&mut self) {
        let active = self
            .store
            .active_tab()
            .map(|t| (t.id.clone(), t.query.clone()));
        match active {
            Some((id, query)) => self.editor.sync(Some(&id), &query),
            None => self.editor.sync(None, ""),
        }
    }

    // ----- events -----

    fn drain_events(&mut self) {
        while let Ok(ev) = self.events_rx.try_recv() {
            self.apply_event(ev);
        }
    }

    fn apply_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::RunFinished(outcome) => {
                let tab_id = outcome.tab_id.clone();
                let fallback = outcome.fallback_reason.clone();
                let rows = outcome.result.row_count;
                let ms = outcome.result.execution_ms;

                if !self.store.finish_run(outcome) {
                    return;
                }

                let mode = self.views.get(&tab_id).map(|v| v.mode).unwrap_or_default();
                self.views.insert(
                    tab_id,
                    TabView {
                        mode,
                        ..TabView::default()
                    },
                );

                self.last_status = Some(match fallback {
                    Some(reason) => format!("Load failed, showing sample data ({})", reason),
                    None => results_summary(rows, rows, ms),
                });
            }
        }
    }

    fn spawn_run(&self, request: RunRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        let base_url = self.config.data.base_url.clone();
        let tx = self.events_tx.clone();

        self.rt.spawn_blocking(move || {
            let outcome = execute_run(&request, fetcher.as_ref(), &base_url);
            let _ = tx.send(AppEvent::RunFinished(outcome));
        });
    }

    // ----- keys -----

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::CONTROL {
            return true;
        }

        // The error panel is modal: Enter or Esc dismisses, other keys are absorbed.
        if self.last_error.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.last_error = None;
            }
            return false;
        }

        if let Some(help) = self.help.as_mut() {
            if help.handle_key(key) == HelpAction::Close {
                self.help = None;
            }
            return false;
        }

        if let Some(palette) = self.palette.as_mut() {
            match palette.handle_key(key) {
                PaletteResult::Continue => {}
                PaletteResult::Cancelled => self.palette = None,
                PaletteResult::Selected(action) => {
                    self.palette = None;
                    return self.apply_palette_action(action);
                }
            }
            return false;
        }

        if self.columns_menu.active {
            self.handle_columns_key(key);
            return false;
        }

        if self.prompt.is_active() {
            return self.handle_prompt_key(key);
        }

        if let Some(quit) = self.handle_global_key(key) {
            return quit;
        }

        match self.focus {
            Focus::Editor => self.handle_editor_key(key),
            Focus::Grid => self.handle_grid_key(key),
            Focus::Sidebar => self.handle_sidebar_key(key),
        }
        false
    }

    /// Keys that work from every pane. `None` when the key was not one of them.
    fn handle_global_key(&mut self, key: KeyEvent) -> Option<bool> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) if ctrl => self.run_active(),
            (KeyCode::F(5), _) => self.run_active(),
            (KeyCode::F(1), _) => self.help = Some(HelpPopup::new()),
            (KeyCode::Char('n'), KeyModifiers::CONTROL) => self.new_tab(),
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => self.close_active_tab(),
            (KeyCode::Char('l'), KeyModifiers::CONTROL) => self.clear_active(),
            (KeyCode::Char('p'), KeyModifiers::CONTROL) => self.open_palette(),
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => self.save_active_query(),
            (KeyCode::Char('y'), KeyModifiers::CONTROL) => self.copy_sql(),
            (KeyCode::Char('b'), KeyModifiers::CONTROL) => self.toggle_sidebar(),
            (KeyCode::Left, KeyModifiers::ALT) => self.history_back(),
            (KeyCode::Right, KeyModifiers::ALT) => self.history_forward(),
            (KeyCode::Char(c @ '1'..='9'), KeyModifiers::ALT) => {
                let index = c as usize - '1' as usize;
                let id = self.store.tabs().get(index).map(|t| t.id.clone());
                if let Some(id) = id {
                    self.switch_tab(&id);
                }
            }
            (KeyCode::Tab, KeyModifiers::NONE) => {
                self.focus = self.focus.next(self.sidebar_visible);
            }
            (KeyCode::BackTab, _) => {
                self.focus = self.focus.prev(self.sidebar_visible);
            }
            _ => return None,
        }
        Some(false)
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.focus = Focus::Grid;
            return;
        }
        let Some(id) = self.active_id() else {
            return;
        };
        self.sync_editor();
        if self.editor.input(key) {
            let text = self.editor.text();
            self.store.update_query(&id, &text);
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('?') {
            self.help = Some(HelpPopup::new());
            return;
        }
        let action =
            self.sidebar
                .handle_key(key, self.store.predefined(), self.store.saved_queries());
        match action {
            SidebarAction::None => {}
            SidebarAction::OpenPredefined(id) => self.open_predefined(id),
            SidebarAction::OpenSaved(id) => self.open_saved(&id),
            SidebarAction::DeleteSaved(id) => {
                self.store.delete_saved_query(&id);
                self.sidebar.clamp(self.store.saved_queries().len());
                self.last_status = Some("Saved query deleted".to_string());
            }
            SidebarAction::Search => {
                let current = self.sidebar.search.clone();
                self.prompt.open(PromptKind::SidebarSearch, &current);
            }
            SidebarAction::FocusEditor => self.focus = Focus::Editor,
        }
    }

    fn handle_grid_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('?') => {
                self.help = Some(HelpPopup::new());
                return;
            }
            KeyCode::Esc => return,
            _ => {}
        }
        let Some(id) = self.active_id() else {
            return;
        };

        let action = match self.store.result(&id) {
            ResultState::Ready(result) => {
                let tab_view = self.views.entry(id.clone()).or_default();
                tab_view.ensure_rows(result);
                let rows = tab_view.rows.as_ref().map_or(0, Vec::len);
                let cols = tab_view.view.visible_columns(result).len();
                tab_view.grid.handle_key(key, rows, cols)
            }
            // Without a result only leaving the grid is meaningful.
            _ => match key.code {
                KeyCode::Char('i') | KeyCode::Enter => GridKeyResult::FocusEditor,
                KeyCode::Char(':') => GridKeyResult::OpenCommand,
                _ => GridKeyResult::None,
            },
        };

        match action {
            GridKeyResult::None => {}
            GridKeyResult::FocusEditor => self.focus = Focus::Editor,
            GridKeyResult::OpenCommand => self.prompt.open(PromptKind::Command, ""),
            GridKeyResult::ToggleSort => self.toggle_sort(&id),
            GridKeyResult::OpenFilter => self.open_filter(&id),
            GridKeyResult::ClearFilters => self.clear_filters(),
            GridKeyResult::OpenColumns => self.columns_menu.open(),
            GridKeyResult::ToggleChart => self.toggle_chart(),
            GridKeyResult::Export => self.export_csv(None),
            GridKeyResult::CopyCell => self.copy_cell(&id),
        }
    }

    fn handle_columns_key(&mut self, key: KeyEvent) {
        let Some(id) = self.active_id() else {
            self.columns_menu.close();
            return;
        };
        let ResultState::Ready(result) = self.store.result(&id) else {
            self.columns_menu.close();
            return;
        };
        match self.columns_menu.handle_key(key, result) {
            ColumnsAction::Continue => {}
            ColumnsAction::Close => self.columns_menu.close(),
            ColumnsAction::Toggle(column_id) => {
                let tab_view = self.views.entry(id).or_default();
                tab_view.view.toggle_column(&column_id);
            }
            ColumnsAction::Reset => {
                let tab_view = self.views.entry(id).or_default();
                tab_view.view.reset_columns();
            }
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> bool {
        let Some(kind) = self.prompt.kind.clone() else {
            return false;
        };
        match self.prompt.handle_key(key) {
            PromptAction::Continue => {
                if kind == PromptKind::SidebarSearch {
                    self.sidebar.set_search(&self.prompt.text());
                }
            }
            PromptAction::Cancel => {
                self.prompt.close();
                if kind == PromptKind::SidebarSearch {
                    self.sidebar.set_search("");
                }
            }
            PromptAction::Submit(text) => {
                self.prompt.close();
                match kind {
                    PromptKind::Command => return self.execute_command(text.trim()),
                    PromptKind::Filter { column_id } => self.apply_filter(&column_id, &text),
                    PromptKind::SidebarSearch => {
                        self.sidebar.set_search(&text);
                        self.focus = Focus::Sidebar;
                    }
                }
            }
        }
        false
    }

    fn execute_command(&mut self, cmd: &str) -> bool {
        if cmd.is_empty() {
            return false;
        }
        let Some(parts) = shlex::split(cmd) else {
            self.last_status = Some("Unbalanced quotes in command".to_string());
            return false;
        };
        let Some((command, args)) = parts.split_first() else {
            return false;
        };

        match command.as_str() {
            "q" | "quit" | "exit" => return true,
            "export" | "e" => self.export_csv(args.first().map(String::as_str)),
            "rename" => {
                let title = args.join(" ");
                match self.active_id() {
                    Some(_) if title.trim().is_empty() => {
                        self.last_status = Some("Usage: :rename <title>".to_string());
                    }
                    Some(id) => {
                        self.store.rename_tab(&id, title.trim());
                        self.last_status = Some(format!("Renamed tab to \"{}\"", title.trim()));
                    }
                    None => self.last_status = Some("No active tab".to_string()),
                }
            }
            "save" | "w" => self.save_active_query(),
            "help" | "h" => self.help = Some(HelpPopup::new()),
            _ => {
                self.last_status = Some(format!("Unknown command: {}", command));
            }
        }
        false
    }

    fn apply_palette_action(&mut self, action: PaletteAction) -> bool {
        match action {
            PaletteAction::RunQuery => self.run_active(),
            PaletteAction::NewTab => self.new_tab(),
            PaletteAction::CloseTab => self.close_active_tab(),
            PaletteAction::ClearQuery => self.clear_active(),
            PaletteAction::HistoryBack => self.history_back(),
            PaletteAction::HistoryForward => self.history_forward(),
            PaletteAction::SaveQuery => self.save_active_query(),
            PaletteAction::CopySql => self.copy_sql(),
            PaletteAction::ToggleSidebar => self.toggle_sidebar(),
            PaletteAction::ToggleChart => self.toggle_chart(),
            PaletteAction::ExportCsv => self.export_csv(None),
            PaletteAction::ClearFilters => self.clear_filters(),
            PaletteAction::ClearSort => {
                if let Some(tab_view) = self.active_view_mut() {
                    tab_view.view.clear_sort();
                    tab_view.touch();
                }
            }
            PaletteAction::ResetColumns => {
                if let Some(tab_view) = self.active_view_mut() {
                    tab_view.view.reset_columns();
                }
            }
            PaletteAction::Help => self.help = Some(HelpPopup::new()),
            PaletteAction::Quit => return true,
            PaletteAction::OpenPredefined(id) => self.open_predefined(id),
            PaletteAction::OpenSaved(id) => self.open_saved(&id),
            PaletteAction::SwitchTab(id) => self.switch_tab(&id),
        }
        false
    }

    // ----- actions -----

    fn active_view_mut(&mut self) -> Option<&mut TabView> {
        let id = self.active_id()?;
        Some(self.views.entry(id).or_default())
    }

    pub fn run_active(&mut self) {
        let Some(id) = self.active_id() else {
            self.last_status = Some("No active tab".to_string());
            return;
        };
        match self.store.begin_run(&id) {
            Some(request) => {
                self.last_status = Some(format!("Running {}...", request.matched.title));
                self.spawn_run(request);
            }
            None => self.last_status = Some("Nothing to run".to_string()),
        }
    }

    pub fn new_tab(&mut self) {
        self.store.create_tab(None, None);
        self.focus = Focus::Editor;
        self.sync_editor();
    }

    pub fn close_active_tab(&mut self) {
        let Some(id) = self.active_id() else {
            return;
        };
        self.store.close_tab(&id);
        self.views.remove(&id);
        self.columns_menu.close();
        self.sync_editor();
    }

    pub fn switch_tab(&mut self, id: &str) {
        self.store.set_active_tab(id);
        self.columns_menu.close();
        self.sync_editor();
    }

    /// Empty the active query and drop its result.
    pub fn clear_active(&mut self) {
        let Some(id) = self.active_id() else {
            return;
        };
        self.store.update_query(&id, "");
        self.store.clear_result(&id);
        self.views.remove(&id);
        self.sync_editor();
        self.last_status = Some("Cleared".to_string());
    }

    fn history_back(&mut self) {
        if let Some(id) = self.active_id() {
            self.store.history_back(&id);
            self.sync_editor();
        }
    }

    fn history_forward(&mut self) {
        if let Some(id) = self.active_id() {
            self.store.history_forward(&id);
            self.sync_editor();
        }
    }

    fn save_active_query(&mut self) {
        let Some(id) = self.active_id() else {
            return;
        };
        let title = self.store.save_current_query(&id).map(|q| q.title.clone());
        if let Some(title) = title {
            self.last_status = Some(format!("Saved \"{}\"", title));
        }
    }

    fn copy_sql(&mut self) {
        let text = self.store.active_tab().map(|t| t.query.clone()).unwrap_or_default();
        self.copy_to_clipboard(&text);
    }

    fn copy_cell(&mut self, id: &str) {
        let ResultState::Ready(result) = self.store.result(id) else {
            return;
        };
        let Some(tab_view) = self.views.get(id) else {
            return;
        };
        let row = tab_view
            .rows
            .as_ref()
            .and_then(|rows| rows.get(tab_view.grid.cursor_row))
            .copied();
        let columns = tab_view.view.visible_columns(result);
        let text = row
            .zip(columns.get(tab_view.grid.cursor_col))
            .and_then(|(row, column)| result.cell(row, column))
            .map(|v| v.to_string())
            .unwrap_or_default();
        self.copy_to_clipboard(&text);
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        match clipboard::copy_text(text) {
            Ok(()) => self.last_status = Some(clipboard::copied_message(text)),
            Err(e) => {
                warn!(error = %e, "clipboard copy failed");
                self.last_error = Some(format!("Failed to copy: {:#}", e));
            }
        }
    }

    fn toggle_sidebar(&mut self) {
        self.sidebar_visible = !self.sidebar_visible;
        if !self.sidebar_visible && self.focus == Focus::Sidebar {
            self.focus = Focus::Editor;
        }
    }

    fn toggle_chart(&mut self) {
        if let Some(tab_view) = self.active_view_mut() {
            tab_view.mode = tab_view.mode.toggle();
        }
    }

    fn toggle_sort(&mut self, id: &str) {
        let ResultState::Ready(result) = self.store.result(id) else {
            return;
        };
        let tab_view = self.views.entry(id.to_string()).or_default();
        let column_id = tab_view
            .view
            .visible_columns(result)
            .get(tab_view.grid.cursor_col)
            .map(|c| c.id.clone());
        if let Some(column_id) = column_id {
            tab_view.view.toggle_sort(result, &column_id);
            tab_view.touch();
        }
    }

    fn open_filter(&mut self, id: &str) {
        let ResultState::Ready(result) = self.store.result(id) else {
            return;
        };
        let tab_view = self.views.entry(id.to_string()).or_default();
        let Some(column) = tab_view
            .view
            .visible_columns(result)
            .get(tab_view.grid.cursor_col)
            .copied()
        else {
            return;
        };
        let current = tab_view.view.filter(&column.id).unwrap_or("").to_string();
        self.prompt.open(
            PromptKind::Filter {
                column_id: column.id.clone(),
            },
            &current,
        );
    }

    fn apply_filter(&mut self, column_id: &str, text: &str) {
        if let Some(tab_view) = self.active_view_mut() {
            tab_view.view.set_filter(column_id, text);
            tab_view.touch();
            tab_view.grid.cursor_row = 0;
            tab_view.grid.row_offset = 0;
        }
    }

    fn clear_filters(&mut self) {
        if let Some(tab_view) = self.active_view_mut() {
            tab_view.view.clear_filters();
            tab_view.touch();
            self.last_status = Some("Filters cleared".to_string());
        }
    }

    /// Write the visible rows and columns of the active result as CSV.
    pub fn export_csv(&mut self, path: Option<&str>) {
        match self.write_export(path) {
            Ok((path, rows)) => {
                info!(path = %path.display(), rows, "exported csv");
                self.last_status = Some(format!("Exported {} rows to {}", rows, path.display()));
            }
            Err(e) => self.last_error = Some(format!("{:#}", e)),
        }
    }

    fn write_export(&mut self, path: Option<&str>) -> Result<(PathBuf, usize)> {
        let id = self.active_id().context("No active tab")?;
        let ResultState::Ready(result) = self.store.result(&id) else {
            anyhow::bail!("No data to export");
        };
        let tab_view = self.views.entry(id).or_default();
        tab_view.ensure_rows(result);
        let rows = tab_view.rows.as_ref().map_or(0, Vec::len);
        let csv = tab_view.view.to_csv(result);

        let path = expand_home(path.unwrap_or(self.config.export.default_path.as_str()));
        std::fs::write(&path, csv)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok((path, rows))
    }

    fn open_palette(&mut self) {
        let mut items = builtin_items();
        items.extend(self.store.predefined().iter().map(|q| {
            PaletteItem::new(
                format!("Open query: {}", q.title),
                "",
                PaletteAction::OpenPredefined(q.id),
            )
        }));
        items.extend(self.store.saved_queries().iter().map(|q| {
            PaletteItem::new(
                format!("Open saved: {}", q.title),
                "",
                PaletteAction::OpenSaved(q.id.clone()),
            )
        }));
        items.extend(self.store.tabs().iter().map(|t| {
            PaletteItem::new(
                format!("Switch to tab: {}", t.title),
                "",
                PaletteAction::SwitchTab(t.id.clone()),
            )
        }));
        self.palette = Some(CommandPalette::new(items));
    }

    fn open_predefined(&mut self, id: &str) {
        let Some(query) = self.store.predefined().iter().find(|q| q.id == id) else {
            return;
        };
        let (title, sql) = (query.title, query.sql);
        self.store.create_tab(Some(title), Some(sql));
        self.focus = Focus::Editor;
        self.sync_editor();
    }

    fn open_saved(&mut self, id: &str) {
        let Some(saved) = self.store.saved_queries().iter().find(|q| q.id == id) else {
            return;
        };
        let (title, sql) = (saved.title.clone(), saved.sql.clone());
        self.store.create_tab(Some(&title), Some(&sql));
        self.focus = Focus::Editor;
        self.sync_editor();
    }

    // ----- drawing -----

    pub fn draw(&mut self, frame: &mut Frame) {
        self.sync_editor();
        let size = frame.area();

        let [header_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(size);

        frame.render_widget(Paragraph::new(self.header_line()), header_area);

        let main_area = if self.sidebar_visible {
            let [sidebar_area, main_area] = Layout::horizontal([
                Constraint::Length(SIDEBAR_WIDTH.min(body_area.width / 2)),
                Constraint::Min(10),
            ])
            .areas(body_area);
            self.sidebar.render(
                frame,
                sidebar_area,
                self.store.predefined(),
                self.store.saved_queries(),
                self.focus == Focus::Sidebar,
            );
            main_area
        } else {
            body_area
        };

        self.draw_main(frame, main_area);
        frame.render_widget(self.status_line(), status_area);

        if self.prompt.is_active() {
            let h = 3u16.min(size.height);
            let area = Rect {
                x: 0,
                y: size.height.saturating_sub(h),
                width: size.width,
                height: h,
            };
            let title = self.prompt.title();
            self.prompt.textarea.set_block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::Magenta)),
            );
            frame.render_widget(Clear, area);
            frame.render_widget(&self.prompt.textarea, area);
        }

        if self.columns_menu.active {
            if let Some(id) = self.active_id() {
                if let ResultState::Ready(result) = self.store.result(&id) {
                    let tab_view = self.views.entry(id).or_default();
                    self.columns_menu.render(frame, size, result, &tab_view.view);
                }
            }
        }

        if let Some(palette) = self.palette.as_mut() {
            palette.render(frame, size);
        }

        if let Some(help) = self.help.as_mut() {
            help.render(frame, size);
        }
    }

    fn header_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled(
                " sqlsim ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" SQL query simulator", Style::default().fg(Color::Gray)),
        ];
        if self.config.data.offline {
            spans.push(Span::styled(
                "  [offline]",
                Style::default().fg(Color::Yellow),
            ));
        }
        Line::from(spans)
    }

    fn draw_main(&mut self, frame: &mut Frame, area: Rect) {
        let [tabs_area, rest] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);

        let store = &self.store;
        let is_loading = |id: &str| store.is_loading(id);
        frame.render_widget(
            TabBar {
                tabs: store.tabs(),
                active: store.active_tab_id(),
                is_loading: &is_loading,
            },
            tabs_area,
        );

        let Some(id) = self.active_id() else {
            frame.render_widget(
                Paragraph::new("Create or select a query to begin.")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().borders(Borders::ALL)),
                rest,
            );
            return;
        };

        let error_height = if self.last_error.is_some() { 4 } else { 0 };
        let [toolbar_area, editor_area, error_area, results_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(EDITOR_HEIGHT),
            Constraint::Length(error_height),
            Constraint::Min(3),
        ])
        .areas(rest);

        frame.render_widget(self.toolbar(&id), toolbar_area);
        self.draw_editor(frame, editor_area);

        if let Some(err) = self.last_error.as_deref() {
            let error = Paragraph::new(err)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Error (Enter to dismiss)")
                        .border_style(Style::default().fg(Color::Red)),
                )
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false });
            frame.render_widget(error, error_area);
        }

        self.draw_results(frame, results_area, &id);
    }

    fn toolbar(&self, id: &str) -> Toolbar {
        let has_query = self
            .store
            .tab(id)
            .is_some_and(|t| !t.query.trim().is_empty());
        let has_result = matches!(self.store.result(id), ResultState::Ready(_));
        Toolbar {
            can_back: self.store.can_history_back(id),
            can_forward: self.store.can_history_forward(id),
            can_run: !self.store.is_loading(id),
            can_clear: has_query || has_result,
            can_copy: true,
        }
    }

    fn draw_editor(&mut self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Editor;
        let title = match self.store.active_tab() {
            Some(tab) if focused => format!("{} (Ctrl-Enter run, Esc results)", tab.title),
            Some(tab) => format!("{} (Tab to focus)", tab.title),
            None => String::new(),
        };
        let border = if focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let cursor = if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        self.editor.textarea.set_cursor_style(cursor);
        self.editor.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border),
        );
        frame.render_widget(&self.editor.textarea, area);
    }

    fn draw_results(&mut self, frame: &mut Frame, area: Rect, id: &str) {
        let focused = self.focus == Focus::Grid;

        if self.store.is_loading(id) {
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Results")
                .border_style(Style::default().fg(Color::DarkGray));
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let throbber = Throbber::default()
                .label("Running query...")
                .style(Style::default().fg(Color::Gray))
                .throbber_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .throbber_set(BRAILLE_SIX)
                .use_type(WhichUse::Spin);
            frame.render_stateful_widget(throbber, inner, &mut self.throbber);
            return;
        }

        let ResultState::Ready(result) = self.store.result(id) else {
            frame.render_widget(
                Paragraph::new("No results yet. Run a query to see results.")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title("Results")
                            .border_style(if focused {
                                Style::default().fg(Color::Cyan)
                            } else {
                                Style::default().fg(Color::DarkGray)
                            }),
                    ),
                area,
            );
            return;
        };

        let [summary_area, body_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(2)]).areas(area);

        let tab_view = self.views.entry(id.to_string()).or_default();
        tab_view.ensure_rows(result);
        let rows: &[usize] = tab_view.rows.as_deref().unwrap_or(&[]);

        let summary = results_summary(result.row_count, rows.len(), result.execution_ms);
        let hints = "c Columns  e Export CSV  v Chart ";
        let pad = (summary_area.width as usize).saturating_sub(summary.chars().count() + hints.len() + 1);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    format!(" {}", summary),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" ".repeat(pad)),
                Span::styled(hints, Style::default().fg(Color::DarkGray)),
            ])),
            summary_area,
        );

        match tab_view.mode {
            ResultsMode::Table => {
                let grid = DataGrid {
                    result,
                    view: &tab_view.view,
                    rows,
                    display: &self.config.display,
                    focused,
                };
                frame.render_stateful_widget(grid, body_area, &mut tab_view.grid);
            }
            ResultsMode::Chart => {
                let columns = tab_view.view.visible_columns(result);
                let column = columns
                    .get(tab_view.grid.cursor_col)
                    .or_else(|| columns.first())
                    .copied();
                match column {
                    Some(column) => frame.render_widget(
                        ResultsChart {
                            result,
                            view: &tab_view.view,
                            rows,
                            column,
                            start: tab_view.grid.row_offset,
                            focused,
                        },
                        body_area,
                    ),
                    None => frame.render_widget(
                        Paragraph::new("All columns hidden (c to choose columns)")
                            .block(Block::default().borders(Borders::ALL).title("Chart")),
                        body_area,
                    ),
                }
            }
        }
    }

    fn status_line(&self) -> Paragraph<'static> {
        let status = self.last_status.as_deref().unwrap_or("Ready");
        let text = format!(
            " {}  Tabs: {}  | {}",
            self.focus.label(),
            self.store.tabs().len(),
            status
        );
        Paragraph::new(Line::from(vec![
            Span::raw(text),
            Span::styled(
                "   F1 help  Ctrl-p palette  Ctrl-q quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .style(Style::default().fg(Color::Gray))
    }
}
