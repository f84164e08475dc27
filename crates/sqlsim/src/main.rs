use std::env;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::info;

use sqlsim::app::App;
use sqlsim::catalog::predefined_queries;
use sqlsim::config;
use sqlsim::loader::HttpFetcher;
use sqlsim::logging;
use sqlsim::persistence::tabs_path;
use sqlsim::store::QueryStore;

fn print_version() {
    println!("sqlsim {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("sqlsim - A keyboard-first SQL simulator");
    eprintln!();
    eprintln!("Usage: sqlsim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help        Print this help message");
    eprintln!("  -V, --version     Print version information");
    eprintln!("      --offline     Do not fetch remote datasets (cached files only)");
    eprintln!("      --reset       Forget saved tabs and saved queries");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  SQLSIM_CONFIG_DIR Override the configuration directory");
    eprintln!("  {:<17} Log filter (e.g. sqlsim=debug)", logging::LOG_ENV);
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file: {}", path.display());
    }
    if let Some(path) = tabs_path() {
        eprintln!("  Tabs file:   {}", path.display());
    }
    if let Some(path) = config::log_path() {
        eprintln!("  Log file:    {}", path.display());
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    if args.iter().any(|a| a == "-V" || a == "--version") {
        print_version();
        return Ok(());
    }

    if let Some(unknown) = args
        .iter()
        .skip(1)
        .find(|a| !matches!(a.as_str(), "--offline" | "--reset"))
    {
        eprintln!("Unknown argument: {}", unknown);
        eprintln!();
        print_usage();
        std::process::exit(2);
    }

    // ~/.config/sqlsim/config.toml, then flags
    let mut cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {:#}", e);
        config::Config::default()
    });
    if args.iter().any(|a| a == "--offline") {
        cfg.data.offline = true;
    }

    if let Some(path) = config::log_path() {
        if let Err(e) = logging::init(&path) {
            eprintln!("Warning: Failed to initialize logging: {:#}", e);
        }
    }

    let store_path = if cfg.editor.persist_tabs {
        tabs_path()
    } else {
        None
    };
    if args.iter().any(|a| a == "--reset") {
        if let Some(path) = store_path.as_deref().filter(|p| p.exists()) {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            eprintln!("Removed {}", path.display());
        }
    }

    let mut store = QueryStore::new(
        predefined_queries(),
        store_path,
        cfg.editor.max_history_per_tab,
    );
    store.hydrate();

    let cache_dir = if cfg.data.cache_csv {
        config::csv_cache_dir()
    } else {
        None
    };
    let fetcher = HttpFetcher::new(
        Duration::from_secs(cfg.data.fetch_timeout_secs),
        cache_dir,
        cfg.data.offline,
    );
    info!(offline = cfg.data.offline, "starting");

    let rt = Runtime::new().context("failed to initialize tokio runtime")?;
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;

    let mut app = App::new(
        cfg,
        store,
        Arc::new(fetcher),
        rt.handle().clone(),
        events_tx,
        events_rx,
    );

    let res = app.run(&mut terminal);

    restore_terminal(terminal)?;

    res
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    // Needed to tell Ctrl+Enter apart from Enter.
    if supports_keyboard_enhancement().unwrap_or(false) {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    if supports_keyboard_enhancement().unwrap_or(false) {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
