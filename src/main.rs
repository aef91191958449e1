use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskmarket::app::AppState;
use taskmarket::config::{Backend, Config, Overrides};
use taskmarket::effects::EffectRunner;
use taskmarket::store::{HttpTaskStore, InMemoryTaskStore, TaskStore};
use taskmarket::ui::run_app;
use taskmarket::user::User;

/// Terminal client for the TaskMarket task marketplace.
#[derive(Debug, Parser)]
#[command(name = "taskmarket", version, about)]
struct Cli {
    /// Backend base URL, e.g. http://localhost:8001 (overrides TASKMARKET_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Use a local in-memory store with demo tasks instead of a backend
    #[arg(long)]
    offline: bool,

    /// Directory for taskmarket.log (overrides TASKMARKET_LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_logging(config: &Config) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;
    let appender = tracing_appender::rolling::never(&config.log_dir, "taskmarket.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // stdout belongs to the terminal UI
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taskmarket=info")),
        )
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env(Overrides {
        backend_url: cli.backend_url,
        log_dir: cli.log_dir,
        offline: cli.offline,
    })?;
    let _guard = init_logging(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let store: Arc<dyn TaskStore> = match &config.backend {
        Backend::Remote { base_url } => {
            info!(%base_url, "using remote backend");
            Arc::new(HttpTaskStore::new(base_url))
        }
        Backend::Offline => {
            info!("using offline demo store");
            Arc::new(InMemoryTaskStore::demo())
        }
    };

    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let effects = EffectRunner::new(store, runtime.handle().clone(), results_tx);
    let (mut state, init) = AppState::init(User::demo());
    effects.run(init);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut state, &effects, &mut results_rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(%err, "ui loop failed");
        eprintln!("{:?}", err);
    }
    info!("exiting");
    Ok(())
}
