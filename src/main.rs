mod api;
mod calendar;
mod config;
mod models;
mod tui;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use api::CalendarClient;
use config::Config;
use tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit server_url to point at your calendar server, then run unical.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("unical - A terminal client for the university calendar");
        println!();
        println!("USAGE:");
        println!("  unical           Start the TUI");
        println!("  unical --init    Generate a default config file");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/unical/config.toml");
        println!("  Or set env vars: UNICAL_SERVER_URL and UNICAL_AUTHOR");
        println!("  Logs: ~/.cache/unical/unical.log (level via RUST_LOG)");
        println!();
        println!("KEYBINDINGS:");
        println!("  h/j/k/l, arrows   Move the selected day");
        println!("  n / p             Next / previous month or week");
        println!("  m / w / v         Month view / week view / toggle");
        println!("  t                 Jump to today");
        println!("  Tab / Enter       Focus / open an event");
        println!("  c                 Create an event");
        println!("  a / A             Quick add for the day / the week");
        println!("  r                 Refresh");
        println!("  q / Ctrl+C        Quit");
        return Ok(());
    }

    init_logging();

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `unical --init` to generate a config file,\n\
         or set the UNICAL_SERVER_URL environment variable."
    })?;
    tracing::info!(server = %config.server_url, "starting");

    let client = CalendarClient::new(&config.server_url)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, client, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("unical")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("unical.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("unical=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: CalendarClient,
    config: Config,
) -> Result<()> {
    let mut app = App::new(client, config);
    app.load_events();

    loop {
        terminal.draw(|f| tui::ui::render(f, &app))?;

        if let Some(Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        })) = tui::event::poll_event(Duration::from_millis(100))?
        {
            tui::event::handle_key(&mut app, code, modifiers);
        }

        if !app.running {
            break;
        }

        // Apply finished requests without blocking.
        app.poll_outcomes();
        app.tick();
    }

    tracing::info!("exiting");
    Ok(())
}
