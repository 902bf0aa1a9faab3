mod api;
mod config;
mod models;
mod status;
mod tui;
mod view;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use api::QuotesClient;
use config::Config;
use tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit it with your intranet URL and session cookies, then run cotiza-tui.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("cotiza-tui — terminal UI for the cotizaciones admin backend");
        println!();
        println!("USAGE:");
        println!("  cotiza-tui           Start the TUI");
        println!("  cotiza-tui --init    Generate a default config file");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/cotiza-tui/config.toml");
        println!("  Or set env vars: COTIZA_URL and COTIZA_COOKIES");
        println!();
        println!("KEYBINDINGS:");
        println!("  j / k / Up / Down   Navigate rows");
        println!("  n / p               Next / previous page");
        println!("  /                   Incremental search");
        println!("  f                   Advanced filters");
        println!("  s / u               Field sort / urgency sort");
        println!("  m                   Only my quotes");
        println!("  Enter               View installments");
        println!("  d                   Delete (with confirmation)");
        println!("  r                   Reload from the backend");
        println!("  q / Ctrl+C          Quit");
        return Ok(());
    }

    init_tracing();

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `cotiza-tui --init` to generate a config file,\n\
         or set COTIZA_URL and COTIZA_COOKIES environment variables."
    })?;

    let client = QuotesClient::new(&config.base_url, &config.cookies, &config.csrf_cookie)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, client).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

/// The terminal owns stdout, so diagnostics go to a log file under the
/// cache dir, filtered by `COTIZA_LOG` (default `info`).
fn init_tracing() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("cotiza-tui")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("cotiza-tui.log"))
    else {
        return;
    };

    let filter =
        EnvFilter::try_from_env("COTIZA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: QuotesClient,
) -> Result<()> {
    let mut app = App::new(client);
    app.start_fetch();

    loop {
        app.frame_count = app.frame_count.wrapping_add(1);
        app.prune_notices();
        terminal.draw(|f| tui::ui::render(f, &mut app))?;

        if let Some(event) = tui::event::poll_event(Duration::from_millis(100))? {
            if let Event::Key(KeyEvent {
                code, modifiers, ..
            }) = event
            {
                tui::event::handle_key(&mut app, code, modifiers);
            }
        }

        if !app.running {
            break;
        }

        // Apply completed background work without blocking.
        app.poll_fetch_result();
        app.poll_detail_result();
        app.poll_delete_result();

        if app.needs_refresh {
            app.needs_refresh = false;
            app.start_fetch();
        }
    }

    Ok(())
}
