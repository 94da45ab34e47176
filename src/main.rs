//! midishare - upload MIDI files to a JSON blob store from the terminal.
//!
//! # Usage
//!
//! ```bash
//! midishare                       # Interactive: browse for a file and upload it
//! midishare song.mid              # Interactive, with song.mid preselected
//! midishare --headless song.mid   # Upload and print the share link
//! ```
//!
//! Press `?` in the interactive UI for keyboard shortcuts.

use midishare::app::{App, AppMessage};
use midishare::i18n::LanguageCode;
use midishare::intake::{ChosenFile, IntakePipeline};
use midishare::preferences::{host_locale, FileStore, LanguagePreference};
use midishare::presenter::{error_message, success_message, SystemClipboard};
use midishare::session::{Phase, Session};
use midishare::ui;
use midishare::upload::{StorageClient, UploadController, DEFAULT_ENDPOINT};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Command-line options.
#[derive(Parser, Debug)]
#[command(name = "midishare")]
#[command(about = "Validate a MIDI file and share it through a JSON blob store")]
#[command(version)]
struct Cli {
    /// Blob store endpoint that accepts a JSON POST
    #[arg(long, env = "MIDISHARE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Display language; also saved as the preference
    #[arg(long, value_parser = parse_language)]
    lang: Option<LanguageCode>,

    /// Directory holding preferences.json
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Upload FILE without the interactive UI and print the share link
    #[arg(long, requires = "file")]
    headless: bool,

    /// Declared MIME type for FILE, instead of guessing from the extension
    #[arg(long)]
    mime: Option<String>,

    /// MIDI file to select on startup
    file: Option<PathBuf>,
}

fn parse_language(s: &str) -> Result<LanguageCode, String> {
    s.parse::<LanguageCode>().map_err(|e| e.to_string())
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let builder =
        tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env());

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let store = match &cli.config_dir {
        Some(dir) => FileStore::in_dir(dir),
        None => FileStore::default_location(),
    };
    tracing::debug!(path = %store.path().display(), "Preference store");

    let mut language = LanguagePreference::resolve_initial(Box::new(store), host_locale().as_deref());
    if let Some(lang) = cli.lang {
        language.set(lang);
    }

    let client = StorageClient::new(cli.endpoint.clone())
        .context("Failed to initialize HTTP client")?;
    let uploader = UploadController::new(client);
    let intake = IntakePipeline::default();

    if cli.headless {
        let Some(path) = cli.file.clone() else {
            bail!("--headless needs a FILE");
        };
        return Ok(run_headless(&cli, path, language.current(), &intake, &uploader).await);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let mut app = App::new(language, intake, uploader, Box::new(SystemClipboard), tx)
        .with_mime_override(cli.mime.clone());

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    if let Some(path) = cli.file.clone() {
        app.choose_path(path);
    }

    let result = run_app(&mut terminal, &mut app, rx).await;

    restore_terminal(&mut terminal)?;
    result?;
    Ok(ExitCode::SUCCESS)
}

/// Chooses and uploads one file without a UI. Prints the link on stdout.
async fn run_headless(
    cli: &Cli,
    path: PathBuf,
    lang: LanguageCode,
    intake: &IntakePipeline,
    uploader: &UploadController,
) -> ExitCode {
    let file = match &cli.mime {
        Some(mime) => ChosenFile::with_declared_type(path, mime.clone()),
        None => ChosenFile::from_path(path),
    };

    let mut session = Session::new();
    intake.on_file_chosen(&mut session, Some(file)).await;
    uploader.upload(&mut session).await;

    match (session.phase(), session.error()) {
        (Phase::Succeeded { location }, _) => {
            eprintln!("{}", success_message(lang, location));
            println!("{}", location);
            ExitCode::SUCCESS
        }
        (_, Some(error)) => {
            eprintln!("{}", error_message(lang, error));
            ExitCode::FAILURE
        }
        (phase, None) => {
            tracing::warn!(?phase, "Upload did not finish");
            ExitCode::FAILURE
        }
    }
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    mut messages: UnboundedReceiver<AppMessage>,
) -> Result<()> {
    // crossterm's reader blocks, so it gets its own thread. It polls so it
    // notices when the loop below has gone away.
    let (event_tx, mut events) = mpsc::unbounded_channel::<Event>();
    tokio::task::spawn_blocking(move || loop {
        if event_tx.is_closed() {
            break;
        }
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if event_tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {}
            Err(_) => break,
        }
    });

    let mut tick = tokio::time::interval(Duration::from_millis(100));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if app.should_quit {
            break;
        }

        tokio::select! {
            Some(ev) = events.recv() => {
                if let Event::Key(key) = ev {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        handle_key(app, key.code, key.modifiers);
                    }
                }
            }
            Some(message) = messages.recv() => app.handle_message(message),
            _ = tick.tick() => app.tick(),
        }
    }

    Ok(())
}

/// Handles a key press. Overlays take keys before the main screen.
fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_help {
        if matches!(code, KeyCode::Char('?') | KeyCode::Esc) {
            app.show_help = false;
        }
        return;
    }

    if app.file_browser.open {
        match code {
            KeyCode::Up | KeyCode::Char('k') => app.file_browser_up(),
            KeyCode::Down | KeyCode::Char('j') => app.file_browser_down(),
            KeyCode::Enter => app.file_browser_select(),
            KeyCode::Backspace => app.file_browser_parent(),
            KeyCode::Esc => app.file_browser_cancel(),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('o') | KeyCode::Enter => app.open_file_browser(),
        KeyCode::Char('u') => app.start_upload(),
        KeyCode::Char('r') => app.dismiss_error(),
        KeyCode::Char('c') => app.copy_link(),
        KeyCode::Char('l') => app.toggle_language(),
        _ => {}
    }
}
