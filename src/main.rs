mod shared;
mod tui;
mod audio_api;
mod audio;
mod beat;
mod canvas;
mod config;
mod logging;
mod middle;

use std::path::PathBuf;
use std::time::Duration;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use audio::CpalConnector;
use beat::transport::Transport;
use config::Config;
use middle::Middle;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let (mut config, config_err) = match config::load_config(&project_dir) {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    // still on a normal terminal here, so stderr is visible
    if !logging::init(&project_dir, &config.log_filter) {
        eprintln!(
            "beatline: could not open {}, logging disabled",
            logging::log_file_path(&project_dir).display()
        );
        if let Some(err) = &config_err {
            eprintln!("beatline: {err:#}, using defaults");
        }
    }
    if let Some(err) = config_err {
        warn!("{err:#}, using defaults");
    }
    info!(project = %project_dir.display(), "beatline starting");

    // the engine is opened lazily by the first beat, not here
    let rng = match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let connector = CpalConnector { master_gain: config.master_gain };
    let transport = Transport::new(Box::new(connector), rng);
    let mut middle = Middle::new(transport, config.line_thickness);

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    crossterm::execute!(
        std::io::stdout(),
        terminal::EnterAlternateScreen,
        EnableMouseCapture
    )?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(config.frame_interval_ms); // ~60fps
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        middle.tick();
        let ds = middle.display_state();
        tui_state.playing = ds.playing;

        term.draw(|frame| {
            tui_state.canvas_area = tui::view::render(frame, frame.area(), ds);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                // only the ui setting survives a restart
                config.line_thickness = middle.line_thickness();
                if let Err(err) = config::save_config(&project_dir, &config) {
                    warn!("could not save config: {err:#}");
                }
                middle.shutdown();
                info!("beatline quitting");
                drop(term);
                return Ok(());
            }
            middle.handle_input(event);
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
