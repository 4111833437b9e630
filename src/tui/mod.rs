//! Terminal dashboard
//!
//! Tabs for team weather and statistics, check-in history, problem tracking,
//! kudos and ideas. Reloads automatically when the data files change.

pub mod app;
pub mod events;
pub mod ui;

use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::prelude::*;

use crate::config::Config;
use crate::store::Store;
use app::App;
use events::handle_event;

/// Run the TUI application
pub fn run(store: Store, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Load before touching the terminal so errors print normally
    let mut app = App::new(store, config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app_inner(&mut terminal, &mut app);

    // Restore terminal even if the app failed
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    );
    let _ = terminal.show_cursor();

    result
}

/// True for changes to the collection files themselves, not temp files
fn is_data_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn run_app_inner<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = app.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let relevant = event.kind.is_modify() || event.kind.is_create();
                if relevant && event.paths.iter().any(|p| is_data_file(p)) {
                    let _ = tx.send(());
                }
            }
        },
        notify::Config::default(),
    )?;
    watcher.watch(&data_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!(dir = %data_dir.display(), "watching data directory");

    run_event_loop(terminal, app, rx)
}

fn run_event_loop<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    file_change_rx: mpsc::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if poll(timeout)? {
            match read()? {
                Event::Key(key) => {
                    if handle_event(app, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        // A burst of writes only needs one reload
        if file_change_rx.try_recv().is_ok() {
            while file_change_rx.try_recv().is_ok() {}
            app.on_data_changed();
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }
}
