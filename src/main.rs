use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{info, warn};

use ev_map::app::App;
use ev_map::config::Config;
use ev_map::logging::{init_logging, LogConfig};
use ev_map::{data, ui};

/// Proportional-symbol map of EV registrations by state, in the terminal
#[derive(Debug, Parser)]
#[command(name = "ev-map", version, about)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that relative dataset sources resolve against
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory holding Natural Earth basemap GeoJSON files
    #[arg(long)]
    basemap_dir: Option<PathBuf>,

    /// Year selected at startup
    #[arg(short, long)]
    year: Option<i32>,

    /// Log file (default: ev-map.log in the temp directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.basemap_dir {
        config.basemap_dir = dir;
    }
    if let Some(year) = args.year {
        config.default_year = year;
    }
    config.validate().context("invalid configuration")?;

    let log_config = LogConfig::from_verbosity(args.verbose).with_log_file(args.log_file);
    init_logging(&log_config)
        .with_context(|| format!("opening log file {}", log_config.log_file.display()))?;
    info!(datasets = config.datasets.len(), year = config.default_year, "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        warn!(error = %e, "exiting with error");
    }
    result
}

/// Handle mouse events for panning, zooming, hovering and the slider
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click on the slider selects a year, anywhere else starts a drag
        MouseEventKind::Down(MouseButton::Left) => {
            if !app.click_slider(mouse.column, mouse.row) {
                app.last_mouse = Some((mouse.column, mouse.row));
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if app.last_mouse.is_some() {
                app.handle_drag(mouse.column, mouse.row);
            } else {
                app.click_slider(mouse.column, mouse.row);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        MouseEventKind::Moved => app.hover(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // The alert blocks everything until dismissed
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Year slider
        KeyCode::Char(']') | KeyCode::Char('n') | KeyCode::Char('.') => app.next_year(),
        KeyCode::Char('[') | KeyCode::Char('p') | KeyCode::Char(',') => app.prev_year(),
        KeyCode::Home => app.first_year(),
        KeyCode::End => app.last_year(),

        // Overlay control
        KeyCode::Char(c @ '1'..='9') => app.toggle_layer(c as usize - '1' as usize),
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.map_renderer.toggle_states(),
        KeyCode::Char('t') | KeyCode::Char('T') => app.toggle_theme(),

        // Reset view
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &Config) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, &config.data_dir, size.width, size.height)?;
    app.spawn_loads();

    if config.basemap_dir.exists() {
        data::load_basemap(&mut app.map_renderer, &config.basemap_dir);
    }

    // Fall back to a rough outline if no basemap files were found
    if !app.map_renderer.has_data() {
        info!(dir = %config.basemap_dir.display(), "no basemap data, using built-in outline");
        data::generate_simple_basemap(&mut app.map_renderer);
    }

    loop {
        app.poll_loads();

        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) if app.alert.is_none() => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("quit");
    Ok(())
}
