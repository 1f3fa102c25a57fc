//! A terminal ad feed.
//!
//! Ads are shuffled once per load, revealed page by page as the feed nears
//! its end, and scrolled hands-free until the user takes over.  `Ctrl+Shift+A`
//! (or `--admin`) opens the admin desk.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::{ActiveView, AppState},
    store_runtime::{self, StoreUpdate},
};
use crate::core::{
    feed::Feed,
    ordering::XorShift64,
    session::AdminGate,
    store::{AdStore, JsonFileStore, MemoryStore},
};
use crate::ui::{
    dashboard::Dashboard, feed_grid::FeedGrid, header::Header, layout::AppLayout, popup,
    spinner::BusyIndicator, theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Shuffled, self-scrolling ad feed")]
struct Cli {
    /// JSON store file (defaults to `$XDG_DATA_HOME/adzone/ads.json`).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Use a seeded in-memory store instead of a file.
    #[arg(long, conflicts_with = "store")]
    memory: bool,

    /// Fixed shuffle seed (reproducible order).
    #[arg(long)]
    seed: Option<u64>,

    /// Cards added per page.
    #[arg(long)]
    page_size: Option<usize>,

    /// Autoscroll speed in pixels per second.
    #[arg(long)]
    velocity: Option<f64>,

    /// Start with autoscroll paused.
    #[arg(long)]
    no_autoscroll: bool,

    /// Open the admin login right away.
    #[arg(long)]
    admin: bool,

    /// Write logs here instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // Never pollute stdout.
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn open_store(cli: &Cli) -> Result<Arc<dyn AdStore>> {
    if cli.memory {
        return Ok(Arc::new(MemoryStore::seeded()));
    }
    let path = cli.store.clone().unwrap_or_else(config::default_store_path);
    let store = JsonFileStore::open(&path)
        .with_context(|| format!("opening ad store {}", path.display()))?;
    tracing::info!(path = %store.path().display(), "store opened");
    Ok(Arc::new(store))
}

// ───────────────────────────────────────── drawing ───────────

fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    if matches!(
        state.active_view,
        ActiveView::Dashboard | ActiveView::AdForm | ActiveView::Confirm
    ) {
        frame.render_widget(
            Dashboard {
                state: &state.dashboard,
                tick: state.tick,
            },
            area,
        );
        match state.active_view {
            ActiveView::AdForm => {
                frame.render_widget(popup::AdFormPopup { form: &state.ad_form }, area);
            }
            ActiveView::Confirm => {
                if let Some(confirm) = &state.confirm {
                    let prompt = confirm.prompt();
                    frame.render_widget(popup::ConfirmPopup { prompt: &prompt }, area);
                }
            }
            _ => {}
        }
        return;
    }

    let layout = AppLayout::from_area(area);
    let state_label = state.feed.autoscroll_state().map_or("", |s| s.label());
    frame.render_widget(
        Header {
            feed: &state.feed,
            search_focused: state.search_focused,
            state_label,
        },
        layout.header_area,
    );

    let feed_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border_style());
    frame.render_widget(
        FeedGrid::new(&state.feed, state.selected, state.tick).block(feed_block),
        layout.feed_area,
    );
    frame.render_widget(
        BusyIndicator {
            visible: state.feed.is_loading() || state.feed.is_loading_more(),
            tick: state.tick,
            label: "loading",
        },
        layout.feed_area,
    );

    let hint = state.config.status_bar_hint();
    let status_text = state.status_message.as_deref().unwrap_or(&hint);
    frame.render_widget(
        Paragraph::new(status_text).style(Theme::status_bar_style()),
        layout.status_area,
    );

    match state.active_view {
        ActiveView::Preview => {
            if let Some(ad) = &state.preview {
                frame.render_widget(popup::PreviewPopup { ad }, area);
            }
        }
        ActiveView::AdminLogin => {
            frame.render_widget(popup::LoginPopup { form: &state.login }, area);
        }
        ActiveView::SettingsMenu => {
            frame.render_widget(
                popup::SettingsPopup {
                    state,
                    selected: state.settings_selected,
                },
                area,
            );
        }
        ActiveView::ControlsSubmenu => {
            frame.render_widget(
                popup::ControlsPopup {
                    config: &state.config,
                    selected: state.controls_selected,
                    awaiting_rebind: state.awaiting_rebind,
                },
                area,
            );
        }
        _ => {}
    }
}

/// Resolve at `deadline`, or never.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    // ── configuration & store ─────────────────────────────────
    let mut user_config = config::AppConfig::load();
    if let Some(page_size) = cli.page_size {
        user_config.page_size = page_size.max(1);
    }
    if let Some(velocity) = cli.velocity {
        user_config.autoscroll_velocity = velocity.max(1.0);
    }
    let mut feed_config = user_config.feed_config();
    feed_config.start_paused = cli.no_autoscroll;

    let store = open_store(&cli)?;
    let rng = match cli.seed {
        Some(seed) => XorShift64::new(seed),
        None => XorShift64::from_entropy(),
    };

    let mut feed = Feed::new(feed_config, Box::new(rng));
    feed.mount();
    let mut state = AppState::new(feed, AdminGate::from_env(), user_config);
    state.reload_feed();
    if cli.admin {
        state.open_admin();
    }

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    // ── async channels ────────────────────────────────────────
    let mut events = spawn_event_reader(Duration::from_millis(100));
    let (store_tx, mut store_rx) = mpsc::unbounded_channel::<StoreUpdate>();

    // ── event loop ────────────────────────────────────────────
    loop {
        let size = terminal.size()?;
        state.terminal_area = Rect::new(0, 0, size.width, size.height);
        state.sync_layout();

        // ── draw first ─────────────────────────────────────────
        terminal.draw(|frame| draw(frame, &state))?;

        for job in state.take_jobs() {
            store_runtime::dispatch(job, &store_tx, &store);
        }

        // Wake for the next page commit or autoscroll frame.
        let wake = if state.feed_active() {
            state.feed.next_wake(Instant::now())
        } else {
            None
        };

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m),
                    AppEvent::Resize => {}
                    AppEvent::Tick => state.tick = state.tick.wrapping_add(1),
                }
            }

            Some(update) = store_rx.recv() => {
                // Batch-drain everything already queued before redrawing.
                state.apply_update(update);
                while let Ok(update) = store_rx.try_recv() {
                    state.apply_update(update);
                }
            }

            _ = sleep_until(wake) => {}
        }

        if state.feed_active() {
            state.feed.pump(Instant::now());
            state.follow_viewport();
        }

        if state.should_quit {
            break;
        }
    }

    // ── teardown ──────────────────────────────────────────────
    state.feed.unmount();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
