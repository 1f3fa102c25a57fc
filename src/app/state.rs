//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).
//! Handlers never touch the store directly: they queue [`StoreJob`]s which the
//! main loop dispatches, and results come back through [`AppState::apply_update`].

use ratatui::layout::Rect;

use super::form::{AdForm, LoginForm};
use super::store_runtime::{StoreJob, StoreUpdate};
use crate::config::AppConfig;
use crate::core::{
    ad::{Ad, AdId, AdStats},
    feed::Feed,
    session::AdminGate,
    viewport::CELL_HEIGHT_PX,
};
use crate::ui::{feed_grid, layout::AppLayout};

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Feed,
    /// Link preview over the feed.
    Preview,
    AdminLogin,
    Dashboard,
    AdForm,
    Confirm,
    SettingsMenu,
    ControlsSubmenu,
}

/// Destructive dashboard actions awaiting a yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Delete { id: AdId, title: String },
    Reset,
}

impl ConfirmAction {
    pub fn prompt(&self) -> String {
        match self {
            Self::Delete { title, .. } => format!("Delete \"{title}\"?"),
            Self::Reset => "Delete every ad and restart ids?".to_string(),
        }
    }
}

/// Admin dashboard data, reloaded after every mutation.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub ads: Vec<Ad>,
    pub stats: Option<AdStats>,
    pub selected: usize,
    pub loading: bool,
    /// Monotonic id used to ignore stale dashboard loads.
    pub generation: u64,
    pub status: Option<String>,
}

impl DashboardState {
    pub fn selected_ad(&self) -> Option<&Ad> {
        self.ads.get(self.selected)
    }
}

/// Top-level application state.
pub struct AppState {
    /// The feed page.
    pub feed: Feed,
    pub gate: AdminGate,
    /// User configuration (tunables and keybindings).
    pub config: AppConfig,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Which view / overlay is currently shown.
    pub active_view: ActiveView,
    /// Highlighted card, as a position in the visible window.
    pub selected: usize,
    /// `true` while keystrokes edit the search term.
    pub search_focused: bool,
    /// Ad shown in the link preview.
    pub preview: Option<Ad>,
    pub login: LoginForm,
    pub dashboard: DashboardState,
    pub ad_form: AdForm,
    pub confirm: Option<ConfirmAction>,
    /// Currently highlighted item in the settings menu.
    pub settings_selected: usize,
    /// Currently highlighted item in the controls submenu.
    pub controls_selected: usize,
    /// When `true`, the controls submenu is waiting for the user to press
    /// a key to rebind the action at `controls_selected`.
    pub awaiting_rebind: bool,
    /// Last known terminal size.
    pub terminal_area: Rect,
    /// Tick counter driving the spinner.
    pub tick: u64,
    jobs: Vec<StoreJob>,
}

impl AppState {
    pub fn new(feed: Feed, gate: AdminGate, config: AppConfig) -> Self {
        Self {
            feed,
            gate,
            config,
            should_quit: false,
            status_message: None,
            active_view: ActiveView::default(),
            selected: 0,
            search_focused: false,
            preview: None,
            login: LoginForm::default(),
            dashboard: DashboardState::default(),
            ad_form: AdForm::blank(),
            confirm: None,
            settings_selected: 0,
            controls_selected: 0,
            awaiting_rebind: false,
            terminal_area: Rect::default(),
            tick: 0,
            jobs: Vec::new(),
        }
    }

    // ── store jobs ──────────────────────────────────────────────

    pub fn queue(&mut self, job: StoreJob) {
        self.jobs.push(job);
    }

    pub fn take_jobs(&mut self) -> Vec<StoreJob> {
        std::mem::take(&mut self.jobs)
    }

    /// Fetch and reshuffle the feed.
    pub fn reload_feed(&mut self) {
        let generation = self.feed.begin_load();
        self.selected = 0;
        self.queue(StoreJob::LoadFeed { generation });
    }

    pub fn reload_dashboard(&mut self) {
        self.dashboard.generation = self.dashboard.generation.wrapping_add(1);
        self.dashboard.loading = true;
        let generation = self.dashboard.generation;
        self.queue(StoreJob::LoadDashboard { generation });
    }

    pub fn apply_update(&mut self, update: StoreUpdate) {
        match update {
            StoreUpdate::FeedLoaded { generation, result } => {
                let failed = result.as_ref().err().map(ToString::to_string);
                if self.feed.apply_load(generation, result) {
                    self.selected = 0;
                    self.status_message = failed.map(|e| format!("Could not load ads: {e}"));
                }
            }
            StoreUpdate::DashboardLoaded { generation, result } => {
                if generation != self.dashboard.generation {
                    return;
                }
                self.dashboard.loading = false;
                match result {
                    Ok((ads, stats)) => {
                        self.dashboard.selected =
                            self.dashboard.selected.min(ads.len().saturating_sub(1));
                        self.dashboard.ads = ads;
                        self.dashboard.stats = Some(stats);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to load dashboard");
                        self.dashboard.status = Some(format!("Could not load ads: {e}"));
                    }
                }
            }
            StoreUpdate::Mutated { result } => {
                match result {
                    Ok(message) => {
                        tracing::info!(%message, "admin mutation");
                        self.dashboard.status = Some(message);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "admin mutation failed");
                        self.dashboard.status = Some(e.to_string());
                    }
                }
                self.reload_dashboard();
            }
        }
    }

    // ── admin surface ───────────────────────────────────────────

    /// Secret entry point: the dashboard when a session exists, the login
    /// form otherwise.
    pub fn open_admin(&mut self) {
        if self.gate.is_logged_in() {
            self.enter_dashboard();
        } else {
            self.login.clear();
            self.active_view = ActiveView::AdminLogin;
        }
    }

    pub fn enter_dashboard(&mut self) {
        // The feed is hidden; hold it so no frame runs against a stale clock.
        self.feed.pause_autoscroll();
        self.search_focused = false;
        self.dashboard.status = None;
        self.active_view = ActiveView::Dashboard;
        self.reload_dashboard();
    }

    /// Back to the feed as a fresh page.
    pub fn leave_dashboard(&mut self, logout: bool) {
        if logout {
            self.gate.logout();
            self.status_message = Some("Logged out".into());
        }
        self.active_view = ActiveView::Feed;
        self.reload_feed();
    }

    /// Whether the feed is on screen and should be pumped.
    pub fn feed_active(&self) -> bool {
        matches!(
            self.active_view,
            ActiveView::Feed
                | ActiveView::Preview
                | ActiveView::AdminLogin
                | ActiveView::SettingsMenu
                | ActiveView::ControlsSubmenu
        )
    }

    // ── feed geometry ───────────────────────────────────────────

    /// Report the feed pane geometry for the current terminal size.
    pub fn sync_layout(&mut self) {
        let layout = AppLayout::from_area(self.terminal_area);
        let inner_height = layout.feed_area.height.saturating_sub(2);
        let inner_width = layout.feed_area.width.saturating_sub(2);
        let columns = feed_grid::columns_for(inner_width, self.config.grid_layout);
        self.feed
            .set_layout(f64::from(inner_height) * CELL_HEIGHT_PX, columns);
        self.clamp_selection();
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.feed.visible_len().saturating_sub(1));
    }

    /// Card rows in view, as `(first, last)` inclusive.
    pub fn rows_in_view(&self) -> (usize, usize) {
        let card_rows = feed_grid::card_rows(&self.feed);
        let viewport = self.feed.viewport();
        let top = viewport.first_row();
        let height = (viewport.height() / CELL_HEIGHT_PX).floor() as usize;
        let first = top / card_rows;
        let last = (top + height.max(1) - 1) / card_rows;
        (first, last)
    }

    /// Keep the highlight on screen while the feed moves underneath it.
    pub fn follow_viewport(&mut self) {
        let len = self.feed.visible_len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let columns = self.feed.columns();
        let (first, last) = self.rows_in_view();
        let row = self.selected / columns;
        if row < first {
            self.selected = (first * columns).min(len - 1);
        } else if row > last {
            self.selected = (last * columns).min(len - 1);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::ad::sample_ad;
    use crate::core::feed::FeedConfig;
    use crate::core::monitor::InputKind;
    use crate::core::ordering::XorShift64;
    use crate::core::store::StoreError;

    /// A mounted feed with `n` ads installed, autoscroll held.
    pub(crate) fn loaded_state(n: usize, dir: &std::path::Path) -> AppState {
        let config = FeedConfig {
            start_paused: true,
            ..FeedConfig::default()
        };
        let mut feed = Feed::new(config, Box::new(XorShift64::new(5)));
        feed.mount();
        let mut state = AppState::new(feed, AdminGate::new(dir.join("session")), AppConfig::default());
        state.terminal_area = Rect::new(0, 0, 80, 40);
        state.reload_feed();
        let jobs = state.take_jobs();
        let Some(StoreJob::LoadFeed { generation }) = jobs.first().cloned() else {
            panic!("expected a feed load job");
        };
        let ads = (0..n)
            .map(|i| sample_ad(i as i64 + 1, &format!("Ad {i}"), "text"))
            .collect();
        state.apply_update(StoreUpdate::FeedLoaded {
            generation,
            result: Ok(ads),
        });
        state.sync_layout();
        state
    }

    #[test]
    fn failed_feed_load_sets_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(3, dir.path());
        state.reload_feed();
        let Some(StoreJob::LoadFeed { generation }) = state.take_jobs().pop() else {
            panic!("expected a feed load job");
        };
        state.apply_update(StoreUpdate::FeedLoaded {
            generation,
            result: Err(StoreError::Unavailable("disk gone".into())),
        });
        assert_eq!(state.feed.visible_len(), 0);
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("disk gone")));
    }

    #[test]
    fn stale_dashboard_load_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(0, dir.path());
        state.reload_dashboard();
        let stale = state.dashboard.generation;
        state.reload_dashboard();
        state.apply_update(StoreUpdate::DashboardLoaded {
            generation: stale,
            result: Ok((vec![sample_ad(1, "Old", "")], AdStats::from_ads(&[]))),
        });
        assert!(state.dashboard.ads.is_empty());
        assert!(state.dashboard.loading);
    }

    #[test]
    fn mutation_reloads_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(0, dir.path());
        state.apply_update(StoreUpdate::Mutated {
            result: Err(StoreError::EmptyUpdate),
        });
        assert_eq!(state.dashboard.status.as_deref(), Some("No valid updates provided"));
        assert!(matches!(
            state.take_jobs().as_slice(),
            [StoreJob::LoadDashboard { .. }]
        ));
    }

    #[test]
    fn admin_entry_depends_on_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(0, dir.path());
        state.open_admin();
        assert_eq!(state.active_view, ActiveView::AdminLogin);

        state.gate.login("admin", "admin123").unwrap();
        state.active_view = ActiveView::Feed;
        state.open_admin();
        assert_eq!(state.active_view, ActiveView::Dashboard);

        state.take_jobs();
        state.leave_dashboard(true);
        assert!(!state.gate.is_logged_in());
        assert!(matches!(state.take_jobs().as_slice(), [StoreJob::LoadFeed { .. }]));
    }

    #[test]
    fn selection_follows_the_viewport() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(8, dir.path());
        state.terminal_area = Rect::new(0, 0, 80, 16);
        state.sync_layout();
        // 80 columns → two cards per row; 6-row cards in a 10-row pane.
        assert_eq!(state.feed.columns(), 2);
        state.feed
            .scroll_by(InputKind::ScrollKey, CELL_HEIGHT_PX * 12.0);
        state.follow_viewport();
        assert_eq!(state.rows_in_view().0, 2);
        assert_eq!(state.selected, 4);
    }
}
