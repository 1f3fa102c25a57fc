//! The feed page: ordering, search, pagination, proximity loading and
//! autoscroll wired together.
//!
//! `Feed` is driven from the outside.  The event loop calls [`Feed::pump`]
//! whenever [`Feed::next_wake`] says something is due, forwards input through
//! [`Feed::user_input`] / [`Feed::scroll_by`], and reports pane geometry via
//! [`Feed::set_layout`].  After [`Feed::unmount`] every call is inert.

use std::time::{Duration, Instant};

use super::ad::Ad;
use super::filter::FilteredView;
use super::monitor::{InputKind, Interaction, InteractionMonitor};
use super::navigator::{
    AutoscrollNavigator, AutoscrollState, FrameOutcome, NavigatorConfig, FRAME_INTERVAL,
};
use super::ordering::{OrderedSet, RandomSource};
use super::store::StoreError;
use super::trigger::{ProximityTrigger, SentinelId, TriggerConfig};
use super::viewport::{ScrollSurface, Viewport, CELL_HEIGHT_PX};
use super::window::PaginationWindow;

/// Tunables for one feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedConfig {
    pub page_size: usize,
    pub advance_delay: Duration,
    pub trigger: TriggerConfig,
    pub navigator: NavigatorConfig,
    pub noise_threshold: f64,
    /// Rendered height of one card row, in pixels.
    pub card_height: f64,
    /// Begin with autoscroll paused by command.
    pub start_paused: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: super::window::DEFAULT_PAGE_SIZE,
            advance_delay: super::window::DEFAULT_ADVANCE_DELAY,
            trigger: TriggerConfig::default(),
            navigator: NavigatorConfig::default(),
            noise_threshold: super::monitor::DEFAULT_NOISE_THRESHOLD,
            card_height: 6.0 * CELL_HEIGHT_PX,
            start_paused: false,
        }
    }
}

pub struct Feed {
    config: FeedConfig,
    rng: Box<dyn RandomSource + Send>,
    /// Generation of the installed load.
    generation: u64,
    /// Generation handed to the most recent fetch.
    requested: u64,
    ordered: Option<OrderedSet>,
    search: String,
    window: PaginationWindow,
    trigger: ProximityTrigger,
    navigator: AutoscrollNavigator,
    monitor: InteractionMonitor,
    viewport: Viewport,
    columns: usize,
    loading: bool,
    load_error: Option<String>,
    sentinel_seq: SentinelId,
    mounted: bool,
}

impl Feed {
    pub fn new(config: FeedConfig, rng: Box<dyn RandomSource + Send>) -> Self {
        Self {
            config,
            rng,
            generation: 0,
            requested: 0,
            ordered: None,
            search: String::new(),
            window: PaginationWindow::new(config.page_size, config.advance_delay),
            trigger: ProximityTrigger::new(config.trigger),
            navigator: AutoscrollNavigator::new(config.navigator),
            monitor: InteractionMonitor::new(config.noise_threshold),
            viewport: Viewport::default(),
            columns: 1,
            loading: false,
            load_error: None,
            sentinel_seq: 0,
            mounted: false,
        }
    }

    // ── lifecycle ───────────────────────────────────────────────

    pub fn mount(&mut self) {
        self.mounted = true;
        if self.config.start_paused {
            self.navigator.start_paused();
        }
    }

    /// Release the frame, the observer and the page timer.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.navigator.teardown();
        self.trigger.disconnect();
        self.window.cancel();
        tracing::debug!("feed unmounted");
    }

    /// Start a fetch.  Returns the generation the result must carry.
    pub fn begin_load(&mut self) -> u64 {
        self.loading = true;
        self.requested += 1;
        self.requested
    }

    /// Install the result of the fetch tagged `generation`.  Only the most
    /// recent fetch is accepted; stale or post-unmount results are dropped.
    pub fn apply_load(&mut self, generation: u64, result: Result<Vec<Ad>, StoreError>) -> bool {
        if !self.mounted || generation != self.requested || generation <= self.generation {
            return false;
        }
        self.generation = generation;
        self.loading = false;

        let ordered = match result {
            Ok(ads) => {
                tracing::info!(count = ads.len(), generation, "ads loaded");
                self.load_error = None;
                OrderedSet::from_load(ads, generation, self.rng.as_mut())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load ads");
                self.load_error = Some(e.to_string());
                OrderedSet::empty(generation)
            }
        };
        self.ordered = Some(ordered);

        // Fresh session: back to the top, autoscroll may start again.
        self.navigator.reset();
        if self.config.start_paused {
            self.navigator.start_paused();
        }
        self.viewport.reset();
        self.monitor.rebase(0.0);
        self.refilter();
        true
    }

    // ── search ──────────────────────────────────────────────────

    /// Re-filter the current ordered set.  Never reshuffles.
    pub fn set_search(&mut self, term: &str) {
        if !self.mounted || self.search == term {
            return;
        }
        self.search = term.to_string();
        self.refilter();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    fn refilter(&mut self) {
        let view = match &self.ordered {
            Some(ordered) => FilteredView::new(ordered, &self.search),
            None => FilteredView::empty(),
        };
        if self.window.reset_if_source_changed(view) {
            self.viewport.reset();
            self.monitor.rebase(0.0);
            self.navigator.content_replaced();
        }
        self.sync_sentinel();
        self.sync_content_height();
    }

    // ── geometry ────────────────────────────────────────────────

    /// The renderer reports the pane height (pixels) and how many cards fit
    /// side by side.
    pub fn set_layout(&mut self, viewport_height: f64, columns: usize) {
        let before = self.viewport.scroll_offset();
        self.columns = columns.max(1);
        self.viewport.set_height(viewport_height);
        self.sync_content_height();
        // A resize clamp is not the user scrolling.
        if self.viewport.scroll_offset() != before {
            self.monitor.rebase(self.viewport.scroll_offset());
        }
    }

    fn sync_content_height(&mut self) {
        let rows = self.window.visible_len().div_ceil(self.columns);
        self.viewport
            .set_content_height(rows as f64 * self.config.card_height);
    }

    /// The sentinel exists exactly while more pages remain.
    fn sync_sentinel(&mut self) {
        if !self.mounted {
            return;
        }
        if self.window.has_more() {
            if !self.trigger.is_observing() {
                self.sentinel_seq += 1;
            }
            self.trigger.observe(self.sentinel_seq);
        } else {
            self.trigger.disconnect();
        }
    }

    // ── driving ─────────────────────────────────────────────────

    /// Run everything that is due at `now`.  Returns `true` when something
    /// visible changed.
    pub fn pump(&mut self, now: Instant) -> bool {
        if !self.mounted {
            return false;
        }
        let before = (self.window.visible_len(), self.viewport.scroll_offset());

        if self.window.poll(now) {
            self.sync_content_height();
            self.sync_sentinel();
        }

        self.trigger
            .evaluate(self.viewport.metrics(), &mut self.window, now);
        self.sync_content_height();
        self.sync_sentinel();

        self.navigator.start_if_ready(self.window.visible_len());
        self.navigator.set_content_growing(self.window.has_more());
        // Frames are paced by `next_wake`; a pump that finds one pending runs it.
        if let Some(handle) = self.navigator.pending_frame() {
            let outcome =
                self.navigator
                    .on_frame(handle, now, &mut self.viewport, &mut self.monitor);
            if outcome == FrameOutcome::Stopped {
                tracing::debug!("autoscroll loop finished");
            }
        }

        let offset = self.viewport.scroll_offset();
        if self.monitor.observe_position(offset, self.navigator.is_running())
            == Interaction::UserInteracted
        {
            self.navigator.user_interacted();
        }

        before != (self.window.visible_len(), self.viewport.scroll_offset())
            || self.window.is_loading()
    }

    /// When the event loop should call [`pump`](Feed::pump) next.
    pub fn next_wake(&self, now: Instant) -> Option<Instant> {
        if !self.mounted {
            return None;
        }
        let frame = self.navigator.pending_frame().map(|_| now + FRAME_INTERVAL);
        match (frame, self.window.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// A discrete input that hands control to the user.
    pub fn user_input(&mut self, kind: InputKind) {
        if !self.mounted {
            return;
        }
        if self.monitor.observe_input(kind) == Interaction::UserInteracted {
            self.navigator.user_interacted();
        }
    }

    /// User-driven scroll by `delta` pixels, caused by `kind`.  Pauses
    /// autoscroll first so the navigator stays the only writer while it runs.
    pub fn scroll_by(&mut self, kind: InputKind, delta: f64) {
        if !self.mounted {
            return;
        }
        self.user_input(kind);
        let target = self.viewport.scroll_offset() + delta;
        self.viewport.scroll_to(target);
        self.monitor.rebase(self.viewport.scroll_offset());
    }

    /// Jump so that card row `row` is in view.
    pub fn reveal_row(&mut self, row: usize) {
        if !self.mounted {
            return;
        }
        let top = row as f64 * self.config.card_height;
        let bottom = top + self.config.card_height;
        let offset = self.viewport.scroll_offset();
        let height = self.viewport.height();
        let target = if top < offset {
            top
        } else if bottom > offset + height {
            bottom - height
        } else {
            return;
        };
        self.user_input(InputKind::ScrollKey);
        self.viewport.scroll_to(target);
        self.monitor.rebase(self.viewport.scroll_offset());
    }

    pub fn pause_autoscroll(&mut self) {
        if self.mounted {
            self.navigator.pause();
        }
    }

    pub fn resume_autoscroll(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        self.monitor.rebase(self.viewport.scroll_offset());
        self.navigator.resume(self.window.visible_len())
    }

    /// Pause when running, resume otherwise.
    pub fn toggle_autoscroll(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        if self.navigator.is_running() {
            self.pause_autoscroll();
            false
        } else {
            self.resume_autoscroll()
        }
    }

    pub fn set_navigator_config(&mut self, config: NavigatorConfig) {
        self.config.navigator = config;
        self.navigator.set_config(config);
    }

    pub fn set_trigger_config(&mut self, config: TriggerConfig) {
        self.config.trigger = config;
        self.trigger.set_config(config);
    }

    // ── queries ─────────────────────────────────────────────────

    /// The ad at visible position `index`, for opening.  Registering the
    /// click is the caller's job.
    pub fn open(&self, index: usize) -> Option<Ad> {
        if !self.mounted || index >= self.window.visible_len() {
            return None;
        }
        self.window.source().get(index).cloned()
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &Ad> + '_ {
        self.window.visible_items()
    }

    pub fn visible_len(&self) -> usize {
        self.window.visible_len()
    }

    pub fn filtered_len(&self) -> usize {
        self.window.source().len()
    }

    pub fn total_len(&self) -> usize {
        self.ordered.as_ref().map_or(0, OrderedSet::len)
    }

    pub fn has_more(&self) -> bool {
        self.window.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.window.is_loading()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn autoscroll_state(&self) -> Option<AutoscrollState> {
        self.navigator.state()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.viewport.scroll_offset()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn is_observing_sentinel(&self) -> bool {
        self.trigger.is_observing()
    }

    /// Order of the current load, for tests and diagnostics.
    pub fn ordered_ids(&self) -> Vec<super::ad::AdId> {
        self.ordered
            .as_ref()
            .map(|o| o.items().iter().map(|a| a.id).collect())
            .unwrap_or_default()
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.unmount();
    }
}
