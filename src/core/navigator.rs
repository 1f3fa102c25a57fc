//! Autoscroll navigator: moves the viewport at a fixed velocity on a
//! frame-synchronized loop.
//!
//! Speed is derived from wall-clock time between frames, never from a fixed
//! per-frame step, so the distance covered depends only on elapsed time.
//!
//! ```text
//!          first rows rendered
//!   Idle ──────────────────────▶ Running ──bottom──▶ StoppedAtBottom
//!                                 │   ▲
//!                  user input     │   │ resume()
//!                  or pause()     ▼   │
//!                          PausedByUser / PausedByCommand
//! ```

use std::time::{Duration, Instant};

use super::monitor::InteractionMonitor;
use super::viewport::ScrollSurface;

pub const DEFAULT_VELOCITY: f64 = 200.0;
pub const DEFAULT_BOTTOM_EPSILON: f64 = 10.0;
/// Frame spacing requested from the event loop (~60 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoscrollState {
    Running,
    PausedByUser,
    PausedByCommand,
    StoppedAtBottom,
}

impl AutoscrollState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "autoscroll",
            Self::PausedByUser => "paused (you scrolled)",
            Self::PausedByCommand => "paused",
            Self::StoppedAtBottom => "end of feed",
        }
    }
}

// ───────────────────────────────────────── frames ────────────

/// Handle of a scheduled frame.  Stale handles are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// Holds at most one scheduled frame.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    scheduled: Option<FrameHandle>,
}

impl FrameScheduler {
    /// Schedule a frame unless one is already pending.
    pub fn request(&mut self) -> FrameHandle {
        if let Some(handle) = self.scheduled {
            return handle;
        }
        self.next_id = self.next_id.wrapping_add(1);
        let handle = FrameHandle(self.next_id);
        self.scheduled = Some(handle);
        handle
    }

    /// Cancel the pending frame.  No-op when nothing is scheduled.
    pub fn cancel(&mut self) {
        self.scheduled = None;
    }

    /// Consume `handle` if it is the pending frame.
    pub fn take(&mut self, handle: FrameHandle) -> bool {
        if self.scheduled == Some(handle) {
            self.scheduled = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.scheduled
    }
}

// ───────────────────────────────────────── navigator ─────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigatorConfig {
    /// Pixels per second while running.
    pub velocity: f64,
    /// Distance from the end treated as the bottom.
    pub bottom_epsilon: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            velocity: DEFAULT_VELOCITY,
            bottom_epsilon: DEFAULT_BOTTOM_EPSILON,
        }
    }
}

/// What a frame callback did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Stale or cancelled frame; nothing happened.
    Skipped,
    /// Offset advanced to the contained value; next frame scheduled.
    Scrolled(f64),
    /// Reached the bottom; the loop is over.
    Stopped,
}

#[derive(Debug)]
pub struct AutoscrollNavigator {
    config: NavigatorConfig,
    /// `None` while idle (nothing rendered yet).
    state: Option<AutoscrollState>,
    /// Set by user interaction, cleared by an explicit resume.
    user_scrolled: bool,
    last_frame: Option<Instant>,
    frames: FrameScheduler,
    /// More content is still coming; reaching the end only waits.
    content_growing: bool,
    torn_down: bool,
}

impl AutoscrollNavigator {
    pub fn new(config: NavigatorConfig) -> Self {
        Self {
            config,
            state: None,
            user_scrolled: false,
            last_frame: None,
            frames: FrameScheduler::default(),
            content_growing: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> Option<AutoscrollState> {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == Some(AutoscrollState::Running)
    }

    pub fn user_scrolled(&self) -> bool {
        self.user_scrolled
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frames.pending()
    }

    pub fn set_config(&mut self, config: NavigatorConfig) {
        self.config = config;
    }

    /// While `true`, a frame at the end of content holds there instead of
    /// stopping the session.
    pub fn set_content_growing(&mut self, growing: bool) {
        self.content_growing = growing;
    }

    /// Leave the idle state once something is on screen.
    pub fn start_if_ready(&mut self, visible_items: usize) {
        if self.torn_down || self.state.is_some() || self.user_scrolled || visible_items == 0 {
            return;
        }
        tracing::debug!("autoscroll started");
        self.enter_running();
    }

    /// Start idle but already paused by command (`--no-autoscroll`).
    pub fn start_paused(&mut self) {
        if self.state.is_none() && !self.torn_down {
            self.state = Some(AutoscrollState::PausedByCommand);
        }
    }

    /// Run the frame identified by `handle`.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        now: Instant,
        surface: &mut dyn ScrollSurface,
        monitor: &mut InteractionMonitor,
    ) -> FrameOutcome {
        if self.torn_down || !self.is_running() || !self.frames.take(handle) {
            return FrameOutcome::Skipped;
        }

        let elapsed = self
            .last_frame
            .map(|prev| now.saturating_duration_since(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        // Content may have grown since the last frame.
        let max = surface.max_scroll_offset();
        let next = surface.scroll_offset() + self.config.velocity * elapsed;
        if next >= max - self.config.bottom_epsilon && !self.content_growing {
            tracing::debug!(offset = surface.scroll_offset(), max, "autoscroll reached bottom");
            self.state = Some(AutoscrollState::StoppedAtBottom);
            return FrameOutcome::Stopped;
        }

        surface.scroll_to(next);
        monitor.record_navigator_write(surface.scroll_offset());
        self.frames.request();
        FrameOutcome::Scrolled(surface.scroll_offset())
    }

    /// The user took over.  Permanent until an explicit resume.
    pub fn user_interacted(&mut self) {
        self.user_scrolled = true;
        if self.is_running() {
            tracing::debug!("autoscroll paused by user");
            self.frames.cancel();
            self.state = Some(AutoscrollState::PausedByUser);
        }
    }

    pub fn pause(&mut self) {
        if self.is_running() {
            tracing::debug!("autoscroll paused by command");
            self.frames.cancel();
            self.state = Some(AutoscrollState::PausedByCommand);
        }
    }

    /// Restart from the current offset.  Clears the user-scrolled flag.
    /// Returns `false` when there is nothing to resume.
    pub fn resume(&mut self, visible_items: usize) -> bool {
        if self.torn_down {
            return false;
        }
        match self.state {
            Some(AutoscrollState::Running) => true,
            Some(AutoscrollState::StoppedAtBottom) => false,
            Some(AutoscrollState::PausedByUser | AutoscrollState::PausedByCommand) | None => {
                self.user_scrolled = false;
                if visible_items == 0 {
                    self.state = None;
                    return false;
                }
                tracing::debug!("autoscroll resumed");
                self.enter_running();
                true
            }
        }
    }

    /// The visible list was replaced without a reload (a new search).  A
    /// stop at the old list's bottom no longer holds, so go back to idle and
    /// let the next render start again.  Pauses are kept.
    pub fn content_replaced(&mut self) {
        if self.state == Some(AutoscrollState::StoppedAtBottom) {
            tracing::debug!("visible list replaced, autoscroll rearmed");
            self.frames.cancel();
            self.state = None;
            self.last_frame = None;
        }
    }

    /// Forget the session (reload): back to idle.
    pub fn reset(&mut self) {
        self.frames.cancel();
        self.state = None;
        self.user_scrolled = false;
        self.last_frame = None;
    }

    /// Cancel the pending frame for good.
    pub fn teardown(&mut self) {
        self.frames.cancel();
        self.torn_down = true;
    }

    fn enter_running(&mut self) {
        self.state = Some(AutoscrollState::Running);
        self.last_frame = None;
        self.frames.request();
    }
}
