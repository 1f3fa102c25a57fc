//! Proximity trigger: asks the pagination window for the next page when the
//! sentinel row below the last card comes near the viewport.

use std::time::Instant;

use super::viewport::{ViewportMetrics, CELL_HEIGHT_PX};
use super::window::{AdvanceOutcome, PaginationWindow};

pub const DEFAULT_ROOT_MARGIN: f64 = 150.0;
pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// Identity of one sentinel lifetime.  A new id means a new element.
pub type SentinelId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    /// Distance the viewport is grown by on each edge before testing.
    pub root_margin: f64,
    /// Fraction of the sentinel that must overlap to count as visible.
    pub threshold: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            root_margin: DEFAULT_ROOT_MARGIN,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// No observer attached.
    Detached,
    /// Sentinel outside the armed region.
    Idle,
    /// Sentinel visible but the window is busy or exhausted.
    Suppressed,
    /// Asked the window for a page.
    Requested(AdvanceOutcome),
    /// Geometry unavailable; loaded eagerly instead.
    FailedOpen(AdvanceOutcome),
}

#[derive(Debug, Default)]
pub struct ProximityTrigger {
    config: TriggerConfig,
    observing: Option<SentinelId>,
}

impl ProximityTrigger {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            observing: None,
        }
    }

    /// Attach to `sentinel`.  Re-observing the same sentinel is a no-op.
    pub fn observe(&mut self, sentinel: SentinelId) {
        if self.observing == Some(sentinel) {
            return;
        }
        if let Some(old) = self.observing.take() {
            tracing::debug!(old, "sentinel observer detached");
        }
        tracing::debug!(sentinel, "sentinel observer attached");
        self.observing = Some(sentinel);
    }

    /// Release the observer.  Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(old) = self.observing.take() {
            tracing::debug!(old, "sentinel observer detached");
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observing.is_some()
    }

    pub fn set_config(&mut self, config: TriggerConfig) {
        self.config = config;
    }

    /// Test the sentinel against the viewport and request a page if it is in
    /// range.  Missing geometry fails open.
    pub fn evaluate(
        &self,
        metrics: Option<ViewportMetrics>,
        window: &mut PaginationWindow,
        now: Instant,
    ) -> TriggerOutcome {
        if self.observing.is_none() {
            return TriggerOutcome::Detached;
        }
        let Some(metrics) = metrics else {
            return TriggerOutcome::FailedOpen(window.advance_eager());
        };
        if !self.intersects(&metrics) {
            return TriggerOutcome::Idle;
        }
        if !window.has_more() || window.is_loading() {
            return TriggerOutcome::Suppressed;
        }
        TriggerOutcome::Requested(window.advance(now))
    }

    /// The sentinel is one row tall and sits right below the content.
    pub fn intersects(&self, metrics: &ViewportMetrics) -> bool {
        let top = metrics.content_height;
        let bottom = top + CELL_HEIGHT_PX;
        let root_top = metrics.scroll_offset - self.config.root_margin;
        let root_bottom =
            metrics.scroll_offset + metrics.viewport_height + self.config.root_margin;

        let overlap = bottom.min(root_bottom) - top.max(root_top);
        if overlap <= 0.0 {
            return false;
        }
        overlap / CELL_HEIGHT_PX >= self.config.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::sample_ad;
    use crate::core::filter::FilteredView;
    use crate::core::ordering::{OrderedSet, XorShift64};
    use crate::core::window::DEFAULT_ADVANCE_DELAY;
    use std::time::Duration;

    fn window(n: usize) -> PaginationWindow {
        let ads = (0..n).map(|i| sample_ad(i as i64, "t", "d")).collect();
        let set = OrderedSet::from_load(ads, 1, &mut XorShift64::new(1));
        let mut w = PaginationWindow::new(8, DEFAULT_ADVANCE_DELAY);
        w.initialize(FilteredView::new(&set, ""));
        w
    }

    fn metrics(offset: f64, content: f64) -> ViewportMetrics {
        ViewportMetrics {
            scroll_offset: offset,
            viewport_height: 400.0,
            content_height: content,
        }
    }

    #[test]
    fn fires_only_inside_the_margin() {
        let trigger = {
            let mut t = ProximityTrigger::new(TriggerConfig::default());
            t.observe(1);
            t
        };
        // Viewport bottom at 400, margin 150 → armed until 550.
        assert!(trigger.intersects(&metrics(0.0, 540.0)));
        assert!(!trigger.intersects(&metrics(0.0, 560.0)));
        assert!(trigger.intersects(&metrics(200.0, 700.0)));
    }

    #[test]
    fn requests_once_while_a_load_is_in_flight() {
        let t0 = Instant::now();
        let mut w = window(20);
        let mut trigger = ProximityTrigger::new(TriggerConfig::default());
        trigger.observe(1);

        let near = Some(metrics(0.0, 300.0));
        assert_eq!(
            trigger.evaluate(near, &mut w, t0),
            TriggerOutcome::Requested(AdvanceOutcome::Scheduled)
        );
        assert_eq!(trigger.evaluate(near, &mut w, t0), TriggerOutcome::Suppressed);
        w.poll(t0 + Duration::from_millis(300));
        assert_eq!(w.visible_len(), 16);
    }

    #[test]
    fn disconnected_trigger_never_fires() {
        let mut w = window(20);
        let mut trigger = ProximityTrigger::new(TriggerConfig::default());
        trigger.observe(1);
        trigger.disconnect();
        trigger.disconnect();
        assert_eq!(
            trigger.evaluate(Some(metrics(0.0, 10.0)), &mut w, Instant::now()),
            TriggerOutcome::Detached
        );
        assert_eq!(w.visible_len(), 8);
    }

    #[test]
    fn missing_geometry_fails_open() {
        let mut w = window(20);
        let mut trigger = ProximityTrigger::default();
        trigger.observe(3);
        assert_eq!(
            trigger.evaluate(None, &mut w, Instant::now()),
            TriggerOutcome::FailedOpen(AdvanceOutcome::Committed)
        );
        assert_eq!(w.visible_len(), 16);
    }

    #[test]
    fn far_sentinel_stays_idle() {
        let mut w = window(20);
        let mut trigger = ProximityTrigger::new(TriggerConfig::default());
        trigger.observe(1);
        assert_eq!(
            trigger.evaluate(Some(metrics(0.0, 2_000.0)), &mut w, Instant::now()),
            TriggerOutcome::Idle
        );
    }

    #[test]
    fn observe_is_idempotent_per_sentinel() {
        let mut trigger = ProximityTrigger::default();
        trigger.observe(1);
        trigger.observe(1);
        assert!(trigger.is_observing());
        trigger.observe(2);
        assert!(trigger.is_observing());
    }
}
