//! Pagination window: the growing prefix of the filtered view that is
//! actually rendered.
//!
//! Advances are debounced: `advance` only arms a deadline, and `poll`
//! commits it once the deadline passes.  At most one advance is in flight.

use std::time::{Duration, Instant};

use super::filter::FilteredView;

pub const DEFAULT_PAGE_SIZE: usize = 8;
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(300);

/// Result of asking the window for another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A page commit is now pending.
    Scheduled,
    /// The window grew immediately (eager path).
    Committed,
    /// Another advance is already pending; nothing changed.
    InFlight,
    /// The whole source is visible; nothing changed.
    Exhausted,
}

#[derive(Debug)]
pub struct PaginationWindow {
    page_size: usize,
    advance_delay: Duration,
    source: FilteredView,
    visible: usize,
    has_more: bool,
    /// Deadline of the in-flight advance, if any.
    pending: Option<Instant>,
}

impl PaginationWindow {
    pub fn new(page_size: usize, advance_delay: Duration) -> Self {
        Self {
            page_size: page_size.max(1),
            advance_delay,
            source: FilteredView::empty(),
            visible: 0,
            has_more: false,
            pending: None,
        }
    }

    /// Show the first page of `source`.
    pub fn initialize(&mut self, source: FilteredView) {
        self.visible = source.len().min(self.page_size);
        self.has_more = source.len() > self.visible;
        self.source = source;
        self.cancel();
    }

    /// Keep the window when `source` is the view already shown, otherwise
    /// start over from the first page.  Returns `true` on reset.
    pub fn reset_if_source_changed(&mut self, source: FilteredView) -> bool {
        if self.source.is_same(&source) {
            self.has_more = self.source.len() > self.visible;
            return false;
        }
        self.initialize(source);
        true
    }

    /// Arm a page advance that commits after the debounce delay.
    pub fn advance(&mut self, now: Instant) -> AdvanceOutcome {
        if let Some(outcome) = self.guard() {
            return outcome;
        }
        if self.advance_delay.is_zero() {
            self.commit();
            return AdvanceOutcome::Committed;
        }
        self.pending = Some(now + self.advance_delay);
        tracing::debug!(visible = self.visible, "page advance scheduled");
        AdvanceOutcome::Scheduled
    }

    /// Grow right away, skipping the debounce.  Same guards as [`advance`].
    ///
    /// [`advance`]: PaginationWindow::advance
    pub fn advance_eager(&mut self) -> AdvanceOutcome {
        if let Some(outcome) = self.guard() {
            return outcome;
        }
        self.commit();
        AdvanceOutcome::Committed
    }

    /// Commit the pending advance if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(due) if now >= due => {
                self.pending = None;
                self.commit();
                true
            }
            _ => false,
        }
    }

    /// Drop the pending advance.  Safe to call when nothing is pending.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn visible_len(&self) -> usize {
        self.visible
    }

    pub fn source(&self) -> &FilteredView {
        &self.source
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &crate::core::ad::Ad> + '_ {
        self.source.iter().take(self.visible)
    }

    fn guard(&self) -> Option<AdvanceOutcome> {
        if self.pending.is_some() {
            Some(AdvanceOutcome::InFlight)
        } else if !self.has_more {
            Some(AdvanceOutcome::Exhausted)
        } else {
            None
        }
    }

    fn commit(&mut self) {
        self.visible = (self.visible + self.page_size).min(self.source.len());
        self.has_more = self.visible < self.source.len();
        tracing::debug!(visible = self.visible, has_more = self.has_more, "page committed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::sample_ad;
    use crate::core::ordering::{OrderedSet, XorShift64};

    fn view(n: usize) -> FilteredView {
        let ads = (0..n)
            .map(|i| sample_ad(i as i64, &format!("ad {i}"), if i % 2 == 0 { "even" } else { "odd" }))
            .collect();
        let set = OrderedSet::from_load(ads, 1, &mut XorShift64::new(5));
        FilteredView::new(&set, "")
    }

    fn window() -> PaginationWindow {
        PaginationWindow::new(DEFAULT_PAGE_SIZE, DEFAULT_ADVANCE_DELAY)
    }

    #[test]
    fn initialize_shows_first_page() {
        for (n, p) in [(0, 8), (3, 8), (8, 8), (9, 8), (20, 8), (5, 1)] {
            let mut w = PaginationWindow::new(p, DEFAULT_ADVANCE_DELAY);
            w.initialize(view(n));
            assert_eq!(w.visible_len(), n.min(p));
            assert_eq!(w.has_more(), n > w.visible_len());
        }
    }

    #[test]
    fn empty_source_has_nothing_more() {
        let mut w = window();
        w.initialize(view(0));
        assert_eq!(w.visible_len(), 0);
        assert!(!w.has_more());
        assert_eq!(w.advance(Instant::now()), AdvanceOutcome::Exhausted);
    }

    #[test]
    fn rapid_advances_grow_at_most_once() {
        let t0 = Instant::now();
        let mut w = window();
        w.initialize(view(20));

        assert_eq!(w.advance(t0), AdvanceOutcome::Scheduled);
        for ms in [1, 50, 120, 299] {
            assert_eq!(w.advance(t0 + Duration::from_millis(ms)), AdvanceOutcome::InFlight);
            assert!(!w.poll(t0 + Duration::from_millis(ms)));
        }
        assert!(w.poll(t0 + Duration::from_millis(300)));
        assert_eq!(w.visible_len(), 16);
        assert!(!w.is_loading());
    }

    #[test]
    fn twenty_items_in_pages_of_eight() {
        let t0 = Instant::now();
        let step = Duration::from_millis(300);
        let mut w = window();
        w.initialize(view(20));
        assert_eq!((w.visible_len(), w.has_more()), (8, true));

        w.advance(t0);
        w.poll(t0 + step);
        assert_eq!((w.visible_len(), w.has_more()), (16, true));

        w.advance(t0 + step);
        w.poll(t0 + step * 2);
        assert_eq!((w.visible_len(), w.has_more()), (20, false));

        assert_eq!(w.advance(t0 + step * 2), AdvanceOutcome::Exhausted);
        assert!(!w.poll(t0 + step * 10));
        assert_eq!(w.visible_len(), 20);
    }

    #[test]
    fn same_view_keeps_window_new_view_resets() {
        let t0 = Instant::now();
        let mut w = window();
        let v = view(20);
        w.initialize(v.clone());
        w.advance_eager();
        assert_eq!(w.visible_len(), 16);

        assert!(!w.reset_if_source_changed(v.clone()));
        assert_eq!(w.visible_len(), 16);

        let source_set = OrderedSet::from_load(
            (0..20).map(|i| sample_ad(i, "x", "")).collect(),
            2,
            &mut XorShift64::new(5),
        );
        w.advance(t0);
        assert!(w.reset_if_source_changed(FilteredView::new(&source_set, "")));
        assert_eq!(w.visible_len(), 8);
        // The advance armed against the old view was dropped.
        assert!(!w.is_loading());
        assert!(!w.poll(t0 + Duration::from_secs(1)));
        assert_eq!(w.visible_len(), 8);
    }

    #[test]
    fn cancel_is_idempotent() {
        let t0 = Instant::now();
        let mut w = window();
        w.initialize(view(20));
        w.cancel();
        w.advance(t0);
        w.cancel();
        w.cancel();
        assert!(w.next_deadline().is_none());
        assert!(!w.poll(t0 + Duration::from_secs(5)));
        assert_eq!(w.visible_len(), 8);
    }

    #[test]
    fn zero_delay_commits_immediately() {
        let mut w = PaginationWindow::new(8, Duration::ZERO);
        w.initialize(view(10));
        assert_eq!(w.advance(Instant::now()), AdvanceOutcome::Committed);
        assert_eq!((w.visible_len(), w.has_more()), (10, false));
    }
}
