//! Interaction monitor: tells user scrolling apart from autoscroll.
//!
//! The navigator writes the scroll offset every frame, so a plain "offset
//! changed" listener would pause it immediately.  The monitor remembers the
//! offset the navigator last wrote and only reports deltas it cannot
//! attribute to the navigator.

pub const DEFAULT_NOISE_THRESHOLD: f64 = 5.0;

/// Discrete inputs that always count as the user taking over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Wheel,
    TouchStart,
    PointerDown,
    ScrollKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    None,
    UserInteracted,
}

#[derive(Debug)]
pub struct InteractionMonitor {
    noise_threshold: f64,
    /// Offset last attributed to a known writer.
    baseline: f64,
}

impl InteractionMonitor {
    pub fn new(noise_threshold: f64) -> Self {
        Self {
            noise_threshold: noise_threshold.max(0.0),
            baseline: 0.0,
        }
    }

    /// The navigator just wrote `offset`.
    pub fn record_navigator_write(&mut self, offset: f64) {
        self.baseline = offset;
    }

    /// Adopt `offset` as the baseline without classifying it (reloads,
    /// resumes, layout clamps the user did not cause).
    pub fn rebase(&mut self, offset: f64) {
        self.baseline = offset;
    }

    /// Classify a polled offset.  While the navigator is running it is the
    /// sole writer and every delta is its own.
    pub fn observe_position(&mut self, offset: f64, navigator_running: bool) -> Interaction {
        if navigator_running {
            self.baseline = offset;
            return Interaction::None;
        }
        if (offset - self.baseline).abs() > self.noise_threshold {
            self.baseline = offset;
            Interaction::UserInteracted
        } else {
            Interaction::None
        }
    }

    pub fn observe_input(&mut self, kind: InputKind) -> Interaction {
        tracing::trace!(?kind, "user input");
        Interaction::UserInteracted
    }
}

impl Default for InteractionMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_while_paused_counts_as_user() {
        let mut m = InteractionMonitor::default();
        m.record_navigator_write(100.0);
        assert_eq!(m.observe_position(106.0, false), Interaction::UserInteracted);
    }

    #[test]
    fn delta_written_by_running_navigator_is_ignored() {
        let mut m = InteractionMonitor::default();
        m.record_navigator_write(100.0);
        assert_eq!(m.observe_position(106.0, true), Interaction::None);
        // The running delta became the new baseline.
        assert_eq!(m.observe_position(106.0, false), Interaction::None);
    }

    #[test]
    fn small_drift_is_noise() {
        let mut m = InteractionMonitor::default();
        m.rebase(40.0);
        assert_eq!(m.observe_position(44.0, false), Interaction::None);
        assert_eq!(m.observe_position(35.5, false), Interaction::None);
        assert_eq!(m.observe_position(34.0, false), Interaction::UserInteracted);
    }

    #[test]
    fn discrete_inputs_always_interact() {
        let mut m = InteractionMonitor::default();
        for kind in [
            InputKind::Wheel,
            InputKind::TouchStart,
            InputKind::PointerDown,
            InputKind::ScrollKey,
        ] {
            assert_eq!(m.observe_input(kind), Interaction::UserInteracted);
        }
    }
}
