//! Scrollable viewport model in virtual pixels.
//!
//! The feed pane is measured in pixels so motion can advance by fractions of
//! a terminal row between frames; the renderer divides by [`CELL_HEIGHT_PX`].

/// Height of one terminal row in virtual pixels.
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Anything whose vertical scroll offset can be read and written.
pub trait ScrollSurface {
    fn scroll_offset(&self) -> f64;
    /// Largest reachable offset for the content as it is *now*.
    fn max_scroll_offset(&self) -> f64;
    /// Move to `offset`, clamped to `0..=max_scroll_offset()`.
    fn scroll_to(&mut self, offset: f64);
}

/// Geometry snapshot used by the proximity trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_offset: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

/// The feed pane: height reported by the renderer, content height derived
/// from the visible window.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    offset: f64,
    height: f64,
    content_height: f64,
}

impl Viewport {
    pub fn set_height(&mut self, height: f64) {
        self.height = height.max(0.0);
        self.clamp();
    }

    pub fn set_content_height(&mut self, content_height: f64) {
        self.content_height = content_height.max(0.0);
        self.clamp();
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    /// `None` until the renderer has measured a non-empty pane.
    pub fn metrics(&self) -> Option<ViewportMetrics> {
        (self.height > 0.0).then_some(ViewportMetrics {
            scroll_offset: self.offset,
            viewport_height: self.height,
            content_height: self.content_height,
        })
    }

    /// First terminal row shown at the top of the pane.
    pub fn first_row(&self) -> usize {
        (self.offset / CELL_HEIGHT_PX).floor() as usize
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
    }

    fn clamp(&mut self) {
        self.offset = self.offset.clamp(0.0, self.max_scroll_offset());
    }
}

impl ScrollSurface for Viewport {
    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn max_scroll_offset(&self) -> f64 {
        (self.content_height - self.height).max(0.0)
    }

    fn scroll_to(&mut self, offset: f64) {
        self.offset = offset;
        self.clamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_clamped_to_content() {
        let mut v = Viewport::default();
        v.set_height(100.0);
        v.set_content_height(250.0);
        v.scroll_to(1_000.0);
        assert_eq!(v.scroll_offset(), 150.0);
        v.scroll_to(-5.0);
        assert_eq!(v.scroll_offset(), 0.0);

        v.scroll_to(150.0);
        v.set_content_height(120.0);
        assert_eq!(v.scroll_offset(), 20.0);
    }

    #[test]
    fn metrics_require_a_measured_pane() {
        let mut v = Viewport::default();
        assert!(v.metrics().is_none());
        v.set_height(64.0);
        assert!(v.metrics().is_some());
    }

    #[test]
    fn first_row_floors_partial_rows() {
        let mut v = Viewport::default();
        v.set_height(32.0);
        v.set_content_height(1_000.0);
        v.scroll_to(CELL_HEIGHT_PX * 3.0 + 7.5);
        assert_eq!(v.first_row(), 3);
    }
}
