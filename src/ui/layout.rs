//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Primary screen layout: header with search, the feed pane, and a bottom
/// status bar.
pub struct AppLayout {
    pub header_area: Rect,
    pub feed_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // title, result count, search bar
                Constraint::Min(3),    // feed pane (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            header_area: chunks[0],
            feed_area: chunks[1],
            status_area: chunks[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_pane_takes_the_remaining_rows() {
        let layout = AppLayout::from_area(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.header_area.height, 3);
        assert_eq!(layout.feed_area, Rect::new(0, 3, 80, 20));
        assert_eq!(layout.status_area.y, 23);
    }
}
