//! Header: product name, result count and the search bar.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::theme::Theme;
use crate::core::feed::Feed;

const SEARCH_PLACEHOLDER: &str = "Search for products and services...";

/// The count line above the cards.  `shown` is the filtered count.
pub fn result_count_text(total: usize, shown: usize, searching: bool) -> String {
    let plural = if shown == 1 { "" } else { "s" };
    if total == 0 {
        "No Products Available".to_string()
    } else if searching {
        format!("{shown} Search Result{plural}")
    } else {
        format!("{shown} Product{plural} Available")
    }
}

pub struct Header<'a> {
    pub feed: &'a Feed,
    pub search_focused: bool,
    /// Autoscroll / load state shown at the right edge.
    pub state_label: &'a str,
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let count = result_count_text(
            self.feed.total_len(),
            self.feed.filtered_len(),
            !self.feed.search().is_empty(),
        );
        let left = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_style())
            .title(Span::styled(" AdZone ", Theme::title_style()));
        Paragraph::new(Line::from(vec![
            Span::raw(format!(" {count}")),
            Span::styled(format!("  {}", self.state_label), Theme::hint_style()),
        ]))
        .block(left)
        .render(chunks[0], buf);

        let search_border = if self.search_focused {
            Theme::command_input_style()
        } else {
            Theme::border_style()
        };
        let search = self.feed.search();
        let text = if search.is_empty() && !self.search_focused {
            Span::styled(SEARCH_PLACEHOLDER, Theme::hint_style())
        } else if self.search_focused {
            Span::styled(format!("{search}▏"), Theme::command_input_style())
        } else {
            Span::raw(search.to_string())
        };
        Paragraph::new(Line::from(vec![Span::raw(" / "), text]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(search_border)
                    .title(" Search "),
            )
            .render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_line_matches_store_and_search_state() {
        assert_eq!(result_count_text(0, 0, false), "No Products Available");
        assert_eq!(result_count_text(0, 0, true), "No Products Available");
        assert_eq!(result_count_text(9, 1, true), "1 Search Result");
        assert_eq!(result_count_text(9, 0, true), "0 Search Results");
        assert_eq!(result_count_text(1, 1, false), "1 Product Available");
        assert_eq!(result_count_text(9, 9, false), "9 Products Available");
    }
}
