//! Feed pane: the visible window drawn as a grid (or list) of ad cards.
//!
//! Cards are a fixed number of terminal rows tall.  The pane scrolls by
//! whole rows: the feed's pixel offset is floored to the first row shown, so
//! a card at the top edge may be cut off partway.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use super::spinner::spinner_frame;
use super::theme::Theme;
use crate::core::{ad::Ad, feed::Feed, viewport::CELL_HEIGHT_PX};

/// Narrowest card worth drawing in grid mode.
pub const MIN_CARD_WIDTH: u16 = 36;
pub const MAX_COLUMNS: usize = 4;

/// How many cards fit side by side in `width` columns.
pub fn columns_for(width: u16, grid: bool) -> usize {
    if !grid {
        return 1;
    }
    ((width / MIN_CARD_WIDTH) as usize).clamp(1, MAX_COLUMNS)
}

/// Card height in terminal rows.
pub fn card_rows(feed: &Feed) -> usize {
    ((feed.config().card_height / CELL_HEIGHT_PX).round() as usize).max(1)
}

/// Area inside the pane border.
pub fn inner_area(area: Rect) -> Rect {
    area.inner(Margin::new(1, 1))
}

/// Which visible card sits under the terminal cell `(col, row)`.
pub fn card_at(inner: Rect, feed: &Feed, col: u16, row: u16) -> Option<usize> {
    if col < inner.x || row < inner.y || col >= inner.right() || row >= inner.bottom() {
        return None;
    }
    let columns = feed.columns();
    let card_width = (inner.width as usize / columns).max(1);
    let column = (col - inner.x) as usize / card_width;
    if column >= columns {
        return None;
    }
    let virtual_row = feed.viewport().first_row() + (row - inner.y) as usize;
    let index = (virtual_row / card_rows(feed)) * columns + column;
    (index < feed.visible_len()).then_some(index)
}

/// The feed pane widget.
pub struct FeedGrid<'a> {
    feed: &'a Feed,
    selected: usize,
    tick: u64,
    block: Option<Block<'a>>,
}

impl<'a> FeedGrid<'a> {
    pub fn new(feed: &'a Feed, selected: usize, tick: u64) -> Self {
        Self {
            feed,
            selected,
            tick,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for FeedGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.feed.visible_len() == 0 {
            render_empty_state(self.feed, self.tick, inner, buf);
            return;
        }

        let columns = self.feed.columns();
        let rows = card_rows(self.feed);
        let card_width = inner.width / columns as u16;
        let items: Vec<&Ad> = self.feed.visible_items().collect();
        let first_row = self.feed.viewport().first_row();

        for y in 0..inner.height {
            let virtual_row = first_row + y as usize;
            let card_row = virtual_row / rows;
            let line_in_card = virtual_row % rows;
            for column in 0..columns {
                let index = card_row * columns + column;
                let Some(ad) = items.get(index) else {
                    break;
                };
                let line = card_line(ad, line_in_card, rows, card_width, index == self.selected);
                let x = inner.x + column as u16 * card_width;
                buf.set_line(x, inner.y + y, &line, card_width);
            }
        }
    }
}

/// One terminal row of a card: top border with title, description lines,
/// link, click count and date, bottom border.
fn card_line(ad: &Ad, line: usize, rows: usize, width: u16, selected: bool) -> Line<'static> {
    let width = width as usize;
    let border = if selected {
        Theme::card_selected_border_style()
    } else {
        Theme::card_border_style()
    };
    // Room between "│ " and " │".
    let body = width.saturating_sub(4);

    if line == 0 {
        let title = truncate(&ad.title, width.saturating_sub(6));
        let fill = width.saturating_sub(title.chars().count() + 5);
        return Line::from(vec![
            Span::styled("╭─ ", border),
            Span::styled(title, Theme::card_title_style()),
            Span::styled(format!(" {}╮", "─".repeat(fill)), border),
        ]);
    }
    if line + 1 == rows {
        return Line::from(Span::styled(
            format!("╰{}╯", "─".repeat(width.saturating_sub(2))),
            border,
        ));
    }

    let description = wrap(&ad.description, body, 2);
    let (text, style) = match line {
        1 | 2 => (
            description.get(line - 1).cloned().unwrap_or_default(),
            Theme::card_text_style(),
        ),
        3 => (
            truncate(&format!("↗ {}", link_host(&ad.smart_link)), body),
            Theme::link_style(),
        ),
        4 => (
            truncate(
                &format!(
                    "{} clicks · {}",
                    ad.clicks,
                    ad.created_at.format("%b %-d, %Y")
                ),
                body,
            ),
            Theme::card_meta_style(),
        ),
        _ => (String::new(), Style::default()),
    };
    let pad = body.saturating_sub(text.chars().count());
    Line::from(vec![
        Span::styled("│ ", border),
        Span::styled(text, style),
        Span::styled(format!("{} │", " ".repeat(pad)), border),
    ])
}

fn render_empty_state(feed: &Feed, tick: u64, area: Rect, buf: &mut Buffer) {
    let (headline, detail) = if feed.is_loading() && feed.total_len() == 0 {
        (
            format!("{} Loading ads...", spinner_frame(tick)),
            "Please wait while we fetch the latest deals".to_string(),
        )
    } else if feed.total_len() == 0 {
        let detail = match feed.load_error() {
            Some(e) => format!("Could not load ads ({e}). Press r to retry."),
            None => "No ads have been added yet. Check back later for amazing deals!".into(),
        };
        ("Welcome to AdZone!".to_string(), detail)
    } else {
        (
            "No products found".to_string(),
            "Try adjusting your search terms".to_string(),
        )
    };

    let top = area.y + area.height.saturating_sub(3) / 2;
    let text_area = Rect::new(area.x, top, area.width, area.height.min(3));
    Paragraph::new(vec![
        Line::from(Span::styled(headline, Theme::empty_state_style())),
        Line::raw(""),
        Line::from(Span::styled(detail, Theme::hint_style())),
    ])
    .alignment(Alignment::Center)
    .render(text_area, buf);
}

// ───────────────────────────────────────── text helpers ──────

/// Shorten to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Greedy word wrap into at most `lines` lines of `width` characters; the
/// last line is truncated.
fn wrap(text: &str, width: usize, lines: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut words = text.split_whitespace().peekable();
    while let Some(word) = words.next() {
        let len = current.chars().count();
        if len == 0 || len + 1 + word.chars().count() <= width {
            if len > 0 {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        out.push(truncate(&current, width));
        if out.len() + 1 == lines {
            let rest: Vec<&str> = std::iter::once(word).chain(words).collect();
            out.push(truncate(&rest.join(" "), width));
            return out;
        }
        current = word.to_string();
    }
    if !current.is_empty() && out.len() < lines {
        out.push(truncate(&current, width));
    }
    out
}

/// Host part of a link for the card footer.
fn link_host(link: &str) -> &str {
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::sample_ad;
    use crate::core::feed::FeedConfig;
    use crate::core::ordering::XorShift64;

    fn feed(n: usize, columns: usize) -> Feed {
        let mut feed = Feed::new(
            FeedConfig {
                start_paused: true,
                ..FeedConfig::default()
            },
            Box::new(XorShift64::new(3)),
        );
        feed.mount();
        let generation = feed.begin_load();
        let ads = (0..n)
            .map(|i| sample_ad(i as i64 + 1, &format!("Ad {i}"), "A long description of the offer"))
            .collect();
        feed.apply_load(generation, Ok(ads));
        feed.set_layout(CELL_HEIGHT_PX * 12.0, columns);
        feed
    }

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn columns_follow_width_and_mode() {
        assert_eq!(columns_for(20, true), 1);
        assert_eq!(columns_for(80, true), 2);
        assert_eq!(columns_for(400, true), MAX_COLUMNS);
        assert_eq!(columns_for(400, false), 1);
    }

    #[test]
    fn hit_test_maps_cells_to_cards() {
        let mut feed = feed(8, 2);
        let inner = Rect::new(1, 1, 80, 12);
        assert_eq!(card_at(inner, &feed, 1, 1), Some(0));
        assert_eq!(card_at(inner, &feed, 45, 1), Some(1));
        assert_eq!(card_at(inner, &feed, 45, 7), Some(3));
        assert_eq!(card_at(inner, &feed, 0, 1), None);

        feed.scroll_by(crate::core::monitor::InputKind::Wheel, CELL_HEIGHT_PX * 6.0);
        assert_eq!(card_at(inner, &feed, 1, 1), Some(2));
    }

    #[test]
    fn renders_cards_and_the_welcome_state() {
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        FeedGrid::new(&feed(3, 1), 0, 0).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Ad "));
        assert!(text.contains("example.com"));

        let mut empty = Buffer::empty(area);
        FeedGrid::new(&feed(0, 1), 0, 0).render(area, &mut empty);
        assert!(buffer_text(&empty).contains("Welcome to AdZone!"));
    }

    #[test]
    fn search_with_no_match_says_so() {
        let mut feed = feed(3, 1);
        feed.set_search("zzz");
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        FeedGrid::new(&feed, 0, 0).render(area, &mut buf);
        assert!(buffer_text(&buf).contains("No products found"));
    }

    #[test]
    fn wrap_fills_two_lines_and_truncates_the_rest() {
        let lines = wrap("one two three four five six", 9, 2);
        assert_eq!(lines, vec!["one two".to_string(), "three fo…".to_string()]);
        assert_eq!(wrap("", 9, 2), Vec::<String>::new());
    }
}
