//! Admin dashboard: stats tiles, the ad table and the action hints.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use super::feed_grid::truncate;
use super::spinner::BusyIndicator;
use super::theme::Theme;
use crate::app::state::DashboardState;
use crate::core::ad::Ad;

const HINTS: &str = "n: new  e: edit  d: delete  R: reset  r: refresh  L: logout  Esc: back";

pub struct Dashboard<'a> {
    pub state: &'a DashboardState,
    pub tick: u64,
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // heading
                Constraint::Length(4), // stat tiles
                Constraint::Length(1), // top performer
                Constraint::Min(3),    // ad table
                Constraint::Length(1), // status
                Constraint::Length(1), // hints
            ])
            .split(area);

        Paragraph::new(vec![
            Line::from(Span::styled(" Admin Dashboard", Theme::title_style())),
            Line::from(Span::styled(
                " Manage your ads and track performance",
                Theme::hint_style(),
            )),
        ])
        .render(chunks[0], buf);

        render_tiles(self.state, chunks[1], buf);

        let top = match self.state.stats.as_ref().and_then(|s| s.top_performing.as_ref()) {
            Some(ad) => format!(" Top performer: {} ({} clicks)", ad.title, ad.clicks),
            None => String::new(),
        };
        Paragraph::new(Span::styled(top, Theme::card_meta_style())).render(chunks[2], buf);

        let table = Block::default()
            .title(format!(" All Ads ({}) ", self.state.ads.len()))
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_style(Theme::border_style());
        let table_inner = table.inner(chunks[3]);
        table.render(chunks[3], buf);
        BusyIndicator {
            visible: self.state.loading,
            tick: self.tick,
            label: "loading",
        }
        .render(chunks[3], buf);
        render_table(self.state, table_inner, buf);

        if let Some(status) = &self.state.status {
            Paragraph::new(Span::raw(format!(" {status}"))).render(chunks[4], buf);
        }
        Paragraph::new(Span::styled(format!(" {HINTS}"), Theme::hint_style()))
            .render(chunks[5], buf);
    }
}

fn render_tiles(state: &DashboardState, area: Rect, buf: &mut Buffer) {
    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);
    let (ads, clicks, average) = match &state.stats {
        Some(s) => (
            s.total_ads.to_string(),
            s.total_clicks.to_string(),
            format!("{:.1}", s.average_clicks_per_ad),
        ),
        None => ("–".into(), "–".into(), "–".into()),
    };
    for ((label, value), tile) in [("Total Ads", ads), ("Total Clicks", clicks), ("Avg Clicks/Ad", average)]
        .into_iter()
        .zip(tiles.iter())
    {
        Paragraph::new(Line::from(Span::styled(format!(" {value}"), Theme::card_title_style())))
            .block(
                Block::default()
                    .title(format!(" {label} "))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Theme::card_border_style()),
            )
            .render(*tile, buf);
    }
}

fn render_table(state: &DashboardState, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    if state.ads.is_empty() && !state.loading {
        Paragraph::new(vec![
            Line::from(Span::styled(" No ads yet", Theme::empty_state_style())),
            Line::from(Span::styled(
                " Get started by creating your first ad (n)",
                Theme::hint_style(),
            )),
        ])
        .render(area, buf);
        return;
    }

    let height = area.height as usize;
    // Keep the selected row in view.
    let offset = state.selected.saturating_sub(height.saturating_sub(1));
    for (row, (index, ad)) in state.ads.iter().enumerate().skip(offset).take(height).enumerate() {
        let style = if index == state.selected {
            Theme::selected_style()
        } else {
            Theme::card_text_style()
        };
        let line = Line::from(Span::styled(table_row(ad, area.width as usize), style));
        buf.set_line(area.x, area.y + row as u16, &line, area.width);
    }
}

/// `#id  title  clicks  date  link`, fitted to `width`.
fn table_row(ad: &Ad, width: usize) -> String {
    let fixed = format!(
        " #{:<4} {:>6} clicks  {}  ",
        ad.id,
        ad.clicks,
        ad.created_at.format("%Y-%m-%d")
    );
    let remaining = width.saturating_sub(fixed.chars().count());
    let title_width = remaining / 2;
    let link_width = remaining.saturating_sub(title_width + 1);
    format!(
        "{fixed}{:<title_width$} {}",
        truncate(&ad.title, title_width),
        truncate(&ad.smart_link, link_width)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::{sample_ad, AdStats};

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_stats_and_rows() {
        let mut top = sample_ad(2, "Bike", "");
        top.clicks = 5;
        let ads = vec![sample_ad(1, "Lamp", ""), top];
        let state = DashboardState {
            stats: Some(AdStats::from_ads(&ads)),
            ads,
            ..DashboardState::default()
        };
        let area = Rect::new(0, 0, 90, 20);
        let mut buf = Buffer::empty(area);
        Dashboard { state: &state, tick: 0 }.render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("All Ads (2)"));
        assert!(text.contains("2.5"));
        assert!(text.contains("Top performer: Bike"));
        assert!(text.contains("Lamp"));
    }

    #[test]
    fn empty_store_invites_creation() {
        let state = DashboardState::default();
        let area = Rect::new(0, 0, 90, 20);
        let mut buf = Buffer::empty(area);
        Dashboard { state: &state, tick: 0 }.render(area, &mut buf);
        assert!(buffer_text(&buf).contains("No ads yet"));
    }

    #[test]
    fn table_row_fits_width() {
        let ad = sample_ad(3, "A very long title that will not fit", "");
        assert!(table_row(&ad, 60).chars().count() <= 60);
    }
}
