//! Popup overlay widgets: settings, controls, link preview, admin login,
//! the ad editor and confirmations.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};

use super::theme::Theme;
use crate::app::form::{AdForm, LoginForm, AD_FIELD_LABELS};
use crate::app::settings::SETTINGS_ITEMS;
use crate::app::state::AppState;
use crate::config::{Action, AppConfig};
use crate::core::ad::Ad;

/// Rounded popup frame with a cyan title.  Clears `popup` and returns the
/// inner area.
fn frame(title: &str, popup: Rect, buf: &mut Buffer) -> Rect {
    Clear.render(popup, buf);
    let block = Block::default()
        .title(title.to_string())
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(popup);
    block.render(popup, buf);
    inner
}

fn row_styles(selected: bool) -> (&'static str, Style) {
    if selected {
        (
            " ▸ ",
            Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("   ", Style::default().fg(Color::White))
    }
}

// ───────────────────────────────────────── settings popup ────

/// Settings menu popup overlay.
pub struct SettingsPopup<'a> {
    pub state: &'a AppState,
    pub selected: usize,
}

impl Widget for SettingsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = (SETTINGS_ITEMS.len() as u16) + 6;
        let inner = frame(" Settings ", centered_fixed(44, height, area), buf);

        let mut lines = vec![Line::raw("")];
        for (i, item) in SETTINGS_ITEMS.iter().enumerate() {
            let (prefix, style) = row_styles(i == self.selected);
            match item.value(self.state) {
                None => lines.push(Line::from(Span::styled(
                    format!("{prefix}{}", item.label()),
                    style,
                ))),
                Some(value) => {
                    let value_style = match value.as_str() {
                        "ON" => Style::default().fg(Color::Green),
                        "OFF" => Style::default().fg(Color::DarkGray),
                        _ => Style::default().fg(Color::Yellow),
                    };
                    lines.push(Line::from(vec![
                        Span::styled(format!("{prefix}{:<22}", item.label()), style),
                        Span::styled(format!("  [{value}]"), value_style),
                    ]));
                }
            }
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Enter/Space: change  Esc: close",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── controls popup ────

/// Interactive controls / keybinding popup overlay.
pub struct ControlsPopup<'a> {
    pub config: &'a AppConfig,
    pub selected: usize,
    pub awaiting_rebind: bool,
}

impl Widget for ControlsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Action rows + 2 blanks + reset + hint + border.
        let height = (Action::ALL.len() as u16) + 7;
        let inner = frame(" Controls ", centered_fixed(52, height, area), buf);

        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = vec![Line::raw("")];

        // ── Action rows ─────────────────────────────────────────
        for (i, &action) in Action::ALL.iter().enumerate() {
            let is_selected = i == self.selected;
            let (prefix, base_style) = row_styles(is_selected);

            let keys_display = if is_selected && self.awaiting_rebind {
                "Press a key…".to_string()
            } else {
                self.config.display_bindings(action)
            };

            let key_style = if is_selected && self.awaiting_rebind {
                Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else if is_selected {
                Style::default().fg(Color::Yellow).bg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Yellow)
            };

            // Fixed-width columns: label left-aligned, keys right-aligned.
            let label_col = format!("{prefix}{:<22}", action.label());
            let keys_width = (inner.width as usize)
                .saturating_sub(label_col.chars().count())
                .max(1);
            let keys_col = format!("{keys_display:>keys_width$}");

            lines.push(Line::from(vec![
                Span::styled(label_col, base_style),
                Span::styled(keys_col, key_style),
            ]));
        }

        // ── Reset option ────────────────────────────────────────
        let (reset_prefix, reset_style) = row_styles(self.selected == Action::ALL.len());
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("{reset_prefix}⟳ Reset to defaults"),
            reset_style,
        )));

        // ── Hint bar ────────────────────────────────────────────
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Enter: add key  Del: clear  Esc: back",
            dim,
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── link preview ──────

pub struct PreviewPopup<'a> {
    pub ad: &'a Ad,
}

impl Widget for PreviewPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = frame(" Offer ", centered_fixed(64, 13, area), buf);
        let lines = vec![
            Line::from(Span::styled(self.ad.title.clone(), Theme::card_title_style())),
            Line::from(Span::styled(
                self.ad.description.clone(),
                Theme::card_text_style(),
            )),
            Line::raw(""),
            Line::from(Span::styled("Visit:", Theme::hint_style())),
            Line::from(Span::styled(self.ad.smart_link.clone(), Theme::link_style())),
            Line::raw(""),
            Line::from(Span::styled(
                format!("Listed {}", self.ad.created_at.format("%b %-d, %Y")),
                Theme::card_meta_style(),
            )),
            Line::raw(""),
            Line::from(Span::styled("Esc/Enter: close", Theme::hint_style())),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

// ───────────────────────────────────────── admin login ───────

pub struct LoginPopup<'a> {
    pub form: &'a LoginForm,
}

impl Widget for LoginPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = frame(" Admin Portal ", centered_fixed(48, 12, area), buf);
        let field = |label: &str, value: String, focused: bool| {
            let style = if focused {
                Theme::command_input_style()
            } else {
                Style::default().fg(Color::White)
            };
            let cursor = if focused { "▏" } else { "" };
            Line::from(vec![
                Span::styled(format!(" {label:<10}"), Theme::hint_style()),
                Span::styled(format!("{value}{cursor}"), style),
            ])
        };

        let mut lines = vec![
            Line::from(Span::styled(
                " Secure access to AdZone management",
                Theme::hint_style(),
            )),
            Line::raw(""),
            field("Username", self.form.username.clone(), self.form.focus == 0),
            field("Password", self.form.masked_password(), self.form.focus == 1),
            Line::raw(""),
        ];
        match &self.form.error {
            Some(e) => lines.push(Line::from(Span::styled(format!(" {e}"), Theme::error_style()))),
            None => lines.push(Line::from(Span::styled(
                " Demo credentials: admin / admin123",
                Theme::hint_style(),
            ))),
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            " Tab: next field  Enter: sign in  Esc: cancel",
            Theme::hint_style(),
        )));
        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── ad editor ─────────

pub struct AdFormPopup<'a> {
    pub form: &'a AdForm,
}

impl Widget for AdFormPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = frame(self.form.title(), centered_fixed(72, 14, area), buf);
        let value_width = (inner.width as usize).saturating_sub(16);

        let mut lines = vec![Line::raw("")];
        for (i, label) in AD_FIELD_LABELS.iter().enumerate() {
            let focused = i == self.form.focus;
            let (prefix, _) = row_styles(focused);
            let value = &self.form.fields[i];
            // Show the tail of long values so the cursor stays visible.
            let shown: String = {
                let count = value.chars().count();
                value.chars().skip(count.saturating_sub(value_width)).collect()
            };
            let style = if focused {
                Theme::command_input_style()
            } else {
                Style::default().fg(Color::White)
            };
            let cursor = if focused { "▏" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(format!("{prefix}{label:<13}"), Theme::hint_style()),
                Span::styled(format!("{shown}{cursor}"), style),
            ]));
        }
        lines.push(Line::raw(""));
        if let Some(e) = &self.form.error {
            lines.push(Line::from(Span::styled(format!("  {e}"), Theme::error_style())));
        } else {
            lines.push(Line::from(Span::styled(
                "  Blank fields get defaults; the smart link is required.",
                Theme::hint_style(),
            )));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Tab: next field  Enter: save  Esc: cancel",
            Theme::hint_style(),
        )));
        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── confirm ───────────

pub struct ConfirmPopup<'a> {
    pub prompt: &'a str,
}

impl Widget for ConfirmPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = frame(" Confirm ", centered_fixed(52, 7, area), buf);
        Paragraph::new(vec![
            Line::raw(""),
            Line::from(Span::styled(format!("  {}", self.prompt), Theme::card_title_style())),
            Line::raw(""),
            Line::from(Span::styled("  y: yes   n/Esc: no", Theme::hint_style())),
        ])
        .render(inner, buf);
    }
}

// ───────────────────────────────────────── helpers ───────────

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}
