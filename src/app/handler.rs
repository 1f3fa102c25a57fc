//! Input handling: maps key/mouse events to state mutations.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::config::{Action, KeyBind};
use crate::core::monitor::InputKind;
use crate::core::viewport::CELL_HEIGHT_PX;
use crate::ui::{feed_grid, layout::AppLayout};

use super::form::{edit_line, AdForm, FormInput};
use super::settings::{SettingsItem, SETTINGS_ITEMS};
use super::state::{ActiveView, AppState, ConfirmAction};
use super::store_runtime::StoreJob;

/// Terminal rows moved per mouse-wheel notch.
const WHEEL_ROWS: f64 = 3.0;

/// Total selectable rows in the controls submenu (actions + "Reset").
pub fn controls_item_count() -> usize {
    Action::ALL.len() + 1
}

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Feed => handle_feed_key(state, key),
        ActiveView::Preview => handle_preview_key(state, key),
        ActiveView::AdminLogin => handle_login_key(state, key),
        ActiveView::Dashboard => handle_dashboard_key(state, key),
        ActiveView::AdForm => handle_ad_form_key(state, key),
        ActiveView::Confirm => handle_confirm_key(state, key),
        ActiveView::SettingsMenu => handle_settings_key(state, key),
        ActiveView::ControlsSubmenu => {
            if state.awaiting_rebind {
                handle_rebind_key(state, key);
            } else {
                handle_controls_key(state, key);
            }
        }
    }
}

// ── Feed view (configurable bindings) ───────────────────────────

fn handle_feed_key(state: &mut AppState, key: KeyEvent) {
    if state.search_focused {
        handle_search_key(state, key);
        return;
    }

    // Navigation keys that should always work in the feed.
    match key.code {
        KeyCode::Home => {
            let offset = state.feed.scroll_offset();
            state.feed.scroll_by(InputKind::ScrollKey, -offset);
            state.selected = 0;
            return;
        }
        KeyCode::End => {
            let content = state.feed.viewport().content_height();
            state.feed.scroll_by(InputKind::ScrollKey, content);
            state.selected = state.feed.visible_len().saturating_sub(1);
            return;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            move_selection(state, -1);
            return;
        }
        KeyCode::Right | KeyCode::Char('l') => {
            move_selection(state, 1);
            return;
        }
        KeyCode::Esc if !state.feed.search().is_empty() => {
            state.feed.set_search("");
            state.selected = 0;
            return;
        }
        _ => {}
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };

    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::OpenSettings => {
            state.active_view = ActiveView::SettingsMenu;
            state.settings_selected = 0;
        }
        Action::MoveUp => {
            state.feed.user_input(InputKind::ScrollKey);
            let columns = state.feed.columns() as isize;
            move_selection(state, -columns);
        }
        Action::MoveDown => {
            state.feed.user_input(InputKind::ScrollKey);
            let columns = state.feed.columns() as isize;
            move_selection(state, columns);
        }
        Action::PageUp => {
            let height = state.feed.viewport().height();
            state.feed.scroll_by(InputKind::ScrollKey, -height);
            state.follow_viewport();
        }
        Action::PageDown => {
            let height = state.feed.viewport().height();
            state.feed.scroll_by(InputKind::ScrollKey, height);
            state.follow_viewport();
        }
        Action::OpenAd => open_selected(state),
        Action::ToggleAutoscroll => {
            state.feed.toggle_autoscroll();
            state.status_message = state
                .feed
                .autoscroll_state()
                .map(|s| format!("Autoscroll: {}", s.label()));
        }
        Action::FocusSearch => {
            state.search_focused = true;
        }
        Action::ToggleLayout => {
            state.config.grid_layout = !state.config.grid_layout;
            if let Err(e) = state.config.save() {
                tracing::warn!(error = %e, "could not save config");
            }
            state.sync_layout();
        }
        Action::Reload => {
            state.status_message = None;
            state.reload_feed();
        }
        Action::AdminLogin => state.open_admin(),
    }
}

/// Typing edits the search term; every edit re-filters the same shuffle.
fn handle_search_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => {
            state.search_focused = false;
        }
        _ => {
            let mut term = state.feed.search().to_string();
            if edit_line(&mut term, key) {
                state.feed.set_search(&term);
                state.selected = 0;
            }
        }
    }
}

/// Move the highlight by `delta` cards and bring its row into view.
fn move_selection(state: &mut AppState, delta: isize) {
    let len = state.feed.visible_len();
    if len == 0 {
        return;
    }
    let next = (state.selected as isize + delta).clamp(0, len as isize - 1) as usize;
    state.selected = next;
    let row = next / state.feed.columns();
    state.feed.reveal_row(row);
}

/// Open the highlighted ad: register the click without waiting for it and
/// show the link.
fn open_selected(state: &mut AppState) {
    let Some(ad) = state.feed.open(state.selected) else {
        return;
    };
    tracing::debug!(id = ad.id, "opening ad");
    state.queue(StoreJob::RegisterInteraction(ad.id));
    state.preview = Some(ad);
    state.active_view = ActiveView::Preview;
}

fn handle_preview_key(state: &mut AppState, key: KeyEvent) {
    if matches!(
        key.code,
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char(' ')
    ) {
        state.preview = None;
        state.active_view = ActiveView::Feed;
    }
}

// ── Admin surface ───────────────────────────────────────────────

fn handle_login_key(state: &mut AppState, key: KeyEvent) {
    match state.login.handle_key(key) {
        FormInput::Submit => {
            match state.gate.login(&state.login.username, &state.login.password) {
                Ok(()) => {
                    state.login.clear();
                    state.enter_dashboard();
                }
                Err(message) => {
                    state.login.password.clear();
                    state.login.error = Some(message.to_string());
                }
            }
        }
        FormInput::Cancel => {
            state.login.clear();
            state.active_view = ActiveView::Feed;
        }
        FormInput::Edited | FormInput::Ignored => {}
    }
}

fn handle_dashboard_key(state: &mut AppState, key: KeyEvent) {
    let count = state.dashboard.ads.len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => state.leave_dashboard(false),
        KeyCode::Char('L') => state.leave_dashboard(true),
        KeyCode::Up | KeyCode::Char('k') => {
            state.dashboard.selected = state.dashboard.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.dashboard.selected + 1 < count {
                state.dashboard.selected += 1;
            }
        }
        KeyCode::Char('n') => {
            state.ad_form = AdForm::blank();
            state.active_view = ActiveView::AdForm;
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(ad) = state.dashboard.selected_ad() {
                state.ad_form = AdForm::for_ad(ad);
                state.active_view = ActiveView::AdForm;
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(ad) = state.dashboard.selected_ad() {
                state.confirm = Some(ConfirmAction::Delete {
                    id: ad.id,
                    title: ad.title.clone(),
                });
                state.active_view = ActiveView::Confirm;
            }
        }
        KeyCode::Char('R') => {
            state.confirm = Some(ConfirmAction::Reset);
            state.active_view = ActiveView::Confirm;
        }
        KeyCode::Char('r') => state.reload_dashboard(),
        _ => {}
    }
}

/// Validation runs here first so errors show inline; the store checks again.
fn handle_ad_form_key(state: &mut AppState, key: KeyEvent) {
    match state.ad_form.handle_key(key) {
        FormInput::Submit => {
            let job = match state.ad_form.editing {
                None => state.ad_form.to_new_ad().normalise().map(StoreJob::Create),
                Some(id) => {
                    let update = state.ad_form.to_update();
                    let checked = match state.dashboard.ads.iter().find(|a| a.id == id) {
                        Some(ad) => update.apply_to(&mut ad.clone()),
                        None => Ok(()),
                    };
                    checked.map(|()| StoreJob::Update(id, update))
                }
            };
            match job {
                Ok(job) => {
                    state.queue(job);
                    state.active_view = ActiveView::Dashboard;
                }
                Err(e) => state.ad_form.error = Some(e.to_string()),
            }
        }
        FormInput::Cancel => state.active_view = ActiveView::Dashboard,
        FormInput::Edited | FormInput::Ignored => {}
    }
}

fn handle_confirm_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            match state.confirm.take() {
                Some(ConfirmAction::Delete { id, .. }) => state.queue(StoreJob::Delete(id)),
                Some(ConfirmAction::Reset) => state.queue(StoreJob::Reset),
                None => {}
            }
            state.active_view = ActiveView::Dashboard;
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.confirm = None;
            state.active_view = ActiveView::Dashboard;
        }
        _ => {}
    }
}

// ── Settings / controls ─────────────────────────────────────────

fn handle_settings_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.active_view = ActiveView::Feed;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.settings_selected = state.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.settings_selected < SETTINGS_ITEMS.len() - 1 {
                state.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            if let Some(item) = SETTINGS_ITEMS.get(state.settings_selected) {
                match item {
                    SettingsItem::Submenu { view, .. } => {
                        state.active_view = *view;
                        state.controls_selected = 0;
                    }
                    SettingsItem::Toggle { get, set, .. } => {
                        let current = get(state);
                        set(state, !current);
                    }
                    SettingsItem::Cycle { cycle, .. } => {
                        cycle(state);
                    }
                }
            }
        }
        _ => {}
    }
}

fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let item_count = controls_item_count();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.active_view = ActiveView::Feed;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.active_view = ActiveView::SettingsMenu;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.controls_selected = state.controls_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.controls_selected < item_count - 1 {
                state.controls_selected += 1;
            }
        }
        KeyCode::Enter => {
            if state.controls_selected < Action::ALL.len() {
                state.awaiting_rebind = true;
            } else {
                state.config.reset_defaults();
                save_config(state);
            }
        }
        KeyCode::Delete | KeyCode::Backspace => {
            if state.controls_selected < Action::ALL.len() {
                let action = Action::ALL[state.controls_selected];
                state.config.bindings.insert(action, Vec::new());
                save_config(state);
            }
        }
        _ => {}
    }
}

fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Esc cancels rebinding.
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }

    let action = Action::ALL[state.controls_selected];
    state.config.add_binding(action, KeyBind::from_key_event(key));
    save_config(state);
    state.awaiting_rebind = false;
}

fn save_config(state: &mut AppState) {
    if let Err(e) = state.config.save() {
        tracing::warn!(error = %e, "could not save config");
        state.status_message = Some(format!("Could not save config: {e}"));
    }
}

// ── Mouse ───────────────────────────────────────────────────────

pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match state.active_view {
        ActiveView::Preview => {
            if let MouseEventKind::Down(_) = mouse.kind {
                state.preview = None;
                state.active_view = ActiveView::Feed;
            }
            return;
        }
        ActiveView::Feed => {}
        _ => return,
    }

    let layout = AppLayout::from_area(state.terminal_area);
    let inner = feed_grid::inner_area(layout.feed_area);

    match mouse.kind {
        MouseEventKind::ScrollUp => {
            state.feed
                .scroll_by(InputKind::Wheel, -WHEEL_ROWS * CELL_HEIGHT_PX);
            state.follow_viewport();
        }
        MouseEventKind::ScrollDown => {
            state.feed
                .scroll_by(InputKind::Wheel, WHEEL_ROWS * CELL_HEIGHT_PX);
            state.follow_viewport();
        }
        MouseEventKind::Down(MouseButton::Left) => {
            state.feed.user_input(InputKind::PointerDown);
            if let Some(index) = feed_grid::card_at(inner, &state.feed, mouse.column, mouse.row) {
                state.selected = index;
                open_selected(state);
            }
        }
        MouseEventKind::Down(_) => {
            state.feed.user_input(InputKind::PointerDown);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::tests::loaded_state;
    use crate::core::navigator::AutoscrollState;
    use crossterm::event::KeyEventState;
    use std::time::Instant;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut AppState, s: &str) {
        for c in s.chars() {
            handle_key(state, press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_opens_preview_and_registers_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(12, dir.path());
        let expected = state.feed.open(0).map(|a| a.id);

        handle_key(&mut state, press(KeyCode::Enter));
        assert_eq!(state.active_view, ActiveView::Preview);
        assert_eq!(state.preview.as_ref().map(|a| a.id), expected);
        let jobs = state.take_jobs();
        assert_eq!(jobs.len(), 1);
        assert!(matches!(jobs[0], StoreJob::RegisterInteraction(id) if Some(id) == expected));

        handle_key(&mut state, press(KeyCode::Esc));
        assert_eq!(state.active_view, ActiveView::Feed);
    }

    #[test]
    fn search_typing_filters_and_esc_leaves_focus() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(12, dir.path());
        handle_key(&mut state, press(KeyCode::Char('/')));
        assert!(state.search_focused);
        type_str(&mut state, "ad 1");
        assert_eq!(state.feed.search(), "ad 1");
        // "Ad 1", "Ad 10", "Ad 11"
        assert_eq!(state.feed.filtered_len(), 3);

        handle_key(&mut state, press(KeyCode::Esc));
        assert!(!state.search_focused);
        // A second Esc outside the search bar clears the term.
        handle_key(&mut state, press(KeyCode::Esc));
        assert_eq!(state.feed.filtered_len(), 12);
    }

    #[test]
    fn scroll_keys_pause_a_running_feed() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(40, dir.path());
        state.feed.resume_autoscroll();
        state.feed.pump(Instant::now());
        assert_eq!(state.feed.autoscroll_state(), Some(AutoscrollState::Running));

        handle_key(&mut state, press(KeyCode::PageDown));
        assert_eq!(
            state.feed.autoscroll_state(),
            Some(AutoscrollState::PausedByUser)
        );
    }

    #[test]
    fn toggle_binding_pauses_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(40, dir.path());
        handle_key(&mut state, press(KeyCode::Char('p')));
        assert_eq!(state.feed.autoscroll_state(), Some(AutoscrollState::Running));
        handle_key(&mut state, press(KeyCode::Char('p')));
        assert_eq!(
            state.feed.autoscroll_state(),
            Some(AutoscrollState::PausedByCommand)
        );
    }

    #[test]
    fn secret_chord_opens_login_and_wrong_password_stays() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(3, dir.path());
        let chord = KeyEvent {
            code: KeyCode::Char('A'),
            modifiers: KeyModifiers::CONTROL | KeyModifiers::SHIFT,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        handle_key(&mut state, chord);
        assert_eq!(state.active_view, ActiveView::AdminLogin);

        type_str(&mut state, "admin");
        handle_key(&mut state, press(KeyCode::Tab));
        type_str(&mut state, "wrong");
        handle_key(&mut state, press(KeyCode::Enter));
        assert_eq!(state.active_view, ActiveView::AdminLogin);
        assert!(state.login.error.is_some());
        assert!(state.login.password.is_empty());

        type_str(&mut state, "admin123");
        handle_key(&mut state, press(KeyCode::Enter));
        assert_eq!(state.active_view, ActiveView::Dashboard);
        assert!(state.gate.is_logged_in());
    }

    #[test]
    fn invalid_ad_form_shows_the_error_inline() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(0, dir.path());
        state.active_view = ActiveView::Dashboard;
        handle_key(&mut state, press(KeyCode::Char('n')));
        assert_eq!(state.active_view, ActiveView::AdForm);
        type_str(&mut state, "Lamp");
        handle_key(&mut state, press(KeyCode::Enter));
        assert_eq!(state.active_view, ActiveView::AdForm);
        assert!(state.ad_form.error.is_some());

        for _ in 0..3 {
            handle_key(&mut state, press(KeyCode::Tab));
        }
        type_str(&mut state, "https://lamps.example");
        handle_key(&mut state, press(KeyCode::Enter));
        assert_eq!(state.active_view, ActiveView::Dashboard);
        assert!(matches!(
            state.take_jobs().as_slice(),
            [StoreJob::Create(ad)] if ad.title == "Lamp"
        ));
    }

    #[test]
    fn delete_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(0, dir.path());
        state.active_view = ActiveView::Dashboard;
        state.dashboard.ads = vec![crate::core::ad::sample_ad(9, "Bike", "")];

        handle_key(&mut state, press(KeyCode::Char('d')));
        assert_eq!(state.active_view, ActiveView::Confirm);
        handle_key(&mut state, press(KeyCode::Char('n')));
        assert!(state.take_jobs().is_empty());

        handle_key(&mut state, press(KeyCode::Char('d')));
        handle_key(&mut state, press(KeyCode::Char('y')));
        assert_eq!(state.take_jobs(), vec![StoreJob::Delete(9)]);
    }
}
