//! Settings menu model (data only).
//!
//! Keeping these definitions outside the input handler lets both the handler
//! and UI renderers consume the same source of truth without cross-importing.

use super::state::{ActiveView, AppState};

/// A single item in the settings menu.
pub enum SettingsItem {
    /// Opens a submenu.
    Submenu {
        label: &'static str,
        view: ActiveView,
    },
    /// Boolean toggle: reads/writes via accessors on `AppState`.
    Toggle {
        label: &'static str,
        get: fn(&AppState) -> bool,
        set: fn(&mut AppState, bool),
    },
    /// Cycles through a finite set of values.
    Cycle {
        label: &'static str,
        value: fn(&AppState) -> String,
        cycle: fn(&mut AppState),
    },
}

impl SettingsItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submenu { label, .. }
            | Self::Toggle { label, .. }
            | Self::Cycle { label, .. } => label,
        }
    }

    /// Current value for display, if the item has one.
    pub fn value(&self, state: &AppState) -> Option<String> {
        match self {
            Self::Submenu { .. } => None,
            Self::Toggle { get, .. } => Some(if get(state) { "ON" } else { "OFF" }.into()),
            Self::Cycle { value, .. } => Some(value(state)),
        }
    }
}

const VELOCITIES: &[f64] = &[50.0, 100.0, 200.0, 300.0, 500.0];
const MARGINS: &[f64] = &[0.0, 75.0, 150.0, 300.0, 600.0];

/// Next entry after `current`, or the first one when `current` is off-list.
fn next_step(steps: &[f64], current: f64) -> f64 {
    let next = steps.iter().position(|&v| v == current).map_or(0, |i| i + 1);
    steps[next % steps.len()]
}

fn save(state: &mut AppState) {
    if let Err(e) = state.config.save() {
        tracing::warn!(error = %e, "could not save config");
    }
}

/// All items shown in the settings popup, in display order.
pub static SETTINGS_ITEMS: &[SettingsItem] = &[
    SettingsItem::Submenu {
        label: "Controls",
        view: ActiveView::ControlsSubmenu,
    },
    SettingsItem::Toggle {
        label: "Grid Layout",
        get: |s| s.config.grid_layout,
        set: |s, v| {
            s.config.grid_layout = v;
            save(s);
            s.sync_layout();
        },
    },
    SettingsItem::Cycle {
        label: "Autoscroll Speed",
        value: |s| format!("{} px/s", s.config.autoscroll_velocity),
        cycle: |s| {
            s.config.autoscroll_velocity = next_step(VELOCITIES, s.config.autoscroll_velocity);
            save(s);
            s.feed.set_navigator_config(s.config.feed_config().navigator);
            s.status_message = Some(format!(
                "Autoscroll speed: {} px/s",
                s.config.autoscroll_velocity
            ));
        },
    },
    SettingsItem::Cycle {
        label: "Load Margin",
        value: |s| format!("{} px", s.config.trigger_margin_px),
        cycle: |s| {
            s.config.trigger_margin_px = next_step(MARGINS, s.config.trigger_margin_px);
            save(s);
            s.feed.set_trigger_config(s.config.feed_config().trigger);
            s.status_message = Some(format!("Load margin: {} px", s.config.trigger_margin_px));
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_wrap_and_recover_from_custom_values() {
        assert_eq!(next_step(VELOCITIES, 200.0), 300.0);
        assert_eq!(next_step(VELOCITIES, 500.0), 50.0);
        assert_eq!(next_step(MARGINS, 42.0), 0.0);
    }
}
