//! User configuration: feed tunables, keybindings and persistence.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/adzone/config.toml` (default `~/.config/adzone/config.toml`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::feed::FeedConfig;
use crate::core::navigator::{NavigatorConfig, DEFAULT_BOTTOM_EPSILON, DEFAULT_VELOCITY};
use crate::core::trigger::{TriggerConfig, DEFAULT_ROOT_MARGIN, DEFAULT_THRESHOLD};
use crate::core::{monitor, window};

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions in the feed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    OpenAd,
    ToggleAutoscroll,
    FocusSearch,
    ToggleLayout,
    Reload,
    AdminLogin,
    OpenSettings,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the settings hint list).
    pub const ALL: &'static [Action] = &[
        Action::MoveUp,
        Action::MoveDown,
        Action::PageUp,
        Action::PageDown,
        Action::OpenAd,
        Action::ToggleAutoscroll,
        Action::FocusSearch,
        Action::ToggleLayout,
        Action::Reload,
        Action::AdminLogin,
        Action::OpenSettings,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::MoveUp => "Previous Card",
            Action::MoveDown => "Next Card",
            Action::PageUp => "Page Up",
            Action::PageDown => "Page Down",
            Action::OpenAd => "Open Offer",
            Action::ToggleAutoscroll => "Pause / Resume",
            Action::FocusSearch => "Search",
            Action::ToggleLayout => "Grid / List",
            Action::Reload => "Reload Feed",
            Action::AdminLogin => "Admin",
            Action::OpenSettings => "Settings",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::MoveUp => "move_up",
            Action::MoveDown => "move_down",
            Action::PageUp => "page_up",
            Action::PageDown => "page_down",
            Action::OpenAd => "open_ad",
            Action::ToggleAutoscroll => "toggle_autoscroll",
            Action::FocusSearch => "focus_search",
            Action::ToggleLayout => "toggle_layout",
            Action::Reload => "reload",
            Action::AdminLogin => "admin_login",
            Action::OpenSettings => "open_settings",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared (platform-specific modifiers like SUPER are ignored).
    /// For characters SHIFT is skipped too: `?` and `A` already carry it.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = match self.code {
            KeyCode::Char(_) => KeyModifiers::CONTROL | KeyModifiers::ALT,
            _ => KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT,
        };
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Build a binding from a live key event (used when rebinding).
    pub fn from_key_event(event: KeyEvent) -> Self {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        Self {
            code: event.code,
            modifiers: event.modifiers & mask,
        }
    }

    /// User-friendly display string (e.g. `"Ctrl+c"`, `"PgDn"`, `"q"`).
    pub fn display(&self) -> String {
        let mut s = modifier_prefix(self.modifiers);
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::PageUp => "PgUp".into(),
            KeyCode::PageDown => "PgDn".into(),
            other => key_name(other),
        });
        s
    }

    /// Serialise to config-file format (e.g. `"Ctrl+c"`, `"PageDown"`, `"q"`).
    fn to_config_string(&self) -> String {
        let mut s = modifier_prefix(self.modifiers);
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            other => key_name(other),
        });
        s
    }

    /// Parse a key string like `"Ctrl+c"`, `"Alt+Up"`, `"q"`, `"Enter"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            k if k.starts_with('f') && k.len() > 1 => {
                let n: u8 = k[1..].parse().ok()?;
                KeyCode::F(n)
            }
            // Keep the original case for single characters (`R` ≠ `r`).
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

fn modifier_prefix(modifiers: KeyModifiers) -> String {
    let mut s = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        s.push_str("Ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        s.push_str("Alt+");
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        s.push_str("Shift+");
    }
    s
}

fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        KeyCode::Left => "Left".into(),
        KeyCode::Right => "Right".into(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Esc".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::PageUp => "PageUp".into(),
        KeyCode::PageDown => "PageDown".into(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration: feed tunables and keybindings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Cards added per pagination advance.
    pub page_size: usize,
    /// Debounce before a page commits.
    pub advance_delay_ms: u64,
    /// Proximity margin around the viewport, in pixels.
    pub trigger_margin_px: f64,
    /// Fraction of the sentinel that must be inside the margin.
    pub trigger_threshold: f64,
    /// Autoscroll speed in pixels per second.
    pub autoscroll_velocity: f64,
    pub bottom_epsilon_px: f64,
    /// Smallest unexplained offset change counted as the user scrolling.
    pub noise_threshold_px: f64,
    /// Cards side by side (grid) or one per row (list).
    pub grid_layout: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            page_size: window::DEFAULT_PAGE_SIZE,
            advance_delay_ms: window::DEFAULT_ADVANCE_DELAY.as_millis() as u64,
            trigger_margin_px: DEFAULT_ROOT_MARGIN,
            trigger_threshold: DEFAULT_THRESHOLD,
            autoscroll_velocity: DEFAULT_VELOCITY,
            bottom_epsilon_px: DEFAULT_BOTTOM_EPSILON,
            noise_threshold_px: monitor::DEFAULT_NOISE_THRESHOLD,
            grid_layout: true,
        }
    }
}

impl AppConfig {
    /// Hard-coded default bindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(MoveUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(MoveDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(Action::PageUp, vec![KeyBind::new(KeyCode::PageUp, n)]);
        m.insert(
            Action::PageDown,
            vec![KeyBind::new(KeyCode::PageDown, n), KeyBind::new(Char(' '), n)],
        );
        m.insert(OpenAd, vec![KeyBind::new(Enter, n)]);
        m.insert(ToggleAutoscroll, vec![KeyBind::new(Char('p'), n)]);
        m.insert(FocusSearch, vec![KeyBind::new(Char('/'), n)]);
        m.insert(ToggleLayout, vec![KeyBind::new(Char('v'), n)]);
        m.insert(Reload, vec![KeyBind::new(Char('r'), n)]);
        m.insert(
            AdminLogin,
            vec![
                KeyBind::new(Char('a'), n),
                KeyBind::new(Char('A'), KeyModifiers::CONTROL | KeyModifiers::SHIFT),
            ],
        );
        m.insert(OpenSettings, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Restore the default bindings, keeping feed settings.
    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    /// Add a binding to an action, removing it from any other action first.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for binds in self.bindings.values_mut() {
            binds.retain(|b| *b != bind);
        }
        let binds = self.bindings.entry(action).or_default();
        if !binds.contains(&bind) {
            binds.push(bind);
        }
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Format the binding list for a given action (e.g. `"↑/k"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    /// Short display of the first binding only (for the status bar).
    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}: pause/resume | {}: search | {}: open | {}: reload | {}: settings",
            self.short_binding(Action::ToggleAutoscroll),
            self.short_binding(Action::FocusSearch),
            self.short_binding(Action::OpenAd),
            self.short_binding(Action::Reload),
            self.short_binding(Action::OpenSettings),
        )
    }

    /// Tunables for the feed core.
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            page_size: self.page_size,
            advance_delay: Duration::from_millis(self.advance_delay_ms),
            trigger: TriggerConfig {
                root_margin: self.trigger_margin_px,
                threshold: self.trigger_threshold,
            },
            navigator: NavigatorConfig {
                velocity: self.autoscroll_velocity,
                bottom_epsilon: self.bottom_epsilon_px,
            },
            noise_threshold: self.noise_threshold_px,
            ..FeedConfig::default()
        }
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(_) => Self::default(),
        }
    }

    /// Persist current config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            // Feed settings.  Out-of-range values are clamped so a typo
            // cannot stall the feed.
            match key {
                "page_size" => {
                    if let Ok(v) = value.parse::<usize>() {
                        config.page_size = v.clamp(1, 200);
                    }
                    continue;
                }
                "advance_delay_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.advance_delay_ms = v.min(5_000);
                    }
                    continue;
                }
                "trigger_margin_px" => {
                    if let Ok(v) = value.parse::<f64>() {
                        config.trigger_margin_px = v.clamp(0.0, 2_000.0);
                    }
                    continue;
                }
                "trigger_threshold" => {
                    if let Ok(v) = value.parse::<f64>() {
                        config.trigger_threshold = v.clamp(0.0, 1.0);
                    }
                    continue;
                }
                "autoscroll_velocity" => {
                    if let Ok(v) = value.parse::<f64>() {
                        config.autoscroll_velocity = v.clamp(1.0, 5_000.0);
                    }
                    continue;
                }
                "bottom_epsilon_px" => {
                    if let Ok(v) = value.parse::<f64>() {
                        config.bottom_epsilon_px = v.clamp(0.0, 500.0);
                    }
                    continue;
                }
                "noise_threshold_px" => {
                    if let Ok(v) = value.parse::<f64>() {
                        config.noise_threshold_px = v.clamp(0.0, 500.0);
                    }
                    continue;
                }
                "grid_layout" => {
                    config.grid_layout = value == "true";
                    continue;
                }
                _ => {}
            }

            let Some(action) = Action::from_config_key(key) else {
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                let part = part.trim().trim_matches('"');
                if let Some(bind) = KeyBind::parse(part) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# adzone configuration".to_string(),
            String::new(),
            "# Feed settings".to_string(),
            format!("page_size = {}", self.page_size),
            format!("advance_delay_ms = {}", self.advance_delay_ms),
            format!("trigger_margin_px = {}", self.trigger_margin_px),
            format!("trigger_threshold = {}", self.trigger_threshold),
            format!("autoscroll_velocity = {}", self.autoscroll_velocity),
            format!("bottom_epsilon_px = {}", self.bottom_epsilon_px),
            format!("noise_threshold_px = {}", self.noise_threshold_px),
            format!("grid_layout = {}", self.grid_layout),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/adzone/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("adzone").join("config.toml")
}

/// Default JSON store location (`$XDG_DATA_HOME/adzone/ads.json`).
pub fn default_store_path() -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".local").join("share")
        });
    data_dir.join("adzone").join("ads.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn serialise_then_parse_keeps_settings() {
        let mut config = AppConfig::default();
        config.page_size = 12;
        config.autoscroll_velocity = 120.0;
        config.grid_layout = false;
        config
            .bindings
            .insert(Action::Reload, vec![KeyBind::new(KeyCode::F(5), KeyModifiers::NONE)]);

        let parsed = AppConfig::parse_config(&config.serialise());
        assert_eq!(parsed.page_size, 12);
        assert_eq!(parsed.autoscroll_velocity, 120.0);
        assert!(!parsed.grid_layout);
        assert_eq!(
            parsed.match_key(key(KeyCode::F(5), KeyModifiers::NONE)),
            Some(Action::Reload)
        );
        assert_eq!(
            parsed.match_key(key(KeyCode::PageDown, KeyModifiers::NONE)),
            Some(Action::PageDown)
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let parsed = AppConfig::parse_config(
            "page_size = 0\ntrigger_threshold = 3\nautoscroll_velocity = -4\nbogus = 1\n",
        );
        assert_eq!(parsed.page_size, 1);
        assert_eq!(parsed.trigger_threshold, 1.0);
        assert_eq!(parsed.autoscroll_velocity, 1.0);
    }

    #[test]
    fn modifier_heavy_binding_wins() {
        let config = AppConfig::default();
        let secret = key(KeyCode::Char('A'), KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(config.match_key(secret), Some(Action::AdminLogin));
        assert_eq!(
            config.match_key(key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::Quit)
        );
        // Terminals report `?` with SHIFT held.
        assert_eq!(
            config.match_key(key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(Action::OpenSettings)
        );
    }

    #[test]
    fn every_action_has_a_default_binding() {
        let config = AppConfig::default();
        for action in Action::ALL {
            assert!(!config.bindings[action].is_empty(), "{action:?} unbound");
        }
        assert_eq!(
            config.match_key(key(KeyCode::PageUp, KeyModifiers::NONE)),
            Some(Action::PageUp)
        );
        assert_eq!(
            config.match_key(key(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(Action::PageDown)
        );
    }

    #[test]
    fn rebinding_moves_the_key_between_actions() {
        let mut config = AppConfig::default();
        let p = KeyBind::new(KeyCode::Char('p'), KeyModifiers::NONE);
        config.add_binding(Action::Reload, p.clone());
        assert_eq!(
            config.match_key(key(KeyCode::Char('p'), KeyModifiers::NONE)),
            Some(Action::Reload)
        );
        assert!(!config.bindings[&Action::ToggleAutoscroll].contains(&p));
        config.reset_defaults();
        assert_eq!(
            config.match_key(key(KeyCode::Char('p'), KeyModifiers::NONE)),
            Some(Action::ToggleAutoscroll)
        );
    }

    #[test]
    fn feed_config_carries_tunables() {
        let mut config = AppConfig::default();
        config.advance_delay_ms = 50;
        config.noise_threshold_px = 9.0;
        let feed = config.feed_config();
        assert_eq!(feed.advance_delay, Duration::from_millis(50));
        assert_eq!(feed.noise_threshold, 9.0);
        assert_eq!(feed.page_size, 8);
    }
}
