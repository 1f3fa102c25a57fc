//! Terminal input reader.
//!
//! Crossterm's `poll`/`read` block, so they run on a blocking thread and
//! forward what they see over a channel.  A quiet `tick_rate` produces a
//! `Tick`, which drives the spinners.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// The layout is recomputed from the terminal size every frame, so the
    /// new size itself is not carried.
    Resize,
    Tick,
}

fn translate(ev: CtEvent) -> Option<AppEvent> {
    match ev {
        CtEvent::Key(k) => Some(AppEvent::Key(k)),
        CtEvent::Mouse(m) => Some(AppEvent::Mouse(m)),
        CtEvent::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

pub fn spawn_event_reader(tick_rate: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || loop {
        let next = match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                Ok(ev) => match translate(ev) {
                    Some(app_event) => app_event,
                    None => continue,
                },
                Err(e) => {
                    tracing::warn!(error = %e, "terminal read failed");
                    continue;
                }
            },
            Ok(false) => AppEvent::Tick,
            Err(e) => {
                tracing::warn!(error = %e, "terminal poll failed");
                AppEvent::Tick
            }
        };
        if tx.send(next).is_err() {
            // Receiver dropped: the app is shutting down.
            break;
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn focus_and_paste_events_are_dropped() {
        assert!(translate(CtEvent::FocusGained).is_none());
        assert!(translate(CtEvent::Paste("x".into())).is_none());
        assert!(matches!(translate(CtEvent::Resize(80, 24)), Some(AppEvent::Resize)));
        let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        assert!(matches!(translate(CtEvent::Key(key)), Some(AppEvent::Key(_))));
    }
}
