//! Text-entry forms for the admin desk: the login prompt and the ad editor.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::ad::{Ad, AdId, AdUpdate, NewAd};

/// What a key press did to a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormInput {
    /// Edited or moved focus.
    Edited,
    Submit,
    Cancel,
    Ignored,
}

/// Shared line-editing for every form field.  Returns `true` when the value
/// changed.
pub fn edit_line(value: &mut String, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            value.push(c);
            true
        }
        KeyCode::Backspace => value.pop().is_some(),
        _ => false,
    }
}

/// Move focus through `len` fields, wrapping.
fn cycle_focus(focus: &mut usize, len: usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            *focus = (*focus + 1) % len;
            true
        }
        KeyCode::BackTab | KeyCode::Up => {
            *focus = (*focus + len - 1) % len;
            true
        }
        _ => false,
    }
}

// ───────────────────────────────────────── login ─────────────

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// 0 = username, 1 = password.
    pub focus: usize,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormInput {
        match key.code {
            KeyCode::Esc => return FormInput::Cancel,
            KeyCode::Enter => return FormInput::Submit,
            _ => {}
        }
        if cycle_focus(&mut self.focus, 2, key) {
            return FormInput::Edited;
        }
        let field = if self.focus == 0 {
            &mut self.username
        } else {
            &mut self.password
        };
        if edit_line(field, key) {
            self.error = None;
            FormInput::Edited
        } else {
            FormInput::Ignored
        }
    }

    /// Password shown as bullets.
    pub fn masked_password(&self) -> String {
        "•".repeat(self.password.chars().count())
    }
}

// ───────────────────────────────────────── ad editor ─────────

pub const AD_FIELD_LABELS: [&str; 4] = ["Title", "Description", "Image URL", "Smart Link *"];

#[derive(Debug, Default)]
pub struct AdForm {
    /// `Some(id)` while editing an existing ad.
    pub editing: Option<AdId>,
    pub fields: [String; 4],
    pub focus: usize,
    pub error: Option<String>,
}

impl AdForm {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn for_ad(ad: &Ad) -> Self {
        Self {
            editing: Some(ad.id),
            fields: [
                ad.title.clone(),
                ad.description.clone(),
                ad.image_url.clone(),
                ad.smart_link.clone(),
            ],
            focus: 0,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            " Edit Ad "
        } else {
            " Create New Ad "
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormInput {
        match key.code {
            KeyCode::Esc => return FormInput::Cancel,
            KeyCode::Enter => return FormInput::Submit,
            _ => {}
        }
        if cycle_focus(&mut self.focus, self.fields.len(), key) {
            return FormInput::Edited;
        }
        if edit_line(&mut self.fields[self.focus], key) {
            self.error = None;
            FormInput::Edited
        } else {
            FormInput::Ignored
        }
    }

    pub fn to_new_ad(&self) -> NewAd {
        let [title, description, image_url, smart_link] = self.fields.clone();
        NewAd {
            title,
            description,
            image_url,
            smart_link,
        }
    }

    /// Every field is sent; blank ones are skipped by the store.
    pub fn to_update(&self) -> AdUpdate {
        let [title, description, image_url, smart_link] = self.fields.clone();
        AdUpdate {
            title: Some(title),
            description: Some(description),
            image_url: Some(image_url),
            smart_link: Some(smart_link),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::sample_ad;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(form: &mut LoginForm, s: &str) {
        for c in s.chars() {
            form.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn login_form_edits_focused_field() {
        let mut form = LoginForm::default();
        type_str(&mut form, "admin");
        assert_eq!(form.handle_key(press(KeyCode::Tab)), FormInput::Edited);
        type_str(&mut form, "admin12");
        form.handle_key(press(KeyCode::Backspace));
        assert_eq!(form.username, "admin");
        assert_eq!(form.password, "admin1");
        assert_eq!(form.masked_password(), "••••••");
        assert_eq!(form.handle_key(press(KeyCode::Enter)), FormInput::Submit);
    }

    #[test]
    fn typing_clears_a_previous_error() {
        let mut form = LoginForm {
            error: Some("bad".into()),
            ..LoginForm::default()
        };
        type_str(&mut form, "x");
        assert!(form.error.is_none());
    }

    #[test]
    fn ad_form_focus_wraps_backwards() {
        let mut form = AdForm::blank();
        form.handle_key(press(KeyCode::BackTab));
        assert_eq!(form.focus, 3);
        form.handle_key(press(KeyCode::Tab));
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn edit_form_prefills_and_builds_update() {
        let ad = sample_ad(4, "Lamp", "Bright");
        let mut form = AdForm::for_ad(&ad);
        assert_eq!(form.editing, Some(4));
        form.fields[0].push('s');
        let update = form.to_update();
        assert_eq!(update.title.as_deref(), Some("Lamps"));
        assert_eq!(update.smart_link.as_deref(), Some(ad.smart_link.as_str()));
    }

    #[test]
    fn ctrl_chords_are_not_typed() {
        let mut form = AdForm::blank();
        let outcome = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(outcome, FormInput::Ignored);
        assert!(form.fields[0].is_empty());
    }
}
