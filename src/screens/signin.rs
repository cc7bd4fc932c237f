//! Email and password sign-in; returns to the page that asked for it.

use crossterm::event::KeyCode;

use super::{Command, Effect, Notification, Outcome, ScreenState};
use crate::routes::DEFAULT_CALLBACK;
use crate::ui::form_field::{Form, FormField, NamedField};
use crate::ui::keybindings::ShortcutContext;

pub struct SignInScreen {
    /// Path to open after a successful sign-in
    pub callback: String,
    pub form: Form,
    pub editing: bool,
    pub submitting: bool,
}

impl SignInScreen {
    pub fn new(callback: Option<String>) -> Self {
        let form = Form::new(vec![
            NamedField::new(
                "email",
                "Email",
                FormField::text_input("", "you@example.com"),
            )
            .required(),
            NamedField::new("password", "Password", FormField::password("Password")).required(),
        ]);
        Self {
            callback: callback.unwrap_or_else(|| DEFAULT_CALLBACK.to_string()),
            form,
            editing: true,
            submitting: false,
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.submitting {
            return Vec::new();
        }
        if !self.form.is_valid() {
            return vec![Effect::Notify(Notification::error(
                "Email and password are required",
            ))];
        }
        self.submitting = true;
        vec![Effect::Run(Command::SignIn {
            email: self.form.value("email").trim().to_string(),
            password: self.form.value("password"),
        })]
    }
}

impl ScreenState for SignInScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if key == KeyCode::F(2) {
            return self.submit();
        }
        if !self.editing {
            if matches!(key, KeyCode::Char('i') | KeyCode::Enter) {
                self.editing = true;
            }
            return Vec::new();
        }
        match key {
            KeyCode::Esc => {
                self.editing = false;
                Vec::new()
            }
            KeyCode::Enter if self.form.is_last_field() => self.submit(),
            KeyCode::Enter => {
                self.form.next_field();
                Vec::new()
            }
            _ => {
                self.form.handle_key(key);
                Vec::new()
            }
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            // Nothing to do here when a session already exists
            Outcome::Session(snapshot) if snapshot.is_signed_in() => {
                vec![Effect::Navigate(self.callback.clone())]
            }
            Outcome::SignedIn(result) => {
                self.submitting = false;
                match result {
                    Ok(snapshot) if snapshot.is_signed_in() => {
                        vec![Effect::Navigate(self.callback.clone())]
                    }
                    Ok(_) => vec![Effect::Notify(Notification::error(
                        "Sign-in failed: no session was returned",
                    ))],
                    Err(e) => {
                        if let Some(field) = self.form.field_mut("password") {
                            field.set_value("");
                        }
                        vec![Effect::Notify(Notification::failed("Sign-in failed", &e))]
                    }
                }
            }
            _ => Vec::new(),
        }
    }

    fn is_capturing(&self) -> bool {
        self.editing
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::SignIn
    }
}
