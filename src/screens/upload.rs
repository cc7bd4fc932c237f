//! First wizard step: submit a source link.

use crossterm::event::KeyCode;

use super::{Command, Effect, Notification, Outcome, ScreenState};
use crate::auth::SessionSnapshot;
use crate::routes::Route;
use crate::ui::form_field::FormField;
use crate::ui::keybindings::ShortcutContext;

pub struct UploadScreen {
    pub link: FormField,
    /// Keyboard goes to the link input
    pub editing: bool,
    pub session: Option<SessionSnapshot>,
    pub submitting: bool,
    /// Shown when a submit was attempted without a session
    pub sign_in_prompt: bool,
}

impl Default for UploadScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadScreen {
    pub fn new() -> Self {
        Self {
            link: FormField::text_input("", "https://... link to a document, page or video"),
            editing: true,
            session: None,
            submitting: false,
            sign_in_prompt: false,
        }
    }

    fn is_signed_in(&self) -> bool {
        self.session.as_ref().is_some_and(SessionSnapshot::is_signed_in)
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.submitting {
            return Vec::new();
        }
        let link = self.link.value().trim().to_string();
        if link.is_empty() {
            return vec![Effect::Notify(Notification::error(
                "Enter a link to your source material",
            ))];
        }
        if !self.is_signed_in() {
            self.sign_in_prompt = true;
            return vec![Effect::Notify(Notification::info(
                "Sign in to create a course",
            ))];
        }
        self.submitting = true;
        vec![Effect::Run(Command::SubmitContent(link))]
    }
}

impl ScreenState for UploadScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if self.sign_in_prompt {
            return match key {
                KeyCode::Enter | KeyCode::Char('s') => {
                    self.sign_in_prompt = false;
                    vec![Effect::navigate(Route::sign_in_then(&Route::Upload.path()))]
                }
                KeyCode::Esc => {
                    self.sign_in_prompt = false;
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        if !self.editing {
            if matches!(key, KeyCode::Char('i') | KeyCode::Enter) {
                self.editing = true;
            }
            return Vec::new();
        }

        match key {
            KeyCode::Enter | KeyCode::F(2) => self.submit(),
            KeyCode::Esc => {
                self.editing = false;
                Vec::new()
            }
            _ => {
                self.link.handle_key(key);
                Vec::new()
            }
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                self.session = Some(snapshot);
                Vec::new()
            }
            Outcome::ContentSubmitted(result) => {
                self.submitting = false;
                match result {
                    Ok(course_id) => vec![Effect::navigate(Route::Instruct(course_id))],
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not create course",
                        &e,
                    ))],
                }
            }
            _ => Vec::new(),
        }
    }

    fn is_capturing(&self) -> bool {
        self.editing || self.sign_in_prompt
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::Editor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::screens::testing::{commands, navigations, press, signed_in};

    #[test]
    fn test_submit_without_session_prompts_and_makes_no_call() {
        let mut screen = UploadScreen::new();
        screen.apply(Outcome::Session(SessionSnapshot::default()));
        press(&mut screen, "https://example.com/a.pdf");

        let effects = screen.handle_key(KeyCode::Enter);
        assert!(commands(&effects).is_empty());
        assert!(screen.sign_in_prompt);

        let effects = screen.handle_key(KeyCode::Enter);
        assert_eq!(
            navigations(&effects),
            vec!["/register?callback=/gen/create"]
        );
    }

    #[test]
    fn test_submit_before_session_known_is_treated_as_signed_out() {
        let mut screen = UploadScreen::new();
        press(&mut screen, "https://example.com");
        let effects = screen.handle_key(KeyCode::Enter);
        assert!(commands(&effects).is_empty());
        assert!(screen.sign_in_prompt);
    }

    #[test]
    fn test_submit_runs_command_and_navigates_to_instruct() {
        let mut screen = UploadScreen::new();
        screen.apply(Outcome::Session(signed_in()));
        press(&mut screen, "https://example.com/a.pdf");

        let effects = screen.handle_key(KeyCode::Enter);
        assert_eq!(
            commands(&effects),
            vec![&Command::SubmitContent("https://example.com/a.pdf".to_string())]
        );
        // Ignored while in flight
        assert!(screen.handle_key(KeyCode::Enter).is_empty());

        let effects = screen.apply(Outcome::ContentSubmitted(Ok("c42".to_string())));
        assert_eq!(navigations(&effects), vec!["/gen/instruct/c42"]);
    }

    #[test]
    fn test_blank_link_is_rejected() {
        let mut screen = UploadScreen::new();
        screen.apply(Outcome::Session(signed_in()));
        let effects = screen.handle_key(KeyCode::Enter);
        assert!(commands(&effects).is_empty());
        assert!(!screen.sign_in_prompt);
    }

    #[test]
    fn test_failure_notifies_and_allows_retry() {
        let mut screen = UploadScreen::new();
        screen.apply(Outcome::Session(signed_in()));
        press(&mut screen, "x");
        screen.handle_key(KeyCode::Enter);

        let effects = screen.apply(Outcome::ContentSubmitted(Err(ApiError::parse(
            "backend",
            "content generation returned an empty course id",
        ))));
        assert!(navigations(&effects).is_empty());
        assert!(!screen.submitting);
    }
}
