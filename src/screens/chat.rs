//! Ask the course assistant about the material; replies stream in.

use crossterm::event::KeyCode;

use super::{require_session, Command, Effect, Notification, Outcome, ScreenState};
use crate::routes::Route;
use crate::ui::form_field::FormField;
use crate::ui::keybindings::ShortcutContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

pub struct ChatScreen {
    pub course_id: String,
    pub messages: Vec<ChatMessage>,
    pub input: FormField,
    pub editing: bool,
    /// A reply is streaming into the last message
    pub busy: bool,
}

impl ChatScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            messages: Vec::new(),
            input: FormField::text_input("", "Ask about the course material"),
            editing: true,
            busy: false,
        }
    }

    fn send(&mut self) -> Vec<Effect> {
        let message = self.input.value().trim().to_string();
        if message.is_empty() || self.busy {
            return Vec::new();
        }
        self.input.set_value("");
        self.messages.push(ChatMessage {
            role: Role::User,
            text: message.clone(),
        });
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            text: String::new(),
        });
        self.busy = true;
        vec![Effect::Run(Command::SendChat {
            course_id: self.course_id.clone(),
            message,
        })]
    }

    fn proceed(&self) -> Vec<Effect> {
        vec![Effect::navigate(Route::Lessons(self.course_id.clone()))]
    }
}

impl ScreenState for ChatScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if key == KeyCode::F(2) {
            return self.proceed();
        }
        if !self.editing {
            return match key {
                KeyCode::Char('i') | KeyCode::Enter => {
                    self.editing = true;
                    Vec::new()
                }
                KeyCode::Char('f') => self.proceed(),
                _ => Vec::new(),
            };
        }
        match key {
            KeyCode::Enter => self.send(),
            KeyCode::Esc => {
                self.editing = false;
                Vec::new()
            }
            _ => {
                self.input.handle_key(key);
                Vec::new()
            }
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                let route = Route::Chat(self.course_id.clone());
                require_session(&snapshot, &route, Vec::new)
            }
            Outcome::ChatDelta(text) => {
                if let Some(last) = self.messages.last_mut() {
                    if last.role == Role::Assistant {
                        last.text.push_str(&text);
                    }
                }
                Vec::new()
            }
            Outcome::ChatFinished(result) => {
                self.busy = false;
                match result {
                    Ok(()) => Vec::new(),
                    Err(e) => {
                        if self
                            .messages
                            .last()
                            .is_some_and(|m| m.role == Role::Assistant)
                        {
                            self.messages.pop();
                        }
                        vec![Effect::Notify(Notification::failed(
                            "The assistant could not answer",
                            &e,
                        ))]
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
        ShortcutContext::Chat
    }
}
