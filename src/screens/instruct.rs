//! Edit the generated instructions that steer course generation.

use crossterm::event::KeyCode;

use super::{move_selection, require_session, Command, Effect, Notification, Outcome, ScreenState};
use crate::api::Instructions;
use crate::routes::Route;
use crate::ui::form_field::{Form, FormField, NamedField};
use crate::ui::keybindings::ShortcutContext;

/// Canned replacements for the instructions field
pub const SUGGESTIONS: [&str; 3] = [
    "Make sure to include all key points",
    "Do not make it too hard",
    "Be concise and clear",
];

fn instructions_form(instructions: &Instructions) -> Form {
    Form::new(vec![
        NamedField::new(
            "title",
            "Title",
            FormField::text_input(&instructions.title, "Course title"),
        )
        .required(),
        NamedField::new(
            "summary",
            "Summary",
            FormField::text_area(&instructions.summary, "What the course covers"),
        ),
        NamedField::new(
            "instructions",
            "Instructions",
            FormField::text_area(&instructions.instructions, "How the material should be written"),
        ),
    ])
}

pub struct InstructScreen {
    pub course_id: String,
    pub form: Form,
    /// Fields not shown in the form, carried through on save
    loaded: Instructions,
    pub editing: bool,
    pub loading: bool,
    pub saving: bool,
    /// Open suggestion picker and its cursor
    pub suggestion: Option<usize>,
}

impl InstructScreen {
    pub fn new(course_id: &str) -> Self {
        let loaded = Instructions::default();
        Self {
            course_id: course_id.to_string(),
            form: instructions_form(&loaded),
            loaded,
            editing: true,
            loading: false,
            saving: false,
            suggestion: None,
        }
    }

    fn route(&self) -> Route {
        Route::Instruct(self.course_id.clone())
    }

    /// Replace the instructions field with suggestion `index`
    pub fn apply_suggestion(&mut self, index: usize) {
        if let (Some(text), Some(field)) =
            (SUGGESTIONS.get(index), self.form.field_mut("instructions"))
        {
            field.set_value(text);
        }
    }

    fn save(&mut self) -> Vec<Effect> {
        if self.saving || self.loading {
            return Vec::new();
        }
        if !self.form.is_valid() {
            return vec![Effect::Notify(Notification::error("A title is required"))];
        }
        self.saving = true;
        let instructions = Instructions {
            title: self.form.value("title"),
            summary: self.form.value("summary"),
            instructions: self.form.value("instructions"),
            ..self.loaded.clone()
        };
        vec![Effect::Run(Command::SaveInstructions {
            course_id: self.course_id.clone(),
            instructions,
        })]
    }

    fn handle_suggestion_key(&mut self, cursor: usize, key: KeyCode) {
        let mut cursor = cursor;
        if move_selection(&mut cursor, SUGGESTIONS.len(), key) {
            self.suggestion = Some(cursor);
            return;
        }
        match key {
            KeyCode::Enter => {
                self.apply_suggestion(cursor);
                self.suggestion = None;
            }
            KeyCode::Esc => self.suggestion = None,
            _ => {}
        }
    }
}

impl ScreenState for InstructScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if let Some(cursor) = self.suggestion {
            self.handle_suggestion_key(cursor, key);
            return Vec::new();
        }
        match key {
            KeyCode::F(2) => return self.save(),
            KeyCode::F(3) => {
                self.suggestion = Some(0);
                return Vec::new();
            }
            _ => {}
        }
        if !self.editing {
            if matches!(key, KeyCode::Char('i') | KeyCode::Enter) {
                self.editing = true;
            }
            return Vec::new();
        }
        if key == KeyCode::Esc {
            self.editing = false;
        } else {
            self.form.handle_key(key);
        }
        Vec::new()
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                let route = self.route();
                require_session(&snapshot, &route, || {
                    self.loading = true;
                    vec![Effect::Run(Command::LoadInstructions(self.course_id.clone()))]
                })
            }
            Outcome::InstructionsLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(Some(instructions)) => {
                        self.form = instructions_form(&instructions);
                        self.loaded = instructions;
                        Vec::new()
                    }
                    Ok(None) => vec![Effect::Notify(Notification::info(
                        "Instructions are still being generated; press F2 to save your own",
                    ))],
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not load instructions",
                        &e,
                    ))],
                }
            }
            Outcome::InstructionsSaved(result) => {
                self.saving = false;
                match result {
                    Ok(()) => vec![Effect::navigate(Route::Review(self.course_id.clone()))],
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not save instructions",
                        &e,
                    ))],
                }
            }
            _ => Vec::new(),
        }
    }

    fn is_capturing(&self) -> bool {
        self.editing || self.suggestion.is_some()
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::Editor
    }
}
