//! Review and correct the markdown extracted from the source.

use crossterm::event::KeyCode;

use super::{require_session, Command, Effect, Notification, Outcome, ScreenState};
use crate::api::CourseContent;
use crate::routes::Route;
use crate::ui::form_field::{Form, FormField, NamedField};
use crate::ui::keybindings::ShortcutContext;

fn content_form(content: &CourseContent) -> Form {
    Form::new(vec![
        NamedField::new(
            "name",
            "Course name",
            FormField::text_input(&content.name, "Name shown on the course list"),
        )
        .required(),
        NamedField::new(
            "markdown",
            "Content",
            FormField::text_area(&content.markdown, "Extracted markdown"),
        ),
    ])
}

pub struct ReviewScreen {
    pub course_id: String,
    pub form: Form,
    pub editing: bool,
    pub loading: bool,
    pub saving: bool,
}

impl ReviewScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            form: content_form(&CourseContent::default()),
            editing: true,
            loading: false,
            saving: false,
        }
    }

    fn save(&mut self) -> Vec<Effect> {
        if self.saving || self.loading {
            return Vec::new();
        }
        if !self.form.is_valid() {
            return vec![Effect::Notify(Notification::error("A course name is required"))];
        }
        self.saving = true;
        vec![Effect::Run(Command::SaveContent {
            course_id: self.course_id.clone(),
            content: CourseContent {
                name: self.form.value("name"),
                markdown: self.form.value("markdown"),
            },
        })]
    }
}

impl ScreenState for ReviewScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if key == KeyCode::F(2) {
            return self.save();
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
                let route = Route::Review(self.course_id.clone());
                require_session(&snapshot, &route, || {
                    self.loading = true;
                    vec![Effect::Run(Command::LoadContent(self.course_id.clone()))]
                })
            }
            Outcome::ContentLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(Some(content)) => {
                        self.form = content_form(&content);
                        Vec::new()
                    }
                    Ok(None) => vec![Effect::Notify(Notification::info(
                        "No content has been extracted for this course yet",
                    ))],
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not load course content",
                        &e,
                    ))],
                }
            }
            Outcome::ContentSaved(result) => {
                self.saving = false;
                match result {
                    Ok(()) => vec![Effect::navigate(Route::Chunks(self.course_id.clone()))],
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not save course content",
                        &e,
                    ))],
                }
            }
            _ => Vec::new(),
        }
    }

    fn is_capturing(&self) -> bool {
        self.editing
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::Editor
    }
}
