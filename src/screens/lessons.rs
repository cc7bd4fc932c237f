//! Generated lesson slides: title, subtitle and bullet points.

use crossterm::event::KeyCode;

use super::{
    clamp_selection, move_selection, require_session, Command, Effect, Notification, Outcome,
    ScreenState,
};
use crate::api::Lesson;
use crate::routes::Route;
use crate::ui::dialogs::{ConfirmDialog, ConfirmSelection};
use crate::ui::form_field::{Form, FormField, NamedField};
use crate::ui::keybindings::ShortcutContext;

/// One bullet per non-blank line
pub fn bullets_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_start_matches(['-', '*', '•']).trim_start().to_string())
        .collect()
}

pub struct LessonsScreen {
    pub course_id: String,
    pub lessons: Vec<Lesson>,
    pub selected: usize,
    pub loading: bool,
    pub editor: Option<(String, Form)>,
    pub saving: bool,
    pub confirm: ConfirmDialog,
    pending_delete: Option<String>,
}

impl LessonsScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            lessons: Vec::new(),
            selected: 0,
            loading: false,
            editor: None,
            saving: false,
            confirm: ConfirmDialog::new(),
            pending_delete: None,
        }
    }

    pub fn selected_lesson(&self) -> Option<&Lesson> {
        self.lessons.get(self.selected)
    }

    fn open_editor(&mut self) {
        let Some(lesson) = self.selected_lesson() else {
            return;
        };
        let form = Form::new(vec![
            NamedField::new(
                "title",
                "Title",
                FormField::text_input(&lesson.title, "Slide title"),
            )
            .required(),
            NamedField::new(
                "subtitle",
                "Subtitle",
                FormField::text_input(&lesson.subtitle, "Slide subtitle"),
            ),
            NamedField::new(
                "bullet_points",
                "Bullet points (one per line)",
                FormField::text_area(&lesson.bullet_points.join("\n"), "Key points"),
            ),
        ]);
        self.editor = Some((lesson.lesson_id.clone(), form));
    }

    fn save_editor(&mut self) -> Vec<Effect> {
        let Some((lesson_id, form)) = self.editor.as_ref() else {
            return Vec::new();
        };
        if self.saving {
            return Vec::new();
        }
        if !form.is_valid() {
            return vec![Effect::Notify(Notification::error("A title is required"))];
        }
        let Some(original) = self.lessons.iter().find(|l| l.lesson_id == *lesson_id) else {
            return Vec::new();
        };
        let updated = Lesson {
            title: form.value("title"),
            subtitle: form.value("subtitle"),
            bullet_points: bullets_from_text(&form.value("bullet_points")),
            ..original.clone()
        };
        self.saving = true;
        vec![Effect::Run(Command::UpdateLesson(updated))]
    }
}

impl ScreenState for LessonsScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if self.confirm.visible {
            let choice = self.confirm.handle_key(key);
            if choice.is_none() {
                return Vec::new();
            }
            return match (choice, self.pending_delete.take()) {
                (Some(ConfirmSelection::Yes), Some(lesson_id)) => {
                    vec![Effect::Run(Command::DeleteLesson(lesson_id))]
                }
                _ => Vec::new(),
            };
        }
        if let Some((_, form)) = self.editor.as_mut() {
            return match key {
                KeyCode::Esc => {
                    self.editor = None;
                    Vec::new()
                }
                KeyCode::F(2) => self.save_editor(),
                _ => {
                    form.handle_key(key);
                    Vec::new()
                }
            };
        }
        if move_selection(&mut self.selected, self.lessons.len(), key) {
            return Vec::new();
        }
        match key {
            KeyCode::Char('e') | KeyCode::Enter => {
                self.open_editor();
                Vec::new()
            }
            KeyCode::Char('d') => {
                if let Some(lesson) = self.selected_lesson() {
                    let message = format!("Delete lesson \"{}\"?", lesson.title);
                    self.pending_delete = Some(lesson.lesson_id.clone());
                    self.confirm.show("Delete lesson", message);
                }
                Vec::new()
            }
            KeyCode::Char('f') | KeyCode::F(2) => {
                vec![Effect::navigate(Route::TestsEditor(self.course_id.clone()))]
            }
            _ => Vec::new(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                let route = Route::Lessons(self.course_id.clone());
                require_session(&snapshot, &route, || {
                    self.loading = true;
                    vec![Effect::Run(Command::LoadLessons(self.course_id.clone()))]
                })
            }
            Outcome::LessonsLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(lessons) => {
                        self.lessons = lessons;
                        self.selected = clamp_selection(self.selected, self.lessons.len());
                        Vec::new()
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not load lessons",
                        &e,
                    ))],
                }
            }
            Outcome::LessonUpdated(result) => {
                self.saving = false;
                match result {
                    Ok(lesson) => {
                        if let Some(slot) = self
                            .lessons
                            .iter_mut()
                            .find(|l| l.lesson_id == lesson.lesson_id)
                        {
                            *slot = lesson;
                        }
                        self.editor = None;
                        vec![Effect::Notify(Notification::success("Lesson saved"))]
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not save lesson",
                        &e,
                    ))],
                }
            }
            Outcome::LessonDeleted { lesson_id, result } => match result {
                Ok(()) => {
                    self.lessons.retain(|l| l.lesson_id != lesson_id);
                    self.selected = clamp_selection(self.selected, self.lessons.len());
                    vec![Effect::Notify(Notification::success("Lesson deleted"))]
                }
                Err(e) => vec![Effect::Notify(Notification::failed(
                    "Could not delete lesson",
                    &e,
                ))],
            },
            _ => Vec::new(),
        }
    }

    fn is_capturing(&self) -> bool {
        self.editor.is_some() || self.confirm.visible
    }

    fn shortcut_context(&self) -> ShortcutContext {
        if self.editor.is_some() {
            ShortcutContext::Editor
        } else {
            ShortcutContext::List
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::{commands, navigations, signed_in};

    fn lesson(id: &str, title: &str, bullets: &[&str]) -> Lesson {
        Lesson {
            lesson_id: id.to_string(),
            course_id: "c1".to_string(),
            chunk_id: "k1".to_string(),
            title: title.to_string(),
            subtitle: String::new(),
            bullet_points: bullets.iter().map(|b| b.to_string()).collect(),
        }
    }

    fn loaded() -> LessonsScreen {
        let mut screen = LessonsScreen::new("c1");
        let effects = screen.apply(Outcome::Session(signed_in()));
        assert_eq!(
            commands(&effects),
            vec![&Command::LoadLessons("c1".to_string())]
        );
        screen.apply(Outcome::LessonsLoaded(Ok(vec![
            lesson("l1", "Vectors", &["Magnitude", "Direction"]),
            lesson("l2", "Matrices", &[]),
        ])));
        screen
    }

    #[test]
    fn test_bullets_from_text_drops_blanks_and_markers() {
        assert_eq!(
            bullets_from_text("- one\n\n  * two  \n• three\nfour"),
            vec!["one", "two", "three", "four"]
        );
    }

    #[test]
    fn test_edit_round_trips_bullets() {
        let mut screen = loaded();
        screen.handle_key(KeyCode::Char('e'));
        if let Some((_, form)) = screen.editor.as_mut() {
            if let Some(field) = form.field_mut("bullet_points") {
                field.set_value("Magnitude\nDirection\nUnit vectors");
            }
        }

        let effects = screen.handle_key(KeyCode::F(2));
        let expected = lesson("l1", "Vectors", &["Magnitude", "Direction", "Unit vectors"]);
        assert_eq!(
            commands(&effects),
            vec![&Command::UpdateLesson(expected.clone())]
        );

        screen.apply(Outcome::LessonUpdated(Ok(expected)));
        assert_eq!(screen.lessons[0].bullet_points.len(), 3);
        assert!(screen.editor.is_none());
    }

    #[test]
    fn test_delete_and_proceed() {
        let mut screen = loaded();
        screen.handle_key(KeyCode::Down);
        screen.handle_key(KeyCode::Char('d'));
        let effects = screen.handle_key(KeyCode::Char('y'));
        assert_eq!(
            commands(&effects),
            vec![&Command::DeleteLesson("l2".to_string())]
        );
        screen.apply(Outcome::LessonDeleted {
            lesson_id: "l2".to_string(),
            result: Ok(()),
        });
        assert_eq!(screen.lessons.len(), 1);
        assert_eq!(screen.selected, 0);

        assert_eq!(
            navigations(&screen.handle_key(KeyCode::Char('f'))),
            vec!["/gen/tests/c1"]
        );
    }
}
