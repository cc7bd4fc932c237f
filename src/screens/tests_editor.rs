//! Last wizard step: review generated questions, grouped by chunk.

use crossterm::event::KeyCode;

use super::{
    clamp_selection, move_selection, require_session, Command, Effect, Notification, Outcome,
    ScreenState,
};
use crate::api::{Chunk, Test};
use crate::routes::Route;
use crate::screens::lessons::bullets_from_text;
use crate::ui::dialogs::{ConfirmDialog, ConfirmSelection};
use crate::ui::form_field::{Form, FormField, NamedField};
use crate::ui::keybindings::ShortcutContext;

pub struct TestsEditorScreen {
    pub course_id: String,
    pub chunks: Vec<Chunk>,
    pub tests: Vec<Test>,
    /// Index into `chunks`
    pub chunk_index: usize,
    /// Index into the selected chunk's tests
    pub selected: usize,
    pub loading: bool,
    pub editor: Option<(String, Form)>,
    pub saving: bool,
    pub confirm: ConfirmDialog,
    pending_delete: Option<String>,
}

impl TestsEditorScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            chunks: Vec::new(),
            tests: Vec::new(),
            chunk_index: 0,
            selected: 0,
            loading: false,
            editor: None,
            saving: false,
            confirm: ConfirmDialog::new(),
            pending_delete: None,
        }
    }

    pub fn current_chunk(&self) -> Option<&Chunk> {
        self.chunks.get(self.chunk_index)
    }

    /// Tests belonging to the selected chunk
    pub fn chunk_tests(&self) -> Vec<&Test> {
        match self.current_chunk() {
            Some(chunk) => self
                .tests
                .iter()
                .filter(|t| t.chunk_id == chunk.chunk_id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn selected_test(&self) -> Option<&Test> {
        self.chunk_tests().get(self.selected).copied()
    }

    fn select_chunk(&mut self, index: usize) {
        self.chunk_index = clamp_selection(index, self.chunks.len());
        self.selected = 0;
    }

    fn open_editor(&mut self) {
        let Some(test) = self.selected_test() else {
            return;
        };
        let form = Form::new(vec![
            NamedField::new(
                "test_question",
                "Question",
                FormField::text_input(&test.test_question, "Question text"),
            )
            .required(),
            NamedField::new(
                "correct_option",
                "Correct answer",
                FormField::text_input(&test.correct_option, "The right answer"),
            )
            .required(),
            NamedField::new(
                "incorrect_options",
                "Wrong answers (one per line)",
                FormField::text_area(&test.incorrect_options.join("\n"), "Distractors"),
            ),
        ]);
        self.editor = Some((test.test_id.clone(), form));
    }

    fn save_editor(&mut self) -> Vec<Effect> {
        let Some((test_id, form)) = self.editor.as_ref() else {
            return Vec::new();
        };
        if self.saving {
            return Vec::new();
        }
        if !form.is_valid() {
            return vec![Effect::Notify(Notification::error(
                "A question and its correct answer are required",
            ))];
        }
        let Some(original) = self.tests.iter().find(|t| t.test_id == *test_id) else {
            return Vec::new();
        };
        let updated = Test {
            test_question: form.value("test_question"),
            correct_option: form.value("correct_option"),
            incorrect_options: bullets_from_text(&form.value("incorrect_options")),
            ..original.clone()
        };
        self.saving = true;
        vec![Effect::Run(Command::UpdateTest(updated))]
    }
}

impl ScreenState for TestsEditorScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if self.confirm.visible {
            let choice = self.confirm.handle_key(key);
            if choice.is_none() {
                return Vec::new();
            }
            return match (choice, self.pending_delete.take()) {
                (Some(ConfirmSelection::Yes), Some(test_id)) => {
                    vec![Effect::Run(Command::DeleteTest(test_id))]
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
        let count = self.chunk_tests().len();
        if move_selection(&mut self.selected, count, key) {
            return Vec::new();
        }
        match key {
            KeyCode::Left | KeyCode::Char('h') => {
                self.select_chunk(self.chunk_index.saturating_sub(1));
                Vec::new()
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.select_chunk(self.chunk_index + 1);
                Vec::new()
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.open_editor();
                Vec::new()
            }
            KeyCode::Char('d') => {
                if let Some(test) = self.selected_test() {
                    let message = format!("Delete \"{}\"?", test.test_question);
                    self.pending_delete = Some(test.test_id.clone());
                    self.confirm.show("Delete question", message);
                }
                Vec::new()
            }
            KeyCode::Char('f') | KeyCode::F(2) => {
                vec![Effect::navigate(Route::Quiz(self.course_id.clone()))]
            }
            _ => Vec::new(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                let route = Route::TestsEditor(self.course_id.clone());
                require_session(&snapshot, &route, || {
                    self.loading = true;
                    vec![Effect::Run(Command::LoadTests(self.course_id.clone()))]
                })
            }
            Outcome::TestsLoaded(result) => {
                self.loading = false;
                match result {
                    Ok((chunks, tests)) => {
                        self.chunks = chunks;
                        self.tests = tests;
                        self.select_chunk(self.chunk_index);
                        Vec::new()
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not load tests",
                        &e,
                    ))],
                }
            }
            Outcome::TestUpdated(result) => {
                self.saving = false;
                match result {
                    Ok(test) => {
                        if let Some(slot) = self.tests.iter_mut().find(|t| t.test_id == test.test_id)
                        {
                            *slot = test;
                        }
                        self.editor = None;
                        vec![Effect::Notify(Notification::success("Question saved"))]
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not save question",
                        &e,
                    ))],
                }
            }
            Outcome::TestDeleted { test_id, result } => match result {
                Ok(()) => {
                    self.tests.retain(|t| t.test_id != test_id);
                    self.selected = clamp_selection(self.selected, self.chunk_tests().len());
                    vec![Effect::Notify(Notification::success("Question deleted"))]
                }
                Err(e) => vec![Effect::Notify(Notification::failed(
                    "Could not delete question",
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

    fn chunk(id: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            source_id: "c1".to_string(),
            chunk_title: format!("Chunk {}", id),
            chunk_content: String::new(),
        }
    }

    fn test(id: &str, chunk_id: &str) -> Test {
        Test {
            test_id: id.to_string(),
            course_id: "c1".to_string(),
            chunk_id: chunk_id.to_string(),
            test_question: format!("Question {}", id),
            correct_option: "yes".to_string(),
            incorrect_options: vec!["no".to_string(), "maybe".to_string()],
        }
    }

    fn loaded() -> TestsEditorScreen {
        let mut screen = TestsEditorScreen::new("c1");
        let effects = screen.apply(Outcome::Session(signed_in()));
        assert_eq!(commands(&effects), vec![&Command::LoadTests("c1".to_string())]);
        screen.apply(Outcome::TestsLoaded(Ok((
            vec![chunk("k1"), chunk("k2")],
            vec![test("t1", "k1"), test("t2", "k2"), test("t3", "k2")],
        ))));
        screen
    }

    #[test]
    fn test_tests_are_grouped_by_selected_chunk() {
        let mut screen = loaded();
        assert_eq!(screen.chunk_tests().len(), 1);

        screen.handle_key(KeyCode::Right);
        let ids: Vec<_> = screen.chunk_tests().iter().map(|t| t.test_id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t3"]);

        screen.handle_key(KeyCode::Right);
        assert_eq!(screen.chunk_index, 1);
    }

    #[test]
    fn test_edit_question() {
        let mut screen = loaded();
        screen.handle_key(KeyCode::Enter);
        screen.handle_key(KeyCode::Char('?'));
        let effects = screen.handle_key(KeyCode::F(2));

        let expected = Test {
            test_question: "Question t1?".to_string(),
            ..test("t1", "k1")
        };
        assert_eq!(commands(&effects), vec![&Command::UpdateTest(expected.clone())]);
        screen.apply(Outcome::TestUpdated(Ok(expected)));
        assert_eq!(screen.tests[0].test_question, "Question t1?");
    }

    #[test]
    fn test_delete_and_finish() {
        let mut screen = loaded();
        screen.handle_key(KeyCode::Right);
        screen.handle_key(KeyCode::Down);
        screen.handle_key(KeyCode::Char('d'));
        let effects = screen.handle_key(KeyCode::Char('y'));
        assert_eq!(commands(&effects), vec![&Command::DeleteTest("t3".to_string())]);

        screen.apply(Outcome::TestDeleted {
            test_id: "t3".to_string(),
            result: Ok(()),
        });
        assert_eq!(screen.tests.len(), 2);
        assert_eq!(screen.selected, 0);

        assert_eq!(navigations(&screen.handle_key(KeyCode::Char('f'))), vec!["/test/c1"]);
    }
}
