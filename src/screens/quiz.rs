//! Take a course's multiple-choice test.

use crossterm::event::KeyCode;

use super::{Command, Effect, Notification, Outcome, ScreenState};
use crate::api::{Chunk, ScoreSubmission, Test};
use crate::routes::Route;
use crate::ui::keybindings::ShortcutContext;

/// Correct and incorrect counts over the answered questions only.
///
/// `answers[i]` is the chosen index into `tests[i].options()`.
pub fn tally(course_id: &str, tests: &[Test], answers: &[Option<usize>]) -> ScoreSubmission {
    let mut correct_score = 0;
    let mut incorrect_score = 0;
    for (test, answer) in tests.iter().zip(answers) {
        let Some(choice) = answer else { continue };
        let options = test.options();
        match options.get(*choice) {
            Some(option) if *option == test.correct_option => correct_score += 1,
            _ => incorrect_score += 1,
        }
    }
    ScoreSubmission {
        course_id: course_id.to_string(),
        correct_score,
        incorrect_score,
    }
}

pub struct QuizScreen {
    pub course_id: String,
    pub chunks: Vec<Chunk>,
    pub tests: Vec<Test>,
    /// One slot per test
    pub answers: Vec<Option<usize>>,
    /// Question being shown
    pub index: usize,
    /// Highlighted option of the current question
    pub cursor: usize,
    /// Show the source chunk instead of the options
    pub show_chunk: bool,
    pub loading: bool,
    pub submitting: bool,
}

impl QuizScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            chunks: Vec::new(),
            tests: Vec::new(),
            answers: Vec::new(),
            index: 0,
            cursor: 0,
            show_chunk: false,
            loading: false,
            submitting: false,
        }
    }

    pub fn current_test(&self) -> Option<&Test> {
        self.tests.get(self.index)
    }

    /// Chunk the current question was generated from
    pub fn current_chunk(&self) -> Option<&Chunk> {
        let test = self.current_test()?;
        self.chunks.iter().find(|c| c.chunk_id == test.chunk_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn can_finish(&self) -> bool {
        self.answered_count() > 0 && !self.submitting
    }

    fn option_count(&self) -> usize {
        self.current_test()
            .map_or(0, |t| 1 + t.incorrect_options.len())
    }

    fn go_to(&mut self, index: usize) {
        self.index = index.min(self.tests.len().saturating_sub(1));
        self.cursor = self
            .answers
            .get(self.index)
            .copied()
            .flatten()
            .unwrap_or(0);
        self.show_chunk = false;
    }

    fn finish(&mut self) -> Vec<Effect> {
        if self.submitting {
            return Vec::new();
        }
        if self.answered_count() == 0 {
            return vec![Effect::Notify(Notification::error(
                "Answer at least one question before finishing",
            ))];
        }
        self.submitting = true;
        let submission = tally(&self.course_id, &self.tests, &self.answers);
        vec![Effect::Run(Command::SubmitScore(submission))]
    }
}

impl ScreenState for QuizScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.option_count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(slot) = self.answers.get_mut(self.index) {
                    *slot = Some(self.cursor);
                }
            }
            KeyCode::Char('c') => {
                if let Some(slot) = self.answers.get_mut(self.index) {
                    *slot = None;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.go_to(self.index.saturating_sub(1)),
            KeyCode::Right | KeyCode::Char('l') => self.go_to(self.index + 1),
            KeyCode::Char('v') => self.show_chunk = !self.show_chunk,
            KeyCode::Char('f') | KeyCode::F(2) => return self.finish(),
            _ => {}
        }
        Vec::new()
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            // Anyone may take a quiz; only saving the score needs a session
            Outcome::Session(_) => {
                self.loading = true;
                vec![Effect::Run(Command::LoadTests(self.course_id.clone()))]
            }
            Outcome::TestsLoaded(result) => {
                self.loading = false;
                match result {
                    Ok((chunks, tests)) => {
                        self.answers = vec![None; tests.len()];
                        self.chunks = chunks;
                        self.tests = tests;
                        self.go_to(0);
                        Vec::new()
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not load the test",
                        &e,
                    ))],
                }
            }
            Outcome::ScoreSubmitted(result) => {
                self.submitting = false;
                match result {
                    Ok(_) => vec![Effect::navigate(Route::Scores(self.course_id.clone()))],
                    Err(e) if e.is_unprocessable() => vec![Effect::Notify(Notification::error(
                        "You must be signed in to submit scores",
                    ))],
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not submit score",
                        &e,
                    ))],
                }
            }
            _ => Vec::new(),
        }
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::Quiz
    }
}
