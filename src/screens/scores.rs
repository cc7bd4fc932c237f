//! Result of the latest quiz attempt.

use crossterm::event::KeyCode;

use super::{require_session, Command, Effect, Notification, Outcome, ScreenState};
use crate::api::Score;
use crate::routes::Route;
use crate::ui::keybindings::ShortcutContext;

pub struct ScoresScreen {
    pub course_id: String,
    /// `None` until loaded, `Some(None)` when nothing is stored yet
    pub score: Option<Option<Score>>,
    pub loading: bool,
}

impl ScoresScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            score: None,
            loading: false,
        }
    }

    /// Summary lines shown under the heading
    pub fn summary(&self) -> Vec<String> {
        match &self.score {
            None => vec!["Loading score...".to_string()],
            Some(None) => vec!["No score recorded for this course yet.".to_string()],
            Some(Some(score)) => vec![
                format!("Attempted: {}", score.attempted()),
                format!("Correct:   {}", score.correct_score),
                format!("Incorrect: {}", score.incorrect_score),
                format!("Score:     {}%", score.percentage()),
            ],
        }
    }
}

impl ScreenState for ScoresScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Char('r') => vec![Effect::navigate(Route::Quiz(self.course_id.clone()))],
            KeyCode::Char('m') => {
                vec![Effect::navigate(Route::LessonMedia(self.course_id.clone()))]
            }
            KeyCode::Enter => vec![Effect::navigate(Route::Courses)],
            _ => Vec::new(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                let route = Route::Scores(self.course_id.clone());
                require_session(&snapshot, &route, || {
                    self.loading = true;
                    vec![Effect::Run(Command::LoadScore(self.course_id.clone()))]
                })
            }
            Outcome::ScoreLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(score) => {
                        self.score = Some(score);
                        Vec::new()
                    }
                    Err(e) => {
                        self.score = Some(None);
                        vec![Effect::Notify(Notification::failed(
                            "Could not load score",
                            &e,
                        ))]
                    }
                }
            }
            _ => Vec::new(),
        }
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::Scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionSnapshot;
    use crate::screens::testing::{commands, navigations, signed_in};

    #[test]
    fn test_loads_score_when_signed_in() {
        let mut screen = ScoresScreen::new("c1");
        let effects = screen.apply(Outcome::Session(signed_in()));
        assert_eq!(commands(&effects), vec![&Command::LoadScore("c1".to_string())]);

        screen.apply(Outcome::ScoreLoaded(Ok(Some(Score {
            score_id: None,
            course_id: "c1".to_string(),
            user_id: Some("u1".to_string()),
            correct_score: 3,
            incorrect_score: 1,
        }))));
        let summary = screen.summary();
        assert_eq!(summary[0], "Attempted: 4");
        assert_eq!(summary[3], "Score:     75%");
    }

    #[test]
    fn test_signed_out_redirects() {
        let mut screen = ScoresScreen::new("c1");
        let effects = screen.apply(Outcome::Session(SessionSnapshot::default()));
        assert_eq!(
            navigations(&effects),
            vec!["/register?callback=/test/scores/c1"]
        );
    }

    #[test]
    fn test_missing_score_and_navigation() {
        let mut screen = ScoresScreen::new("c1");
        screen.apply(Outcome::ScoreLoaded(Ok(None)));
        assert!(screen.summary()[0].starts_with("No score"));

        assert_eq!(navigations(&screen.handle_key(KeyCode::Char('r'))), vec!["/test/c1"]);
        assert_eq!(navigations(&screen.handle_key(KeyCode::Enter)), vec!["/courses"]);
    }
}
