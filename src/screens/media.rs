//! Download the generated lesson deck.

use std::path::PathBuf;

use crossterm::event::KeyCode;

use super::{Command, Effect, Notification, Outcome, ScreenState};
use crate::api::MediaFormat;
use crate::routes::Route;
use crate::ui::keybindings::ShortcutContext;

pub struct MediaScreen {
    pub course_id: String,
    /// Format currently being fetched
    pub downloading: Option<MediaFormat>,
    /// Files saved during this visit
    pub saved: Vec<PathBuf>,
}

impl MediaScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            downloading: None,
            saved: Vec::new(),
        }
    }

    fn download(&mut self, format: MediaFormat) -> Vec<Effect> {
        if self.downloading.is_some() {
            return Vec::new();
        }
        self.downloading = Some(format);
        vec![Effect::Run(Command::Download {
            course_id: self.course_id.clone(),
            format,
        })]
    }
}

impl ScreenState for MediaScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Char('p') => self.download(MediaFormat::Pptx),
            KeyCode::Char('d') => self.download(MediaFormat::Pdf),
            KeyCode::Char('t') | KeyCode::F(2) => {
                vec![Effect::navigate(Route::Quiz(self.course_id.clone()))]
            }
            _ => Vec::new(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Downloaded(result) => {
                self.downloading = None;
                match result {
                    Ok(path) => {
                        let message = format!("Saved {}", path.display());
                        self.saved.push(path);
                        vec![Effect::Notify(Notification::success(message))]
                    }
                    Err(e) => vec![Effect::Notify(Notification::error(format!(
                        "Download failed: {}",
                        e
                    )))],
                }
            }
            _ => Vec::new(),
        }
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::Media
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::screens::testing::{commands, navigations, notifications};

    #[test]
    fn test_one_download_at_a_time() {
        let mut screen = MediaScreen::new("c1");
        let effects = screen.handle_key(KeyCode::Char('p'));
        assert_eq!(
            commands(&effects),
            vec![&Command::Download {
                course_id: "c1".to_string(),
                format: MediaFormat::Pptx,
            }]
        );
        assert!(screen.handle_key(KeyCode::Char('d')).is_empty());

        let effects = screen.apply(Outcome::Downloaded(Ok(PathBuf::from(
            "/tmp/Lessons_c1.pptx",
        ))));
        assert_eq!(
            notifications(&effects)[0].message,
            "Saved /tmp/Lessons_c1.pptx"
        );
        assert!(screen.downloading.is_none());
        assert_eq!(screen.saved.len(), 1);
    }

    #[test]
    fn test_failed_download_is_reported() {
        let mut screen = MediaScreen::new("c1");
        screen.handle_key(KeyCode::Char('d'));
        let effects = screen.apply(Outcome::Downloaded(Err(
            ApiError::from_status("backend", 404, r#"{"detail": "No lessons"}"#).into(),
        )));
        assert_eq!(
            notifications(&effects)[0].message,
            "Download failed: backend: Not found (404) - No lessons"
        );
        assert!(screen.saved.is_empty());
    }

    #[test]
    fn test_take_the_test() {
        let mut screen = MediaScreen::new("c1");
        assert_eq!(navigations(&screen.handle_key(KeyCode::Char('t'))), vec!["/test/c1"]);
    }
}
