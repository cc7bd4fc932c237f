//! Course list: search, open, delete.

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::debug;

use super::{
    clamp_selection, move_selection, require_session, Command, Effect, Notification, Outcome,
    ScreenState,
};
use crate::api::CourseInfo;
use crate::debounce::Debouncer;
use crate::routes::Route;
use crate::ui::dialogs::{ConfirmDialog, ConfirmSelection};
use crate::ui::keybindings::ShortcutContext;

/// Courses whose name or source contains `query`, ignoring case, in their original order
pub fn filter_courses(courses: &[CourseInfo], query: &str) -> Vec<CourseInfo> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return courses.to_vec();
    }
    courses
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle) || c.source.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Remove the first course with `course_id`; true when one was removed
fn remove_one(list: &mut Vec<CourseInfo>, course_id: &str) -> bool {
    match list.iter().position(|c| c.course_id == course_id) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

pub struct CoursesScreen {
    pub all: Vec<CourseInfo>,
    /// `all` filtered by the applied query
    pub visible: Vec<CourseInfo>,
    /// What is typed in the search box
    pub query: String,
    /// What the list is currently filtered by
    pub applied_query: String,
    pub searching: bool,
    debouncer: Debouncer<String>,
    pub selected: usize,
    pub loading: bool,
    pub load_error: Option<String>,
    pub confirm: ConfirmDialog,
    pending_delete: Option<String>,
    /// Course whose delete call is in flight
    pub deleting: Option<String>,
}

impl CoursesScreen {
    pub fn new(search_debounce: Duration) -> Self {
        Self {
            all: Vec::new(),
            visible: Vec::new(),
            query: String::new(),
            applied_query: String::new(),
            searching: false,
            debouncer: Debouncer::new(search_debounce),
            selected: 0,
            loading: false,
            load_error: None,
            confirm: ConfirmDialog::new(),
            pending_delete: None,
            deleting: None,
        }
    }

    pub fn selected_course(&self) -> Option<&CourseInfo> {
        self.visible.get(self.selected)
    }

    fn load(&mut self) -> Vec<Effect> {
        self.loading = true;
        self.load_error = None;
        vec![Effect::Run(Command::LoadCourses)]
    }

    fn refilter(&mut self) {
        self.visible = filter_courses(&self.all, &self.applied_query);
        self.selected = clamp_selection(self.selected, self.visible.len());
    }

    fn apply_query(&mut self, query: String) {
        debug!(query = %query, "filtering courses");
        self.applied_query = query;
        self.refilter();
    }

    fn handle_search_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Enter => {
                self.debouncer.flush();
                self.apply_query(self.query.clone());
                self.searching = false;
            }
            KeyCode::Esc => self.searching = false,
            KeyCode::Backspace => {
                self.query.pop();
                self.debouncer.push(self.query.clone(), Instant::now());
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.debouncer.push(self.query.clone(), Instant::now());
            }
            _ => {}
        }
        Vec::new()
    }

    fn confirm_delete(&mut self, choice: ConfirmSelection) -> Vec<Effect> {
        let Some(course_id) = self.pending_delete.take() else {
            return Vec::new();
        };
        if choice != ConfirmSelection::Yes || self.deleting.is_some() {
            return Vec::new();
        }
        self.deleting = Some(course_id.clone());
        vec![Effect::Run(Command::DeleteCourse(course_id))]
    }

    fn open(&self, route: fn(String) -> Route) -> Vec<Effect> {
        self.selected_course()
            .map(|c| vec![Effect::navigate(route(c.course_id.clone()))])
            .unwrap_or_default()
    }
}

impl ScreenState for CoursesScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if self.confirm.visible {
            return match self.confirm.handle_key(key) {
                Some(choice) => self.confirm_delete(choice),
                None => Vec::new(),
            };
        }
        if self.searching {
            return self.handle_search_key(key);
        }
        if move_selection(&mut self.selected, self.visible.len(), key) {
            return Vec::new();
        }

        match key {
            KeyCode::Char('/') => {
                self.searching = true;
                Vec::new()
            }
            KeyCode::Char('r') => self.load(),
            KeyCode::Char('n') => vec![Effect::navigate(Route::Upload)],
            KeyCode::Enter | KeyCode::Char('t') => self.open(Route::Quiz),
            KeyCode::Char('m') => self.open(Route::LessonMedia),
            KeyCode::Char('e') => self.open(Route::Review),
            KeyCode::Char('d') => {
                if self.deleting.is_some() {
                    return vec![Effect::Notify(Notification::info(
                        "A delete is already in progress",
                    ))];
                }
                if let Some(course) = self.selected_course() {
                    let message = format!("Delete \"{}\"? This cannot be undone.", course.name);
                    self.pending_delete = Some(course.course_id.clone());
                    self.confirm.show("Delete course", message);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                require_session(&snapshot, &Route::Courses, || self.load())
            }
            Outcome::CoursesLoaded(Ok(courses)) => {
                self.loading = false;
                self.all = courses;
                self.refilter();
                Vec::new()
            }
            Outcome::CoursesLoaded(Err(e)) => {
                self.loading = false;
                self.load_error = Some(e.to_string());
                vec![Effect::Notify(Notification::failed(
                    "Could not load courses",
                    &e,
                ))]
            }
            Outcome::CourseDeleted { course_id, result } => {
                self.deleting = None;
                match result {
                    Ok(()) => {
                        remove_one(&mut self.all, &course_id);
                        remove_one(&mut self.visible, &course_id);
                        self.selected = clamp_selection(self.selected, self.visible.len());
                        vec![Effect::Notify(Notification::success("Course deleted"))]
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not delete course",
                        &e,
                    ))],
                }
            }
            _ => Vec::new(),
        }
    }

    fn tick(&mut self, now: Instant) -> Vec<Effect> {
        if let Some(query) = self.debouncer.poll(now) {
            self.apply_query(query);
        }
        Vec::new()
    }

    fn is_capturing(&self) -> bool {
        self.searching || self.confirm.visible
    }

    fn shortcut_context(&self) -> ShortcutContext {
        ShortcutContext::Courses
    }
}
