//! Keyboard shortcut registry.
//!
//! The help dialog and the footer hints both read from [`SHORTCUTS`], so a
//! key binding is documented in exactly one place.

use crossterm::event::KeyCode;

use self::ShortcutCategory::{Actions, General, Navigation};
use self::ShortcutContext as Ctx;

/// A keyboard shortcut definition
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: KeyCode,
    /// Alternative key, usually an arrow for a vim-style letter
    pub alt_key: Option<KeyCode>,
    pub description: &'static str,
    pub category: ShortcutCategory,
    pub context: ShortcutContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutCategory {
    General,
    Navigation,
    Actions,
}

/// Where a shortcut applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutContext {
    /// Any screen that is not capturing text
    Global,
    Courses,
    /// Forms: upload, instructions, review and the edit dialogs
    Editor,
    /// Chunk, lesson and test lists
    List,
    Chat,
    Quiz,
    Scores,
    Media,
    SignIn,
}

impl ShortcutCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutCategory::General => "General",
            ShortcutCategory::Navigation => "Navigation",
            ShortcutCategory::Actions => "Actions",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [ShortcutCategory] {
        &[
            ShortcutCategory::General,
            ShortcutCategory::Navigation,
            ShortcutCategory::Actions,
        ]
    }
}

impl ShortcutContext {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutContext::Global => "Everywhere",
            ShortcutContext::Courses => "Course List",
            ShortcutContext::Editor => "Editing",
            ShortcutContext::List => "Generated Items",
            ShortcutContext::Chat => "Course Assistant",
            ShortcutContext::Quiz => "Quiz",
            ShortcutContext::Scores => "Score",
            ShortcutContext::Media => "Lesson Decks",
            ShortcutContext::SignIn => "Sign In",
        }
    }

    /// All contexts in display order
    pub fn all() -> &'static [ShortcutContext] {
        &[
            ShortcutContext::Global,
            ShortcutContext::Courses,
            ShortcutContext::Editor,
            ShortcutContext::List,
            ShortcutContext::Chat,
            ShortcutContext::Quiz,
            ShortcutContext::Scores,
            ShortcutContext::Media,
            ShortcutContext::SignIn,
        ]
    }
}

impl Shortcut {
    /// Format key for display (e.g., "q", "Tab", "j/↓")
    pub fn key_display(&self) -> String {
        let primary = format_keycode(&self.key);
        match &self.alt_key {
            Some(alt) => format!("{}/{}", primary, format_keycode(alt)),
            None => primary,
        }
    }

    /// Key column for the help dialog, left-padded to 9 chars
    pub fn key_display_padded(&self) -> String {
        format!("{:<9}", self.key_display())
    }
}

pub(crate) fn format_keycode(key: &KeyCode) -> String {
    match key {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => format!("{:?}", key),
    }
}

const fn shortcut(
    key: KeyCode,
    alt_key: Option<KeyCode>,
    description: &'static str,
    category: ShortcutCategory,
    context: ShortcutContext,
) -> Shortcut {
    Shortcut {
        key,
        alt_key,
        description,
        category,
        context,
    }
}

pub static SHORTCUTS: &[Shortcut] = &[
    // === Global ===
    shortcut(KeyCode::Char('q'), None, "Quit", General, Ctx::Global),
    shortcut(KeyCode::Char('?'), None, "Toggle help", General, Ctx::Global),
    shortcut(KeyCode::Char('x'), None, "Dismiss latest notification", General, Ctx::Global),
    shortcut(KeyCode::Esc, None, "Go back", Navigation, Ctx::Global),
    shortcut(
        KeyCode::Char('1'),
        Some(KeyCode::Char('7')),
        "Jump to an earlier wizard step",
        Navigation,
        Ctx::Global,
    ),
    // === Courses ===
    shortcut(KeyCode::Char('j'), Some(KeyCode::Down), "Move down", Navigation, Ctx::Courses),
    shortcut(KeyCode::Char('k'), Some(KeyCode::Up), "Move up", Navigation, Ctx::Courses),
    shortcut(KeyCode::Char('/'), None, "Search by name or source", Navigation, Ctx::Courses),
    shortcut(KeyCode::Enter, Some(KeyCode::Char('t')), "Take the test", Actions, Ctx::Courses),
    shortcut(KeyCode::Char('m'), None, "Lesson decks", Actions, Ctx::Courses),
    shortcut(KeyCode::Char('e'), None, "Edit course content", Actions, Ctx::Courses),
    shortcut(KeyCode::Char('n'), None, "Create a new course", Actions, Ctx::Courses),
    shortcut(KeyCode::Char('d'), None, "Delete course", Actions, Ctx::Courses),
    shortcut(KeyCode::Char('r'), None, "Reload", Actions, Ctx::Courses),
    // === Editor ===
    shortcut(KeyCode::Tab, Some(KeyCode::BackTab), "Next / previous field", Navigation, Ctx::Editor),
    shortcut(KeyCode::Esc, None, "Stop editing", Navigation, Ctx::Editor),
    shortcut(KeyCode::Char('i'), Some(KeyCode::Enter), "Resume editing", Navigation, Ctx::Editor),
    shortcut(KeyCode::F(2), None, "Save and continue", Actions, Ctx::Editor),
    shortcut(KeyCode::F(3), None, "Suggested instructions", Actions, Ctx::Editor),
    // === List ===
    shortcut(KeyCode::Char('j'), Some(KeyCode::Down), "Move down", Navigation, Ctx::List),
    shortcut(KeyCode::Char('k'), Some(KeyCode::Up), "Move up", Navigation, Ctx::List),
    shortcut(KeyCode::Char('h'), Some(KeyCode::Left), "Previous chunk (tests)", Navigation, Ctx::List),
    shortcut(KeyCode::Char('l'), Some(KeyCode::Right), "Next chunk (tests)", Navigation, Ctx::List),
    shortcut(KeyCode::Char('e'), Some(KeyCode::Enter), "Edit selected", Actions, Ctx::List),
    shortcut(KeyCode::Char('d'), None, "Delete selected", Actions, Ctx::List),
    shortcut(KeyCode::Char('f'), Some(KeyCode::F(2)), "Finish this step", Actions, Ctx::List),
    // === Chat ===
    shortcut(KeyCode::Enter, None, "Send message", Actions, Ctx::Chat),
    shortcut(KeyCode::Esc, None, "Stop typing", Navigation, Ctx::Chat),
    shortcut(KeyCode::Char('i'), None, "Start typing", Navigation, Ctx::Chat),
    shortcut(KeyCode::F(2), Some(KeyCode::Char('f')), "Continue to lessons", Actions, Ctx::Chat),
    // === Quiz ===
    shortcut(KeyCode::Char('j'), Some(KeyCode::Down), "Next option", Navigation, Ctx::Quiz),
    shortcut(KeyCode::Char('k'), Some(KeyCode::Up), "Previous option", Navigation, Ctx::Quiz),
    shortcut(KeyCode::Char('h'), Some(KeyCode::Left), "Previous question", Navigation, Ctx::Quiz),
    shortcut(KeyCode::Char('l'), Some(KeyCode::Right), "Next question", Navigation, Ctx::Quiz),
    shortcut(KeyCode::Enter, Some(KeyCode::Char(' ')), "Choose answer", Actions, Ctx::Quiz),
    shortcut(KeyCode::Char('c'), None, "Clear answer", Actions, Ctx::Quiz),
    shortcut(KeyCode::Char('v'), None, "Show source chunk", Actions, Ctx::Quiz),
    shortcut(KeyCode::Char('f'), Some(KeyCode::F(2)), "Finish and submit", Actions, Ctx::Quiz),
    // === Scores ===
    shortcut(KeyCode::Char('r'), None, "Retake the test", Actions, Ctx::Scores),
    shortcut(KeyCode::Char('m'), None, "Lesson decks", Actions, Ctx::Scores),
    shortcut(KeyCode::Enter, None, "Back to courses", Navigation, Ctx::Scores),
    // === Media ===
    shortcut(KeyCode::Char('p'), None, "Download PowerPoint", Actions, Ctx::Media),
    shortcut(KeyCode::Char('d'), None, "Download PDF", Actions, Ctx::Media),
    shortcut(KeyCode::Char('t'), Some(KeyCode::F(2)), "Take the test", Actions, Ctx::Media),
    // === Sign in ===
    shortcut(KeyCode::Tab, Some(KeyCode::BackTab), "Next / previous field", Navigation, Ctx::SignIn),
    shortcut(KeyCode::Enter, None, "Next field, or sign in", Actions, Ctx::SignIn),
    shortcut(KeyCode::F(2), None, "Sign in", Actions, Ctx::SignIn),
];

pub fn shortcuts_for_context(context: ShortcutContext) -> impl Iterator<Item = &'static Shortcut> {
    SHORTCUTS.iter().filter(move |s| s.context == context)
}

/// Shortcuts grouped by category for a given context
pub fn shortcuts_by_category_for_context(
    context: ShortcutContext,
) -> Vec<(ShortcutCategory, Vec<&'static Shortcut>)> {
    let mut result = Vec::new();
    for category in ShortcutCategory::all() {
        let shortcuts: Vec<&Shortcut> = shortcuts_for_context(context)
            .filter(|s| s.category == *category)
            .collect();
        if !shortcuts.is_empty() {
            result.push((*category, shortcuts));
        }
    }
    result
}

/// Compact `key description` pairs for the footer, actions first
pub fn footer_hints(context: ShortcutContext, limit: usize) -> Vec<(String, &'static str)> {
    let mut hints: Vec<&Shortcut> = shortcuts_for_context(context).collect();
    hints.sort_by_key(|s| s.category != Actions);
    hints
        .into_iter()
        .take(limit)
        .map(|s| (s.key_display(), s.description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shortcuts_have_descriptions() {
        for shortcut in SHORTCUTS {
            assert!(
                !shortcut.description.is_empty(),
                "Shortcut {:?} has empty description",
                shortcut.key
            );
        }
    }

    #[test]
    fn test_every_context_has_shortcuts() {
        for context in ShortcutContext::all() {
            assert!(
                shortcuts_for_context(*context).next().is_some(),
                "{} has no shortcuts",
                context.display_name()
            );
        }
    }

    #[test]
    fn test_key_display_with_alt() {
        let shortcut = shortcut(
            KeyCode::Char('j'),
            Some(KeyCode::Down),
            "Test",
            Navigation,
            Ctx::List,
        );
        assert_eq!(shortcut.key_display(), "j/↓");
        assert_eq!(shortcut.key_display_padded(), "j/↓      ");
    }

    #[test]
    fn test_key_display_special_keys() {
        assert_eq!(format_keycode(&KeyCode::Enter), "Enter");
        assert_eq!(format_keycode(&KeyCode::F(2)), "F2");
        assert_eq!(format_keycode(&KeyCode::Char(' ')), "Space");
        assert_eq!(format_keycode(&KeyCode::BackTab), "Shift+Tab");
    }

    #[test]
    fn test_grouping_keeps_category_order() {
        let grouped = shortcuts_by_category_for_context(ShortcutContext::Global);
        let categories: Vec<_> = grouped.iter().map(|(cat, _)| *cat).collect();
        assert_eq!(categories, vec![General, Navigation]);
    }

    #[test]
    fn test_footer_hints_lead_with_actions() {
        let hints = footer_hints(ShortcutContext::Quiz, 3);
        assert_eq!(hints.len(), 3);
        assert_eq!(hints[0].1, "Choose answer");
    }
}
