use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;

/// Selection state for the confirm dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmSelection {
    Yes,
    No,
}

impl ConfirmSelection {
    fn toggle(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

/// Asks before a destructive action
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub visible: bool,
    pub title: String,
    pub message: String,
    /// Starts on No so Enter alone never deletes
    pub selection: ConfirmSelection,
}

impl Default for ConfirmDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            title: String::new(),
            message: String::new(),
            selection: ConfirmSelection::No,
        }
    }

    pub fn show(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.title = title.into();
        self.message = message.into();
        self.selection = ConfirmSelection::No;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Returns the choice once the user makes one
    pub fn handle_key(&mut self, key: KeyCode) -> Option<ConfirmSelection> {
        if !self.visible {
            return None;
        }
        let choice = match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => ConfirmSelection::Yes,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => ConfirmSelection::No,
            KeyCode::Enter => self.selection,
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.selection = self.selection.toggle();
                return None;
            }
            _ => return None,
        };
        self.hide();
        Some(choice)
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .margin(1)
            .split(inner);

        frame.render_widget(
            Paragraph::new(self.message.as_str())
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center),
            chunks[0],
        );

        let button = |label: &'static str, selected: bool| {
            if selected {
                Span::styled(
                    label,
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(label, Style::default().fg(Color::Gray))
            }
        };
        let buttons = Line::from(vec![
            button(" [Y]es ", self.selection == ConfirmSelection::Yes),
            Span::raw("   "),
            button(" [N]o ", self.selection == ConfirmSelection::No),
        ]);
        frame.render_widget(
            Paragraph::new(buttons).alignment(Alignment::Center),
            chunks[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_defaults_to_no() {
        let mut dialog = ConfirmDialog::new();
        dialog.show("Delete course", "Delete Algebra?");
        assert_eq!(dialog.handle_key(KeyCode::Enter), Some(ConfirmSelection::No));
        assert!(!dialog.visible);
    }

    #[test]
    fn test_y_confirms_and_arrows_toggle() {
        let mut dialog = ConfirmDialog::new();
        dialog.show("Delete", "Sure?");
        assert_eq!(dialog.handle_key(KeyCode::Left), None);
        assert_eq!(dialog.selection, ConfirmSelection::Yes);
        assert_eq!(dialog.handle_key(KeyCode::Enter), Some(ConfirmSelection::Yes));

        dialog.show("Delete", "Sure?");
        assert_eq!(dialog.handle_key(KeyCode::Char('y')), Some(ConfirmSelection::Yes));
    }

    #[test]
    fn test_hidden_dialog_ignores_keys() {
        let mut dialog = ConfirmDialog::new();
        assert_eq!(dialog.handle_key(KeyCode::Char('y')), None);
    }
}
