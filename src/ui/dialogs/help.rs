use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use crate::ui::keybindings::{shortcuts_by_category_for_context, ShortcutContext};

#[derive(Debug, Default)]
pub struct HelpDialog {
    pub visible: bool,
}

impl HelpDialog {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Lines for the global shortcuts followed by those of `context`
    pub fn lines(context: ShortcutContext) -> Vec<Line<'static>> {
        let heading = Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Cyan);
        let mut lines = vec![Line::from(Span::styled("Keyboard Shortcuts", heading))];

        let mut contexts = vec![ShortcutContext::Global];
        if context != ShortcutContext::Global {
            contexts.push(context);
        }
        for ctx in contexts {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{}:", ctx.display_name()),
                heading,
            )));
            for (_, shortcuts) in shortcuts_by_category_for_context(ctx) {
                for shortcut in shortcuts {
                    lines.push(Line::from(vec![
                        Span::styled(
                            shortcut.key_display_padded(),
                            Style::default().fg(Color::Yellow),
                        ),
                        Span::raw(shortcut.description),
                    ]));
                }
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::Gray),
        )));
        lines
    }

    pub fn render(&self, frame: &mut Frame, context: ShortcutContext) {
        if !self.visible {
            return;
        }

        let area = centered_rect(60, 80, frame.area());
        frame.render_widget(Clear, area);

        let help = Paragraph::new(Self::lines(context))
            .block(
                Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false });

        frame.render_widget(help, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_help_dialog_toggle() {
        let mut dialog = HelpDialog::new();
        assert!(!dialog.visible);

        dialog.toggle();
        assert!(dialog.visible);

        dialog.toggle();
        assert!(!dialog.visible);
    }

    #[test]
    fn test_lines_include_global_and_screen_sections() {
        let lines = text(&HelpDialog::lines(ShortcutContext::Quiz));
        assert!(lines.iter().any(|l| l == "Everywhere:"));
        assert!(lines.iter().any(|l| l == "Quiz:"));
        assert!(lines.iter().any(|l| l.contains("Clear answer")));
        assert!(!lines.iter().any(|l| l.contains("Download PDF")));
    }

    #[test]
    fn test_global_context_is_not_repeated() {
        let lines = text(&HelpDialog::lines(ShortcutContext::Global));
        assert_eq!(lines.iter().filter(|l| *l == "Everywhere:").count(), 1);
    }
}
