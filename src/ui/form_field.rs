//! Text input widgets shared by the editing screens

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

/// A single editable value
pub enum FormField {
    /// Single-line text input
    TextInput {
        value: String,
        /// Cursor position in characters
        cursor_pos: usize,
        placeholder: String,
        max_length: Option<usize>,
        /// Render as bullets (passwords)
        masked: bool,
    },
    /// Multi-line text input using tui-textarea
    TextArea {
        textarea: Box<TextArea<'static>>,
        placeholder: String,
    },
}

impl FormField {
    pub fn text_input(value: &str, placeholder: &str) -> Self {
        FormField::TextInput {
            value: value.to_string(),
            cursor_pos: value.chars().count(),
            placeholder: placeholder.to_string(),
            max_length: None,
            masked: false,
        }
    }

    pub fn password(placeholder: &str) -> Self {
        FormField::TextInput {
            value: String::new(),
            cursor_pos: 0,
            placeholder: placeholder.to_string(),
            max_length: None,
            masked: true,
        }
    }

    pub fn text_area(value: &str, placeholder: &str) -> Self {
        let mut textarea = TextArea::default();
        textarea.insert_str(value);
        FormField::TextArea {
            textarea: Box::new(textarea),
            placeholder: placeholder.to_string(),
        }
    }

    /// Get the current value as a string
    pub fn value(&self) -> String {
        match self {
            FormField::TextInput { value, .. } => value.clone(),
            FormField::TextArea { textarea, .. } => textarea.lines().join("\n"),
        }
    }

    /// Replace the value, moving the cursor to the end
    pub fn set_value(&mut self, new_value: &str) {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => {
                *value = new_value.to_string();
                *cursor_pos = value.chars().count();
            }
            FormField::TextArea { textarea, .. } => {
                textarea.select_all();
                textarea.cut();
                textarea.insert_str(new_value);
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value().trim().is_empty()
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                max_length,
                ..
            } => match key {
                KeyCode::Char(c) => {
                    if max_length.map_or(true, |m| value.chars().count() < m) {
                        let at = byte_offset(value, *cursor_pos);
                        value.insert(at, c);
                        *cursor_pos += 1;
                    }
                    true
                }
                KeyCode::Backspace => {
                    if *cursor_pos > 0 {
                        *cursor_pos -= 1;
                        let at = byte_offset(value, *cursor_pos);
                        value.remove(at);
                    }
                    true
                }
                KeyCode::Delete => {
                    if *cursor_pos < value.chars().count() {
                        let at = byte_offset(value, *cursor_pos);
                        value.remove(at);
                    }
                    true
                }
                KeyCode::Left => {
                    *cursor_pos = cursor_pos.saturating_sub(1);
                    true
                }
                KeyCode::Right => {
                    if *cursor_pos < value.chars().count() {
                        *cursor_pos += 1;
                    }
                    true
                }
                KeyCode::Home => {
                    *cursor_pos = 0;
                    true
                }
                KeyCode::End => {
                    *cursor_pos = value.chars().count();
                    true
                }
                _ => false,
            },
            FormField::TextArea { textarea, .. } => {
                textarea.input(KeyEvent::new(key, KeyModifiers::NONE));
                true
            }
        }
    }

    /// Rows needed to render this field
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextInput { .. } => 1,
            FormField::TextArea { .. } => 6,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let border_color = if focused { Color::Cyan } else { Color::Gray };

        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
                masked,
                ..
            } => {
                if value.is_empty() && !focused {
                    let para = Paragraph::new(Span::styled(
                        placeholder.as_str(),
                        Style::default().fg(Color::DarkGray),
                    ));
                    frame.render_widget(para, area);
                    return;
                }

                let mut text: String = if *masked {
                    "•".repeat(value.chars().count())
                } else {
                    value.clone()
                };
                if focused {
                    let at = byte_offset(&text, *cursor_pos);
                    text.insert(at, '|');
                }

                let para = Paragraph::new(Line::from(text)).style(Style::default().fg(
                    if focused {
                        Color::White
                    } else {
                        Color::Gray
                    },
                ));
                frame.render_widget(para, area);
            }
            FormField::TextArea {
                textarea,
                placeholder,
            } => {
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border_color)),
                );
                textarea.set_placeholder_text(placeholder.clone());
                textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));

                frame.render_widget(&**textarea, area);
            }
        }
    }
}

fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map_or(s.len(), |(i, _)| i)
}

/// A labelled field inside a [`Form`]
pub struct NamedField {
    pub name: &'static str,
    pub label: &'static str,
    pub field: FormField,
    pub required: bool,
}

impl NamedField {
    pub fn new(name: &'static str, label: &'static str, field: FormField) -> Self {
        Self {
            name,
            label,
            field,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Several fields edited together, one focused at a time
pub struct Form {
    pub fields: Vec<NamedField>,
    /// Currently focused field index
    pub focused_index: usize,
}

impl Form {
    pub fn new(fields: Vec<NamedField>) -> Self {
        Self {
            fields,
            focused_index: 0,
        }
    }

    pub fn focused_field_name(&self) -> Option<&'static str> {
        self.fields.get(self.focused_index).map(|f| f.name)
    }

    pub fn focused_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.focused_index).map(|f| &mut f.field)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .map(|f| &mut f.field)
    }

    /// Current value of `name`, empty when there is no such field
    pub fn value(&self, name: &str) -> String {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.field.value())
            .unwrap_or_default()
    }

    pub fn next_field(&mut self) {
        if self.focused_index < self.fields.len().saturating_sub(1) {
            self.focused_index += 1;
        }
    }

    pub fn prev_field(&mut self) {
        self.focused_index = self.focused_index.saturating_sub(1);
    }

    pub fn is_last_field(&self) -> bool {
        self.focused_index >= self.fields.len().saturating_sub(1)
    }

    /// Every required field has a non-blank value
    pub fn is_valid(&self) -> bool {
        self.fields
            .iter()
            .all(|f| !f.required || !f.field.is_blank())
    }

    /// Tab/BackTab move between fields; other keys go to the focused field
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Tab => {
                self.next_field();
                true
            }
            KeyCode::BackTab => {
                self.prev_field();
                true
            }
            _ => self
                .focused_field_mut()
                .is_some_and(|field| field.handle_key(key)),
        }
    }

    /// Render labels and fields top to bottom
    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let mut constraints = Vec::with_capacity(self.fields.len() * 2 + 1);
        for named in &self.fields {
            constraints.push(Constraint::Length(1));
            constraints.push(Constraint::Length(named.field.render_height()));
        }
        constraints.push(Constraint::Min(0));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let focused_index = self.focused_index;
        for (i, named) in self.fields.iter_mut().enumerate() {
            let is_focused = focused && i == focused_index;
            let marker = if named.required { " *" } else { "" };
            let label_style = if is_focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!("{}{}", named.label, marker),
                    label_style,
                ))),
                rows[i * 2],
            );
            named.field.render(frame, rows[i * 2 + 1], is_focused);
        }
    }
}
