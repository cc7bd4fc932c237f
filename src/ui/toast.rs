//! Transient notifications stacked in the bottom-right corner.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::screens::{Notification, NotificationLevel};

/// Most toasts kept on screen at once
const MAX_VISIBLE: usize = 4;
const TOAST_WIDTH: u16 = 48;

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct ToastStack {
    ttl: Duration,
    toasts: Vec<Toast>,
}

impl ToastStack {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: Vec::new(),
        }
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        self.toasts.push(Toast {
            notification,
            expires_at: now + self.ttl,
        });
        if self.toasts.len() > MAX_VISIBLE {
            self.toasts.remove(0);
        }
    }

    /// Drop toasts whose time is up
    pub fn expire(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    /// Remove the newest toast; false when there was none
    pub fn dismiss_latest(&mut self) -> bool {
        self.toasts.pop().is_some()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn render(&self, frame: &mut Frame) {
        let screen = frame.area();
        let width = TOAST_WIDTH.min(screen.width);
        let mut bottom = screen.bottom().saturating_sub(1);

        // Newest nearest the bottom
        for toast in self.toasts.iter().rev() {
            let color = level_color(toast.notification.level);
            let text_width = width.saturating_sub(2).max(1) as usize;
            let rows = toast.notification.message.chars().count().div_ceil(text_width).max(1);
            let height = (rows as u16 + 2).min(6);
            if bottom < screen.y + height {
                break;
            }
            let area = Rect {
                x: screen.right().saturating_sub(width),
                y: bottom - height,
                width,
                height,
            };
            bottom -= height;

            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(Line::from(toast.notification.message.as_str()))
                    .wrap(Wrap { trim: true })
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(color)),
                    ),
                area,
            );
        }
    }
}

fn level_color(level: NotificationLevel) -> Color {
    match level {
        NotificationLevel::Info => Color::Cyan,
        NotificationLevel::Success => Color::Green,
        NotificationLevel::Error => Color::Red,
    }
}
