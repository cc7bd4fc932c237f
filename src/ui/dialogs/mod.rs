mod confirm;
mod help;

pub use confirm::{ConfirmDialog, ConfirmSelection};
pub use help::HelpDialog;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// Popup area taking the given percentages of `area`, centered in it
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    popup
}
