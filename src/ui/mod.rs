pub mod dialogs;
pub mod form_field;
pub mod keybindings;
pub mod terminal_guard;
pub mod toast;
pub mod views;

pub use dialogs::{ConfirmDialog, ConfirmSelection, HelpDialog};
pub use terminal_guard::{install_panic_hook, TerminalGuard};
pub use toast::ToastStack;
