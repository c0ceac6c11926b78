//! Console dialogs.
//!
//! Each prompt takes over the terminal, draws one modal box and hands the
//! terminal back once the operator answers.

pub mod console;
pub mod modal;
pub mod render;
pub mod secret;

pub use console::ConsoleDialog;
pub use modal::{Modal, Reply};
