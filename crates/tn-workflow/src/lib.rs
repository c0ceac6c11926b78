//! Console installer workflow.
//!
//! The main menu drives destination selection and install execution; every
//! prompt goes through the [`dialog::Dialog`] trait and every side effect
//! through `tn-hal`, so the whole flow can be scripted in tests.

pub mod auth;
pub mod destination;
pub mod dialog;
pub mod install_runner;
pub mod menu;

pub use destination::{compute_wipe_disks, select_destination, SelectionOutcome, SelectionSettings};
pub use dialog::{Dialog, ScriptedDialog};
pub use menu::{ConsoleSettings, MainMenu, MenuExit};
