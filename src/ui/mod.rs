//! The terminal front end.
//!
//! A single UI task owns the [`ViewRouter`](crate::console::ViewRouter) and
//! every controller in it. Key presses and settled requests both arrive as
//! [`UIEvent`]s; requests leave as [`UIAction`]s and run on their own tasks.
pub mod action;
pub mod event;
mod runner;
pub mod terminal;

pub use action::UIAction;
pub use event::UIEvent;
pub use runner::run_tui;
pub use terminal::TerminalUI;
