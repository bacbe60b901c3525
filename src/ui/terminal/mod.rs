//! This module defines the core components and logic for the terminal user interface.
mod controller;
mod keys;
mod lifecycle;
mod render;

pub use controller::TerminalUI;

/// Which input line of the Logs & Chat view receives typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Chat,
    UploadPath,
}

impl Focus {
    pub fn toggled(self) -> Self {
        match self {
            Focus::Chat => Focus::UploadPath,
            Focus::UploadPath => Focus::Chat,
        }
    }
}
