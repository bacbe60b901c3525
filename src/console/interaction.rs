//! The shared shape of every user-triggered request in the console.
use std::fmt;

/// `Idle → Pending → Succeeded | Failed`, and back to `Pending` on the next
/// user action. There is no automatic retry.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction<T> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(String),
}

impl<T> Default for Interaction<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> Interaction<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Enters `Pending`, discarding any previous outcome.
    ///
    /// Returns `false` and changes nothing if a request is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_pending() {
            return false;
        }
        *self = Self::Pending;
        true
    }

    pub fn succeed(&mut self, value: T) {
        *self = Self::Succeeded(value);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = Self::Failed(message.into());
    }

    /// Stores the outcome of a settled request; errors keep only their message.
    pub fn settle<E: fmt::Display>(&mut self, outcome: Result<T, E>) {
        match outcome {
            Ok(value) => self.succeed(value),
            Err(e) => self.fail(e.to_string()),
        }
    }
}
