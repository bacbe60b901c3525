//! The chat panel: an append-only transcript driven one request at a time.
use tracing::{debug, warn};

use super::input::InputLine;
use super::interaction::Interaction;
use crate::api::error::Result;
use crate::api::ChatReply;
use crate::types::ChatMessage;

/// Bot text used when the backend answers without a `response`.
pub const BOT_FALLBACK: &str = "Sorry, I could not process that.";
/// Bot text appended when the request fails for any reason.
pub const BOT_CONNECTION_ERROR: &str = "Error connecting to backend.";

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    input: InputLine,
    state: Interaction<()>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    /// The input field, or `None` while a send is pending (field disabled).
    pub fn input_mut(&mut self) -> Option<&mut InputLine> {
        if self.is_pending() {
            None
        } else {
            Some(&mut self.input)
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Starts a send from the current input.
    ///
    /// Appends the user's message, clears the field and returns the raw text
    /// to transmit. Returns `None` without touching anything when the input is
    /// blank or another send is still pending.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.input.is_blank() || self.is_pending() {
            return None;
        }
        let query = self.input.take();
        self.transcript.push(ChatMessage::user(query.clone()));
        self.state.begin();
        debug!("Chat send started ({} chars)", query.chars().count());
        Some(query)
    }

    /// Applies the outcome of the pending send as one bot message.
    pub fn settle_send(&mut self, outcome: Result<ChatReply>) {
        if !self.is_pending() {
            debug!("Ignoring chat reply with no send pending");
            return;
        }
        let text = match &outcome {
            Ok(reply) => reply.text().unwrap_or(BOT_FALLBACK).to_string(),
            Err(e) => {
                warn!("Chat request failed: {}", e);
                BOT_CONNECTION_ERROR.to_string()
            }
        };
        self.transcript.push(ChatMessage::bot(text));
        self.state.settle(outcome.map(|_| ()));
    }
}
