use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One entry of the chat transcript. Never mutated once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Identity of a log record within one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// Assigned by the backend.
    Assigned(String),
    /// Position in the response array; only meaningful for that response.
    Position(usize),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Assigned(id) => f.write_str(id),
            RecordId::Position(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub id: RecordId,
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// A local file selected for upload but not yet transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub name: String,
}

impl StagedFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// Stages `path` only if it names an existing regular file.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from `metadata`, or `InvalidInput` for
    /// directories and other non-files.
    pub fn existing(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path.as_ref())?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        Ok(Self::new(path))
    }
}
