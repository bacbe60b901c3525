//! This module defines the boundary between the console and the log backend.
//!
//! Controllers talk to a [`Backend`] trait object so they can be driven by the
//! real HTTP client or by an in-memory fake in tests.
pub mod client;
pub mod error;
pub mod types;

pub use client::HttpBackend;
pub use types::{AnalysisResult, ChatReply, RawLogRecord, UploadReply};

use async_trait::async_trait;

use crate::types::StagedFile;

/// The four operations the log backend exposes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Asks the log-aware assistant a question.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies.
    async fn chat(&self, query: &str) -> error::Result<ChatReply>;

    /// Fetches the current snapshot of recently ingested log records.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies.
    async fn fetch_logs(&self) -> error::Result<Vec<RawLogRecord>>;

    /// Runs an analysis task described in free text.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies. A failure
    /// the backend reports inside a 2xx body is returned as `Ok`.
    async fn analyze(&self, task: &str) -> error::Result<AnalysisResult>;

    /// Transmits a staged file for ingestion.
    ///
    /// # Errors
    ///
    /// The file cannot be read, the transfer fails, or the backend rejects it
    /// (in which case the error carries the response body).
    async fn upload_log_file(&self, file: &StagedFile) -> error::Result<UploadReply>;
}
