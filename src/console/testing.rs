//! In-memory backend used by the controller tests.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::error::Result;
use crate::api::error::ApiError;
use crate::api::{AnalysisResult, Backend, ChatReply, RawLogRecord, UploadReply};
use crate::types::StagedFile;

/// Scripted replies are consumed in order; an empty script yields a benign
/// default. Every call is recorded.
#[derive(Default)]
pub struct FakeBackend {
    pub chat_replies: Mutex<VecDeque<Result<ChatReply>>>,
    pub log_snapshots: Mutex<VecDeque<Result<Vec<RawLogRecord>>>>,
    pub analysis_results: Mutex<VecDeque<Result<AnalysisResult>>>,
    pub upload_replies: Mutex<VecDeque<Result<UploadReply>>>,
    pub chat_queries: Mutex<Vec<String>>,
    pub analysis_tasks: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<StagedFile>>,
    log_fetches: AtomicUsize,
    /// How long each log fetch takes to answer.
    log_delay: Mutex<Option<Duration>>,
    logs_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn log_fetch_count(&self) -> usize {
        self.log_fetches.load(Ordering::SeqCst)
    }

    /// Log fetches that have started but not yet answered.
    pub fn logs_in_flight(&self) -> usize {
        self.logs_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_log_delay(&self, delay: Duration) {
        *self.log_delay.lock().unwrap() = Some(delay);
    }

    pub fn push_chat(&self, reply: Result<ChatReply>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_logs(&self, snapshot: Result<Vec<RawLogRecord>>) {
        self.log_snapshots.lock().unwrap().push_back(snapshot);
    }

    pub fn push_analysis(&self, result: Result<AnalysisResult>) {
        self.analysis_results.lock().unwrap().push_back(result);
    }

    pub fn push_upload(&self, reply: Result<UploadReply>) {
        self.upload_replies.lock().unwrap().push_back(reply);
    }
}

pub fn status_error(status: u16, status_text: &str) -> ApiError {
    ApiError::Status {
        status,
        status_text: status_text.to_string(),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn chat(&self, query: &str) -> Result<ChatReply> {
        self.chat_queries.lock().unwrap().push(query.to_string());
        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ChatReply {
                    response: Some(format!("echo: {query}")),
                })
            })
    }

    async fn fetch_logs(&self) -> Result<Vec<RawLogRecord>> {
        self.log_fetches.fetch_add(1, Ordering::SeqCst);
        let snapshot = self
            .log_snapshots
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        let delay = *self.log_delay.lock().unwrap();
        if let Some(delay) = delay {
            self.logs_in_flight.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.logs_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        snapshot
    }

    async fn analyze(&self, task: &str) -> Result<AnalysisResult> {
        self.analysis_tasks.lock().unwrap().push(task.to_string());
        self.analysis_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(AnalysisResult::default()))
    }

    async fn upload_log_file(&self, file: &StagedFile) -> Result<UploadReply> {
        self.uploads.lock().unwrap().push(file.clone());
        self.upload_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(UploadReply::default()))
    }
}
