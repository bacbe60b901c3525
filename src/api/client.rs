//! HTTP client for the log backend.
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{ApiError, Result};
use super::types::{AnalysisResult, AnalyzeRequest, ChatReply, ChatRequest, RawLogRecord, UploadReply};
use super::Backend;
use crate::types::StagedFile;

/// Local development fallback when no base address is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// [`Backend`] implementation speaking JSON over HTTP.
///
/// No request timeout is configured: a slow request keeps its panel pending
/// until it settles.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn chat(&self, query: &str) -> Result<ChatReply> {
        let url = self.url("api/chat");
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(&ChatRequest { query })
            .send()
            .await?;
        read_json(response).await
    }

    async fn fetch_logs(&self) -> Result<Vec<RawLogRecord>> {
        let url = self.url("api/logs");
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        read_json(response).await
    }

    async fn analyze(&self, task: &str) -> Result<AnalysisResult> {
        let url = self.url("api/analyze");
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(&AnalyzeRequest { task })
            .send()
            .await?;
        read_json(response).await
    }

    async fn upload_log_file(&self, file: &StagedFile) -> Result<UploadReply> {
        let url = self.url("api/upload-log-file");
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ApiError::ReadFile {
                path: file.path.display().to_string(),
                source,
            })?;
        let mime = mime_guess::from_path(&file.path).first_or_octet_stream();
        debug!("POST {} ({} bytes, {})", url, bytes.len(), mime);

        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            warn!("Upload of {} rejected with {}", file.name, status);
            return Err(ApiError::UploadRejected {
                status: status.as_u16(),
                status_text: status_text(status),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Checks the status and decodes a JSON body.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            status_text: status_text(status),
        });
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| status.as_u16().to_string())
}
