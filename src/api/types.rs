//! Request and response payloads exchanged with the log backend.
//!
//! Responses are decoded once, here, with a default for every field the
//! backend may leave out. Controllers never poke at raw JSON.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub query: &'a str,
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub response: Option<String>,
}

impl ChatReply {
    /// The assistant text, if the backend produced a non-empty one.
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().filter(|text| !text.is_empty())
    }
}

/// One element of the `GET /api/logs` array, exactly as the backend sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLogRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub level: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
}

impl RawLogRecord {
    /// The backend-assigned id, unless it is missing or falsy
    /// (`null`, `""`, `0`, `false`).
    pub fn backend_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub task: &'a str,
}

/// Reply of `POST /api/analyze`, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub analysis: String,
    #[serde(default)]
    pub has_visualizations: bool,
    #[serde(default)]
    pub visualizations: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Result synthesized locally when the request itself failed.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: String::new(),
            has_visualizations: false,
            visualizations: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// The backend-reported error, ignoring empty strings.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Reply of `POST /api/upload-log-file`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReply {
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub message: Option<String>,
}

/// Accepts any JSON scalar where a string is expected; `null` becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Like [`lenient_string`], but keeps `null` apart from an empty string.
fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
