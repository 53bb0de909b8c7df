use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Where a finished output can be fetched from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultLocator {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl ResultLocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream_url: None,
            title: None,
            duration_secs: None,
        }
    }
}

/// Provider-agnostic view of an upstream job.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderStatus {
    Pending,
    Success { locators: Vec<ResultLocator> },
    Failure { detail: String },
}

impl ProviderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub bytes: Bytes,
    pub content_type: String,
}

impl AudioPayload {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }
}

/// Outcome of handing a request to a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Polling provider accepted the job under its own id.
    Accepted { task_id: String },
    /// Synchronous provider finished within the call.
    Completed { audio: AudioPayload },
}

/// How a provider reports completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStyle {
    Polling,
    Synchronous,
}
