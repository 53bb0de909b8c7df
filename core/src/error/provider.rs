use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Unknown,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure talking to an upstream generation provider.
///
/// `Transport` and `Status` describe the HTTP exchange itself; `Business`
/// means the upstream answered and explicitly reported that the job failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport error kind={kind} url={url}: {message}")]
    Transport {
        kind: TransportKind,
        url: String,
        message: String,
    },
    #[error("provider http error status={status} url={url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("provider reported failure (code={code:?}): {message}")]
    Business { code: Option<i64>, message: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("operation not supported by provider {0}")]
    Unsupported(&'static str),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Business { .. } => "business",
            Self::Malformed(_) => "malformed",
            Self::Unsupported(_) => "unsupported",
        }
    }

    /// Whether the poll loop should keep going after this error.
    ///
    /// Network failures, rate limiting and 5xx answers are retried; anything
    /// the upstream stated deliberately ends the task.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Business { .. } | Self::Malformed(_) | Self::Unsupported(_) => false,
        }
    }
}
