use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CollectorError::Parse(err.to_string())
        } else {
            CollectorError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        CollectorError::Parse(err.to_string())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("candidate has an empty title")]
    EmptyTitle,

    #[error("prediction {0} is outside 0..=100")]
    PredictionOutOfRange(u8),
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("duplicate trend id `{id}` after merge")]
    DuplicateId { id: String },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{0} not configured")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Network(err.to_string())
    }
}
