use serde::{Deserialize, Serialize};
use trend_radar::Trend;

const MAX_LIMIT: usize = 100;

/// `limit` stays a string so malformed values reach [`TrendsQuery::top_k`]
/// and get the JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    pub limit: Option<String>,
}

impl TrendsQuery {
    pub fn top_k(&self) -> Result<Option<usize>, String> {
        let Some(raw) = self
            .limit
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };

        match raw.parse::<usize>() {
            Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(Some(limit)),
            _ => Err(format!("limit must be between 1 and {}: {}", MAX_LIMIT, raw)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub trend: Option<Trend>,
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlertError {
    pub error: String,
}

impl AlertError {
    pub fn no_trend() -> Self {
        Self {
            error: "No trend provided".to_string(),
        }
    }
}
