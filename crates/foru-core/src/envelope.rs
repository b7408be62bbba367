use serde::{Deserialize, Serialize};

pub const CODE_OK: u16 = 200;
pub const CODE_CREATED: u16 = 201;
pub const CODE_NOT_FOUND: u16 = 404;

/// Response envelope returned by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// How a caller should treat an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    /// `200` or `201`. `data` may legitimately be absent.
    Success(Option<T>),
    /// `404`: the user has no data yet. Not an error.
    NotFound,
    /// Any other code. Surfaced to the UI as a notification, not an exception.
    Failed { code: u16, message: String },
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: CODE_OK,
            data: Some(data),
            message: None,
        }
    }

    pub fn err(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn into_outcome(self) -> ApiOutcome<T> {
        match self.code {
            CODE_OK | CODE_CREATED => ApiOutcome::Success(self.data),
            CODE_NOT_FOUND => ApiOutcome::NotFound,
            code => ApiOutcome::Failed {
                code,
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            },
        }
    }
}

impl<T> ApiOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    /// Collapse to the payload, treating "not found" and failures as absent.
    pub fn data(self) -> Option<T> {
        match self {
            ApiOutcome::Success(data) => data,
            _ => None,
        }
    }
}
