use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForuError>;

#[derive(Debug, Error)]
pub enum ForuError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Backend returned code {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Secret unavailable: {0}")]
    Secret(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ForuError {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }
}
