use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Transport-level failure: the request never produced an HTTP response.
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Request(_) | AppError::Network(_))
    }

    /// Text suitable for the notification bar.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http { message, .. } => message.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Unauthorized => "Session expired. Please log in again.".to_string(),
            other if other.is_network() => "Network error. Please check your connection.".to_string(),
            other => other.to_string(),
        }
    }
}
