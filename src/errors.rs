use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("Failed to generate post text: {0}")]
    TextGenerationError(String),

    #[error("Failed to generate image: {0}")]
    ImageGenerationError(String),

    #[error("Failed to access Telegram API: {0}")]
    TelegramError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Filesystem operation failed: {0}")]
    IoError(String),

    #[error("Timed out waiting for {0}")]
    TimeoutError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<reqwest::Error> for PostError {
    fn from(error: reqwest::Error) -> Self {
        PostError::HttpError(error.to_string())
    }
}

impl From<std::io::Error> for PostError {
    fn from(error: std::io::Error) -> Self {
        PostError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for PostError {
    fn from(error: serde_json::Error) -> Self {
        PostError::GeneralError(format!("JSON error: {}", error))
    }
}

impl From<anyhow::Error> for PostError {
    fn from(error: anyhow::Error) -> Self {
        PostError::GeneralError(error.to_string())
    }
}
