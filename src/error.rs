use thiserror::Error;

/// Errors the runner itself can hit. Failed checks are never errors.
#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Malformed authorization header: {0}")]
    MalformedAuthorization(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SmokeError {
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        SmokeError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<figment::Error> for SmokeError {
    fn from(error: figment::Error) -> Self {
        SmokeError::Config(error.to_string())
    }
}
