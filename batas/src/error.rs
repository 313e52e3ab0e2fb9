use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatasError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Knowledge base error: {0}")]
    Kb(String),

    #[error("Knowledge base unavailable: {0}")]
    KbUnavailable(String),

    #[error("Knowledge base rate limit exceeded, retry after {retry_after:?} seconds")]
    KbRateLimit { retry_after: Option<u64> },

    #[error("Knowledge base authentication error: {0}")]
    KbAuth(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl BatasError {
    /// Transient upstream failures the retry client is allowed to attempt again.
    /// Everything else aborts the retry loop immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BatasError::KbUnavailable(_) | BatasError::KbRateLimit { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BatasError>;
