use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::KbConfig;
use crate::error::{BatasError, Result};
use crate::kb::TokenProvider;
use crate::models::{ChatMode, KnowledgeBaseEntry};

/// Upstream search strategy selector, serialized into the request body.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Vector,
    Lexical,
    #[serde(rename = "fast-path")]
    FastPath,
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Lexical => write!(f, "lexical"),
            Self::FastPath => write!(f, "fast-path"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KbSearchRequest {
    pub query: String,
    pub limit: usize,
    pub method: SearchMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_topics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statutes_referenced: Option<Vec<String>>,
}

impl KbSearchRequest {
    /// Stable cache key for this request. Query text is normalized the same
    /// way the structurer keys its cache.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.method,
            self.limit,
            self.query.trim().to_lowercase()
        )
    }
}

#[derive(Debug, Deserialize)]
struct KbSearchResponse {
    success: bool,
    #[serde(default)]
    results: Vec<KnowledgeBaseEntry>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct KbChatRequest<'a> {
    question: &'a str,
    context_entries: &'a [KnowledgeBaseEntry],
    mode: ChatMode,
    kb_first: bool,
}

#[derive(Debug, Deserialize)]
struct KbChatResponse {
    #[serde(default)]
    answer: String,
}

/// HTTP client for the upstream knowledge-base API. One instance per service;
/// cheap to clone. Retrying is the caller's concern (`RetryClient`) — this
/// client maps each response onto the error taxonomy exactly once.
#[derive(Clone)]
pub struct KbApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl KbApiClient {
    pub fn new(config: &KbConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        // Validate early; a bad base URL should fail construction, not the
        // first request.
        url::Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BatasError::Kb(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// `POST {base}/kb/search` — one retrieval strategy, one call.
    pub async fn search(&self, request: &KbSearchRequest) -> Result<Vec<KnowledgeBaseEntry>> {
        let url = format!("{}/kb/search", self.base_url);
        let headers = self.headers().await?;

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = triage_status(response).await?;
        let body: KbSearchResponse = response
            .json()
            .await
            .map_err(|e| BatasError::Kb(format!("Failed to parse search response: {e}")))?;

        if !body.success {
            return Err(BatasError::Kb(
                body.error
                    .unwrap_or_else(|| "Knowledge base reported failure".to_string()),
            ));
        }

        Ok(body.results)
    }

    /// `POST {base}/chat` — KB-grounded answer generation with the retrieved
    /// entries as context.
    pub async fn generate_answer(
        &self,
        question: &str,
        context_entries: &[KnowledgeBaseEntry],
        mode: ChatMode,
        kb_first: bool,
    ) -> Result<String> {
        let url = format!("{}/chat", self.base_url);
        let headers = self.headers().await?;
        let request = KbChatRequest {
            question,
            context_entries,
            mode,
            kb_first,
        };

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = triage_status(response).await?;
        let body: KbChatResponse = response
            .json()
            .await
            .map_err(|e| BatasError::Kb(format!("Failed to parse chat response: {e}")))?;

        if body.answer.trim().is_empty() {
            return Err(BatasError::Kb(
                "Answer generation returned empty content".to_string(),
            ));
        }

        Ok(body.answer)
    }

    /// `GET {base}/health` — true when the upstream answers 2xx.
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!(error = %error, "Knowledge base health check failed");
                false
            }
        }
    }

    async fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let token = self.tokens.current_token().await?;
        if !token.is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| BatasError::KbAuth(format!("Invalid bearer token: {e}")))?,
            );
        }

        Ok(headers)
    }
}

/// Send-level failures (refused connections, timeouts, DNS) are transient by
/// definition here; the retry client decides how often to try again.
fn transport_error(error: reqwest::Error) -> BatasError {
    BatasError::KbUnavailable(format!("Request failed: {error}"))
}

async fn triage_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        return Err(BatasError::KbRateLimit { retry_after });
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(BatasError::KbAuth(body));
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        return Err(BatasError::KbUnavailable(format!(
            "Server error {status}: {body}"
        )));
    }

    Err(BatasError::Kb(format!("API error {status}: {body}")))
}
