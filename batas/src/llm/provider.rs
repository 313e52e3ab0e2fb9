use std::sync::Arc;

use serde_json::Value;

use crate::config::{parse_llm_provider_model, SqgConfig};
use crate::error::{BatasError, Result};
use crate::llm::LlmApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

/// Provider handle for the query-structuring endpoint. Resolves the backend
/// from the configured `provider/model` string once; an unresolvable or
/// disabled configuration degrades to `Unavailable` instead of failing.
#[derive(Debug, Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<SqgConfig>>,
}

impl LlmProvider {
    pub fn new(config: &SqgConfig) -> Self {
        if !config.enabled {
            return Self::unavailable("Structured query generation is disabled");
        }

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    LlmBackend::Unavailable {
                        reason: format!("Unknown provider in model: {}", config.model),
                    }
                }
            }
        };

        Self {
            backend,
            config: Some(Arc::new(config.clone())),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&SqgConfig> {
        self.config.as_deref()
    }

    /// Single JSON completion: system prompt fixes the output contract, the
    /// user prompt carries the question.
    pub async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<Value> {
        if !self.is_available() {
            return Err(BatasError::LlmUnavailable(self.unavailable_reason()));
        }

        let config = self
            .config()
            .ok_or_else(|| BatasError::LlmUnavailable("No config available".to_string()))?;

        let client = LlmApiClient::new(config)?;
        client.complete_json(system_prompt, user_prompt).await
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM backend is not available".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqg_config(enabled: bool, model: &str) -> SqgConfig {
        SqgConfig {
            enabled,
            model: model.to_string(),
            api_key: Some("test-key".to_string()),
            base_url: None,
            timeout_secs: 5,
            max_retries: 0,
            cache_ttl_ms: 600_000,
            cache_size: 10,
        }
    }

    #[test]
    fn test_disabled_config_is_unavailable() {
        let provider = LlmProvider::new(&sqg_config(false, "openai/gpt-4o-mini"));
        assert!(!provider.is_available());
    }

    #[test]
    fn test_known_provider_resolves_backend() {
        let provider = LlmProvider::new(&sqg_config(true, "ollama/llama3"));
        assert_eq!(*provider.backend(), LlmBackend::Ollama);
        assert!(provider.is_available());
    }

    #[test]
    fn test_unknown_provider_without_base_url_is_unavailable() {
        let provider = LlmProvider::new(&sqg_config(true, "mystery-model"));
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn test_unavailable_complete_json_errors() {
        let provider = LlmProvider::unavailable("tests");
        let result = provider.complete_json("system", "user").await;
        assert!(matches!(result, Err(BatasError::LlmUnavailable(_))));
    }
}
