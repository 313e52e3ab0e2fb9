use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::SqgConfig;
use crate::llm::{prompts, LlmProvider};
use crate::models::StructuredQuery;
use crate::sqg::fallback_query;

/// Outcome of structuring one question. `used_sqg` is true only when the
/// query came from the LLM path (directly or via cache), never for the
/// heuristic fallback.
#[derive(Debug, Clone)]
pub struct StructuringResult {
    pub query: StructuredQuery,
    pub used_sqg: bool,
}

/// Turns a raw question into a `StructuredQuery`. The contract is total:
/// every error path (disabled, timeout, network, malformed JSON) degrades to
/// the heuristic fallback and nothing propagates to the caller.
#[derive(Clone)]
pub struct QueryStructurer {
    llm: LlmProvider,
    cache: TtlCache<StructuredQuery>,
    timeout: Duration,
}

impl QueryStructurer {
    pub fn new(config: &SqgConfig) -> Self {
        Self {
            llm: LlmProvider::new(config),
            cache: TtlCache::new(
                config.cache_size.max(1),
                Duration::from_millis(config.cache_ttl_ms),
            ),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub async fn generate(&self, question: &str) -> StructuringResult {
        if question.trim().is_empty() || !self.llm.is_available() {
            return StructuringResult {
                query: fallback_query(question),
                used_sqg: false,
            };
        }

        // Cache key is the lowercased, trimmed question so trivial
        // re-phrasings of whitespace and case share an entry.
        let cache_key = self.cache.generate_key(&question.trim().to_lowercase());
        if let Some(cached) = self.cache.get(&cache_key) {
            return StructuringResult {
                query: cached,
                used_sqg: true,
            };
        }

        let user_prompt = prompts::structuring_user_prompt(question);
        let llm_call = self.llm.complete_json(
            prompts::structuring_system_prompt(),
            &user_prompt,
        );

        match tokio::time::timeout(self.timeout, llm_call).await {
            Ok(Ok(value)) => match serde_json::from_value::<StructuredQuery>(value) {
                Ok(mut query) => {
                    if query.normalized_question.trim().is_empty() {
                        query.normalized_question = question.trim().to_string();
                    }
                    self.cache.put(cache_key, query.clone());
                    StructuringResult {
                        query,
                        used_sqg: true,
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Structuring JSON did not match the expected shape, using heuristics");
                    StructuringResult {
                        query: fallback_query(question),
                        used_sqg: false,
                    }
                }
            },
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "Query structuring failed, using heuristics");
                StructuringResult {
                    query: fallback_query(question),
                    used_sqg: false,
                }
            }
            Err(_) => {
                tracing::warn!("Query structuring timed out, using heuristics");
                StructuringResult {
                    query: fallback_query(question),
                    used_sqg: false,
                }
            }
        }
    }
}
