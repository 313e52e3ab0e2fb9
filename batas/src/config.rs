use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kb: KbConfig,
    pub retrieval: RetrievalConfig,
    pub sqg: SqgConfig,
}

/// Upstream knowledge-base API connection and resilience settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KbConfig {
    pub base_url: String,
    /// Raw secret. A three-part JWT is sent as-is; anything else is used as
    /// an HS256 signing key to mint short-lived service tokens.
    pub api_secret: Option<String>,
    pub enabled: bool,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub fast_path_limit: usize,
    /// Vector results whose best similarity falls below this floor trigger
    /// the lexical fallback stage.
    pub similarity_floor: f32,
    /// Base acceptance threshold before per-query adjustment.
    pub confidence_base: f32,
}

/// Structured query generation (LLM-backed) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SqgConfig {
    pub enabled: bool,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub cache_ttl_ms: u64,
    pub cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kb: KbConfig {
                base_url: env::var("KB_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
                api_secret: env::var("KB_API_SECRET").ok(),
                enabled: parse_env_or("KB_ENABLED", true),
                timeout_secs: parse_env_or("KB_TIMEOUT_SECS", 10),
                retry_attempts: parse_env_or("KB_RETRY_ATTEMPTS", 3),
                retry_base_delay_ms: parse_env_or("KB_RETRY_BASE_DELAY_MS", 1000),
                cache_ttl_secs: parse_env_or("KB_CACHE_TTL_SECS", 60),
                cache_size: parse_env_or("KB_CACHE_SIZE", 512),
            },
            retrieval: RetrievalConfig {
                top_k: parse_env_or("KB_TOP_K", 12),
                fast_path_limit: parse_env_or("KB_FAST_PATH_LIMIT", 8),
                similarity_floor: parse_env_or("KB_SIMILARITY_FLOOR", 0.20),
                confidence_base: parse_env_or("CONFIDENCE_THRESHOLD_BASE", 0.18),
            },
            sqg: SqgConfig {
                enabled: parse_env_or("SQG_ENABLED", true),
                model: env::var("SQG_MODEL").unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),
                api_key: env::var("SQG_API_KEY").ok(),
                base_url: env::var("SQG_BASE_URL").ok(),
                timeout_secs: parse_env_or("SQG_TIMEOUT_SECS", 8),
                max_retries: parse_env_or("SQG_MAX_RETRIES", 2),
                cache_ttl_ms: parse_env_or("SQG_CACHE_TTL_MS", 600_000),
                cache_size: parse_env_or("SQG_CACHE_SIZE", 1000),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
