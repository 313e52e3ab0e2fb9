use serde_json::{json, Value};

use batas::config::{Config, KbConfig, RetrievalConfig, SqgConfig};

/// Config pointed at a mock upstream, SQG disabled so structuring stays on
/// the deterministic heuristic path.
pub fn test_config(base_url: &str) -> Config {
    Config {
        kb: KbConfig {
            base_url: base_url.to_string(),
            api_secret: None,
            enabled: true,
            timeout_secs: 5,
            retry_attempts: 2,
            retry_base_delay_ms: 10,
            cache_ttl_secs: 60,
            cache_size: 64,
        },
        retrieval: RetrievalConfig {
            top_k: 12,
            fast_path_limit: 8,
            similarity_floor: 0.20,
            confidence_base: 0.18,
        },
        sqg: SqgConfig {
            enabled: false,
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 1,
            max_retries: 0,
            cache_ttl_ms: 600_000,
            cache_size: 16,
        },
    }
}

pub fn kb_entry(id: &str, citation: &str, similarity: f64) -> Value {
    json!({
        "entry_id": id,
        "type": "statute",
        "title": format!("Entry {id}"),
        "canonical_citation": citation,
        "summary": "",
        "text": "",
        "tags": ["criminal"],
        "similarity": similarity,
        "rule_no": null,
        "section_no": null,
        "rights_scope": null
    })
}

/// Fast-path matches carry no similarity score.
pub fn kb_entry_unscored(id: &str, citation: &str) -> Value {
    json!({
        "entry_id": id,
        "type": "statute",
        "title": format!("Entry {id}"),
        "canonical_citation": citation,
        "summary": "",
        "text": "",
        "tags": [],
        "similarity": null
    })
}

pub fn search_success(results: Vec<Value>) -> Value {
    json!({ "success": true, "results": results })
}
