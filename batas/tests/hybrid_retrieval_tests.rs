mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use batas::cache::TtlCache;
use batas::kb::{provider_for_secret, KbApiClient, RetryClient};
use batas::models::{RetrievalMethod, StructuredQuery};
use batas::retrieval::HybridRetriever;
use batas::sqg::fallback_query;

use common::{kb_entry, search_success, test_config};

fn retriever_for(server: &MockServer) -> HybridRetriever {
    let config = test_config(&server.uri());
    let kb = KbApiClient::new(&config.kb, provider_for_secret(None)).unwrap();
    let retry = RetryClient::new(config.kb.retry_attempts, Duration::from_millis(10));
    let cache = TtlCache::new(config.kb.cache_size, Duration::from_secs(60));
    HybridRetriever::new(kb, retry, cache, config.retrieval)
}

/// Strong vector results: no lexical call, no fast-path without statutes.
#[tokio::test]
async fn test_vector_only_when_similarity_is_strong() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "vector" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_success(vec![
            kb_entry("a", "Article 308", 0.9),
            kb_entry("b", "Article 309", 0.6),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let retriever = retriever_for(&server);
    let query = StructuredQuery::bare("penalty for stealing");

    let outcome = retriever.retrieve("penalty for stealing", &query).await;

    assert_eq!(outcome.method, RetrievalMethod::Vector);
    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.entries[0].entry_id, "a");
}

/// Identical retrievals inside the TTL window reach the upstream once.
#[tokio::test]
async fn test_cache_makes_repeat_retrieval_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_success(vec![kb_entry("a", "Article 308", 0.9)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let retriever = retriever_for(&server);
    let query = StructuredQuery::bare("penalty for stealing");

    let first = retriever.retrieve("penalty for stealing", &query).await;
    let second = retriever.retrieve("penalty for stealing", &query).await;

    assert_eq!(first.entries.len(), 1);
    assert_eq!(second.entries.len(), 1);
    assert_eq!(first.entries[0].entry_id, second.entries[0].entry_id);
    // The mounted expect(1) verifies the single upstream call on drop.
}

/// Weak vector results trigger the lexical stage; both contribute.
#[tokio::test]
async fn test_lexical_fallback_below_similarity_floor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "vector" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_success(vec![kb_entry("weak", "Rule 39", 0.05)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "lexical" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_success(vec![kb_entry("lex", "Rule 39", 0.0)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let retriever = retriever_for(&server);
    let query = StructuredQuery::bare("execution of judgment");

    let outcome = retriever.retrieve("execution of judgment", &query).await;

    assert_eq!(outcome.method, RetrievalMethod::Hybrid);
    assert_eq!(outcome.entries.len(), 2);
    // Kept similarities decide rank: 0.05 over 0.0.
    assert_eq!(outcome.entries[0].entry_id, "weak");
}

/// Empty vector results also trigger lexical; the outcome reports the one
/// contributing method.
#[tokio::test]
async fn test_lexical_fallback_on_empty_vector() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "vector" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_success(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "lexical" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_success(vec![kb_entry("lex", "Rule 39", 0.0)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let retriever = retriever_for(&server);
    let query = StructuredQuery::bare("some obscure phrase");

    let outcome = retriever.retrieve("some obscure phrase", &query).await;
    assert_eq!(outcome.method, RetrievalMethod::Lexical);
    assert_eq!(outcome.entries.len(), 1);
}

/// Statute references always run the fast-path stage, even when vector
/// results are strong, and duplicates keep the first-seen occurrence.
#[tokio::test]
async fn test_fast_path_runs_for_statutes_and_dedup_keeps_first_seen() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "vector" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_success(vec![
            kb_entry("a", "Article 308", 0.5),
            kb_entry("b", "Article 309", 0.3),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "fast-path" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_success(vec![kb_entry("a", "Article 308", 0.9)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let retriever = retriever_for(&server);
    let query = fallback_query("What is the penalty for theft under Article 308?");
    assert!(query.has_statutes());

    let outcome = retriever
        .retrieve("What is the penalty for theft under Article 308?", &query)
        .await;

    assert_eq!(outcome.method, RetrievalMethod::Hybrid);
    assert_eq!(outcome.entries.len(), 2);
    // First occurrence of "a" (similarity 0.5) wins over the fast-path 0.9.
    assert_eq!(outcome.entries[0].entry_id, "a");
    assert_eq!(outcome.entries[0].similarity, Some(0.5));
    assert_eq!(outcome.entries[1].entry_id, "b");
}

/// A failing stage degrades to empty instead of aborting retrieval.
#[tokio::test]
async fn test_stage_failure_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "vector" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/kb/search"))
        .and(body_partial_json(json!({ "method": "lexical" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_success(vec![kb_entry("lex", "Rule 39", 0.1)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let retriever = retriever_for(&server);
    let query = StructuredQuery::bare("execution of judgment");

    let outcome = retriever.retrieve("execution of judgment", &query).await;
    assert_eq!(outcome.method, RetrievalMethod::Lexical);
    assert_eq!(outcome.entries.len(), 1);
}
