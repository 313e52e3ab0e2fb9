use std::collections::HashSet;

use crate::cache::TtlCache;
use crate::config::RetrievalConfig;
use crate::kb::{KbApiClient, KbSearchRequest, RetryClient, SearchMethod};
use crate::models::{KnowledgeBaseEntry, RetrievalMethod, StructuredQuery};

/// One named stage of the cascade, tagged with the strategy that produced it.
/// Stages that fail or return nothing still appear, with an empty entry list.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub method: SearchMethod,
    pub entries: Vec<KnowledgeBaseEntry>,
}

#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub entries: Vec<KnowledgeBaseEntry>,
    pub method: RetrievalMethod,
}

/// Cascading multi-strategy retrieval against the upstream knowledge base.
///
/// Vector search always runs. Lexical search runs only when the vector stage
/// came back empty or below the similarity floor. Fast-path citation matching
/// runs whenever the structured query references statutes, independent of the
/// other stages. Every sub-search goes through the shared TTL cache and retry
/// client; a failed stage degrades to empty instead of aborting retrieval.
#[derive(Clone)]
pub struct HybridRetriever {
    kb: KbApiClient,
    retry: RetryClient,
    cache: TtlCache<Vec<KnowledgeBaseEntry>>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        kb: KbApiClient,
        retry: RetryClient,
        cache: TtlCache<Vec<KnowledgeBaseEntry>>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            kb,
            retry,
            cache,
            config,
        }
    }

    pub async fn retrieve(&self, question: &str, query: &StructuredQuery) -> RetrievalOutcome {
        let query_text = if query.normalized_question.is_empty() {
            question
        } else {
            &query.normalized_question
        };

        // Fast-path does not depend on vector results, so the two run
        // concurrently. Lexical waits on the vector outcome.
        let vector_future = self.run_stage(SearchMethod::Vector, query_text, query);
        let fast_path_future = async {
            if query.has_statutes() {
                Some(self.run_stage(SearchMethod::FastPath, query_text, query).await)
            } else {
                None
            }
        };
        let (vector, fast_path) = tokio::join!(vector_future, fast_path_future);

        let vector_is_weak = vector.entries.is_empty()
            || best_similarity(&vector.entries) < self.config.similarity_floor;

        let mut stages = vec![vector];
        if vector_is_weak {
            stages.push(
                self.run_stage(SearchMethod::Lexical, query_text, query)
                    .await,
            );
        }
        if let Some(stage) = fast_path {
            stages.push(stage);
        }

        let entries = merge_and_rank(&stages, self.config.top_k);
        let method = overall_method(&stages);

        tracing::debug!(
            stages = stages.len(),
            entries = entries.len(),
            method = %method,
            "Hybrid retrieval complete"
        );

        RetrievalOutcome { entries, method }
    }

    async fn run_stage(
        &self,
        method: SearchMethod,
        query_text: &str,
        query: &StructuredQuery,
    ) -> StageResult {
        let request = build_request(method, query_text, query, &self.config);
        let key = request.cache_key();

        let fetched = self
            .cache
            .get_or_fetch(&key, || async {
                self.retry.execute(|| self.kb.search(&request)).await
            })
            .await;

        match fetched {
            Ok(entries) => StageResult { method, entries },
            Err(error) => {
                tracing::warn!(
                    method = %method,
                    error = %error,
                    "Retrieval stage failed, continuing with empty result"
                );
                StageResult {
                    method,
                    entries: Vec::new(),
                }
            }
        }
    }
}

fn build_request(
    method: SearchMethod,
    query_text: &str,
    query: &StructuredQuery,
    config: &RetrievalConfig,
) -> KbSearchRequest {
    match method {
        SearchMethod::Vector => KbSearchRequest {
            query: query_text.to_string(),
            limit: config.top_k,
            method,
            legal_topics: if query.legal_topics.is_empty() {
                None
            } else {
                Some(query.legal_topics.clone())
            },
            statutes_referenced: None,
        },
        SearchMethod::Lexical => KbSearchRequest {
            query: query_text.to_string(),
            limit: config.top_k,
            method,
            legal_topics: None,
            statutes_referenced: None,
        },
        SearchMethod::FastPath => KbSearchRequest {
            query: query_text.to_string(),
            limit: config.fast_path_limit,
            method,
            legal_topics: None,
            statutes_referenced: Some(query.statutes_referenced.clone()),
        },
    }
}

fn best_similarity(entries: &[KnowledgeBaseEntry]) -> f32 {
    entries
        .iter()
        .map(KnowledgeBaseEntry::similarity_or_zero)
        .fold(0.0f32, f32::max)
}

/// Merge stage outputs in stage order, dropping duplicate entry ids (first
/// occurrence wins, including its similarity), then rank by similarity
/// descending and truncate. The kept occurrence's similarity decides rank
/// even when a dropped duplicate scored higher.
pub fn merge_and_rank(stages: &[StageResult], top_k: usize) -> Vec<KnowledgeBaseEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<KnowledgeBaseEntry> = Vec::new();

    for stage in stages {
        for entry in &stage.entries {
            if seen.insert(entry.entry_id.clone()) {
                merged.push(entry.clone());
            }
        }
    }

    merged.sort_by(|a, b| {
        b.similarity_or_zero()
            .partial_cmp(&a.similarity_or_zero())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged.truncate(top_k);
    merged
}

/// The method reported on metadata: the single contributing strategy, or
/// `Hybrid` when more than one stage produced entries.
fn overall_method(stages: &[StageResult]) -> RetrievalMethod {
    let contributing: Vec<SearchMethod> = stages
        .iter()
        .filter(|stage| !stage.entries.is_empty())
        .map(|stage| stage.method)
        .collect();

    match contributing.as_slice() {
        [] => RetrievalMethod::None,
        [SearchMethod::Vector] => RetrievalMethod::Vector,
        [SearchMethod::Lexical] => RetrievalMethod::Lexical,
        [SearchMethod::FastPath] => RetrievalMethod::FastPath,
        _ => RetrievalMethod::Hybrid,
    }
}
