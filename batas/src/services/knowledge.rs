use std::time::Duration;

use crate::cache::TtlCache;
use crate::classifier;
use crate::config::Config;
use crate::error::Result;
use crate::kb::{provider_for_secret, KbApiClient, KbSearchRequest, RetryClient, SearchMethod};
use crate::models::{
    ChatMode, EnhancedRagResponse, KnowledgeBaseEntry, RagMetadata, RetrievalMethod,
    StructuredQuery,
};
use crate::retrieval::{HybridRetriever, RetrievalOutcome};
use crate::scoring::{decide, dynamic_threshold, score_confidence, GateDecision};
use crate::sqg::QueryStructurer;

/// The facade collaborators talk to. Wires the skip classifier, query
/// structurer, hybrid retriever and confidence gate into one pipeline.
///
/// Both public entry points are total: every failure mode comes back as a
/// well-formed value, never as an error the caller must branch on.
#[derive(Clone)]
pub struct KnowledgeService {
    config: Config,
    kb: KbApiClient,
    retry: RetryClient,
    cache: TtlCache<Vec<KnowledgeBaseEntry>>,
    retriever: HybridRetriever,
    structurer: QueryStructurer,
}

impl KnowledgeService {
    pub fn new(config: Config) -> Result<Self> {
        let tokens = provider_for_secret(config.kb.api_secret.as_deref());
        let kb = KbApiClient::new(&config.kb, tokens)?;
        let retry = RetryClient::new(
            config.kb.retry_attempts,
            Duration::from_millis(config.kb.retry_base_delay_ms),
        );
        let cache: TtlCache<Vec<KnowledgeBaseEntry>> = TtlCache::new(
            config.kb.cache_size.max(1),
            Duration::from_secs(config.kb.cache_ttl_secs),
        );
        // The retriever shares this service's cache and retry client, so
        // direct searches and hybrid retrieval de-duplicate upstream calls.
        let retriever = HybridRetriever::new(
            kb.clone(),
            retry.clone(),
            cache.clone(),
            config.retrieval.clone(),
        );
        let structurer = QueryStructurer::new(&config.sqg);

        Ok(Self {
            config,
            kb,
            retry,
            cache,
            retriever,
            structurer,
        })
    }

    /// Upstream reachability. The enabled flag gates this too: a disabled
    /// knowledge base reports unavailable without a network call.
    pub async fn is_available(&self) -> bool {
        self.config.kb.enabled && self.kb.health().await
    }

    pub async fn chat_with_knowledge_base(
        &self,
        question: &str,
        mode: ChatMode,
    ) -> EnhancedRagResponse {
        self.chat_with_options(question, mode, false).await
    }

    pub async fn chat_with_options(
        &self,
        question: &str,
        mode: ChatMode,
        is_final_report: bool,
    ) -> EnhancedRagResponse {
        if !self.config.kb.enabled {
            return EnhancedRagResponse::failure(
                "Knowledge base is disabled",
                RetrievalMethod::Disabled,
            );
        }

        if question.trim().is_empty() {
            return EnhancedRagResponse::failure("Question is empty", RetrievalMethod::Empty);
        }

        if let Some(reason) = classifier::skip_reason(question, mode, is_final_report) {
            tracing::debug!(reason, "Skipping retrieval");
            return self.answer_without_retrieval(question, mode).await;
        }

        let structuring = self.structurer.generate(question).await;
        let query = structuring.query;

        let outcome = self.retriever.retrieve(question, &query).await;

        let confidence = score_confidence(&outcome.entries, &query);
        let threshold = dynamic_threshold(&query, mode, self.config.retrieval.confidence_base);
        let decision = decide(confidence, threshold);

        tracing::info!(
            confidence,
            threshold,
            decision = ?decision,
            method = %outcome.method,
            sources = outcome.entries.len(),
            "Confidence gate evaluated"
        );

        match decision {
            GateDecision::Accept => {
                match self
                    .kb
                    .generate_answer(question, &outcome.entries, mode, true)
                    .await
                {
                    Ok(answer) => EnhancedRagResponse {
                        answer,
                        metadata: RagMetadata::new(
                            confidence,
                            true,
                            structuring.used_sqg,
                            outcome.method,
                            query.legal_topics.clone(),
                        ),
                        sources: outcome.entries,
                        error: String::new(),
                    },
                    Err(error) => {
                        tracing::warn!(
                            error = %error,
                            "KB answer generation failed, degrading to the low-confidence path"
                        );
                        hedged_response(confidence, structuring.used_sqg, outcome, &query)
                    }
                }
            }
            GateDecision::Reject => {
                hedged_response(confidence, structuring.used_sqg, outcome, &query)
            }
        }
    }

    /// Plain vector lookup without gating, for callers that want raw entries.
    /// Never fails: disabled, blank and upstream-error cases all come back
    /// as an empty list.
    pub async fn search_knowledge_base(
        &self,
        query: &str,
        limit: usize,
    ) -> Vec<KnowledgeBaseEntry> {
        if !self.config.kb.enabled || query.trim().is_empty() {
            return Vec::new();
        }

        let request = KbSearchRequest {
            query: query.to_string(),
            limit,
            method: SearchMethod::Vector,
            legal_topics: None,
            statutes_referenced: None,
        };
        let key = request.cache_key();

        let fetched = self
            .cache
            .get_or_fetch(&key, || async {
                self.retry.execute(|| self.kb.search(&request)).await
            })
            .await;

        match fetched {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(error = %error, "Knowledge base search failed");
                Vec::new()
            }
        }
    }

    /// Conversational turns that skipped retrieval still get an answer from
    /// the upstream chat endpoint, just without evidence attached.
    async fn answer_without_retrieval(
        &self,
        question: &str,
        mode: ChatMode,
    ) -> EnhancedRagResponse {
        match self.kb.generate_answer(question, &[], mode, false).await {
            Ok(answer) => EnhancedRagResponse {
                answer,
                sources: Vec::new(),
                metadata: RagMetadata::new(0.0, false, false, RetrievalMethod::None, Vec::new()),
                error: String::new(),
            },
            Err(error) => {
                tracing::warn!(error = %error, "Fallback answer generation failed");
                EnhancedRagResponse::failure(error.to_string(), RetrievalMethod::Error)
            }
        }
    }
}

/// Low-confidence assembly: the retrieved entries stay attached as supporting
/// context, the answer states the confidence and points to counsel, and
/// `error` stays empty — low confidence is a normal outcome, not a failure.
fn hedged_response(
    confidence: f32,
    used_sqg: bool,
    outcome: RetrievalOutcome,
    query: &StructuredQuery,
) -> EnhancedRagResponse {
    EnhancedRagResponse {
        answer: hedged_answer(confidence),
        metadata: RagMetadata::new(
            confidence,
            false,
            used_sqg,
            outcome.method,
            query.legal_topics.clone(),
        ),
        sources: outcome.entries,
        error: String::new(),
    }
}

fn hedged_answer(confidence: f32) -> String {
    format!(
        "Based on the legal references I could retrieve, I can only answer this with about {:.0}% confidence. \
The sources listed below may be related to your question, but they should not be treated as an authoritative answer. \
For advice specific to your situation, please consult a licensed attorney.",
        (confidence * 100.0).round()
    )
}
