//! Prompt templates for structured query generation.
//!
//! Templates use `format!()` interpolation so missing variables are
//! compile-time errors.

/// System prompt fixing the JSON contract for query structuring.
///
/// The model must answer with a single JSON object using snake_case keys
/// matching the `StructuredQuery` shape; anything else is treated as a
/// structuring failure and falls back to heuristics.
pub fn structuring_system_prompt() -> &'static str {
    r#"You are a legal query analyzer for Philippine law. Analyze the user's question and respond with ONLY a JSON object, no prose, using exactly these keys:
{
  "normalized_question": "the question restated clearly",
  "keywords": ["significant", "terms"],
  "legal_topics": ["e.g. criminal, civil, family, labor, procedural"],
  "statutes_referenced": ["explicit citations, e.g. Article 308, Rule 114"],
  "jurisdiction": "Philippines unless the question says otherwise",
  "temporal_scope": "time qualifier if any, else empty string",
  "related_terms": ["synonyms and doctrinal terms"],
  "urgency": "low, medium or high",
  "query_expansions": ["alternative phrasings useful for retrieval"]
}
Every list key must be present, using [] when empty. Do not invent citations the question does not contain."#
}

/// User prompt carrying the raw question.
///
/// # Example
/// ```
/// use batas::llm::prompts::structuring_user_prompt;
///
/// let prompt = structuring_user_prompt("Can my landlord evict me without notice?");
/// assert!(prompt.contains("evict"));
/// ```
pub fn structuring_user_prompt(question: &str) -> String {
    format!("Question: {question}")
}
