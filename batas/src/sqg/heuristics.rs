use regex::Regex;
use std::sync::OnceLock;

use crate::models::StructuredQuery;

/// Words carrying no retrieval signal, dropped during keyword extraction.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "of", "in", "on", "at",
    "to", "for", "and", "or", "but", "if", "my", "our", "your", "their", "his", "her", "its",
    "it", "i", "we", "you", "they", "he", "she", "this", "that", "these", "those", "what",
    "which", "who", "whom", "how", "when", "where", "why", "can", "could", "do", "does", "did",
    "will", "would", "should", "shall", "may", "might", "about", "with", "without", "from",
    "into", "under", "over", "after", "before", "not", "no", "me", "us", "them", "there",
];

fn rule_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\brule\s+(\d+(?:\.\d+)?)").expect("valid rule regex"))
}

fn article_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bart(?:icle)?\.?\s*(\d+(?:-[A-Za-z])?)").expect("valid article regex")
    })
}

/// Rule-based fallback structuring: cheap, offline, never fails. Used when
/// the LLM structurer is disabled, unreachable, or returns garbage.
pub fn fallback_query(question: &str) -> StructuredQuery {
    let mut query = StructuredQuery::bare(question);
    let lower = question.to_lowercase();

    query.keywords = extract_keywords(&lower);
    query.legal_topics = detect_topics(&lower);
    query.statutes_referenced = detect_statutes(question);

    query
}

fn extract_keywords(lower: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    for token in lower.split_whitespace() {
        let word = token.trim_matches(|c: char| !c.is_alphanumeric());
        if word.len() <= 2 || STOPWORDS.contains(&word) {
            continue;
        }
        if !keywords.iter().any(|existing| existing == word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

/// Substring match against the fixed topic vocabulary. "criminal procedure"
/// is checked before plain "criminal" so the more specific label wins.
fn detect_topics(lower: &str) -> Vec<String> {
    let mut topics = Vec::new();

    if lower.contains("criminal procedure") {
        topics.push("criminal-procedure".to_string());
    } else if lower.contains("criminal") {
        topics.push("criminal".to_string());
    }

    for (needle, label) in [
        ("civil", "civil"),
        ("family", "family"),
        ("labor", "labor"),
        ("procedural", "procedural"),
    ] {
        if lower.contains(needle) {
            topics.push(label.to_string());
        }
    }

    topics
}

/// Statute-like tokens: "Rule <n>" and "Art[icle] <n>", normalized to their
/// canonical citation form.
fn detect_statutes(question: &str) -> Vec<String> {
    let mut statutes = Vec::new();

    for capture in rule_regex().captures_iter(question) {
        let citation = format!("Rule {}", &capture[1]);
        if !statutes.contains(&citation) {
            statutes.push(citation);
        }
    }

    for capture in article_regex().captures_iter(question) {
        let citation = format!("Article {}", &capture[1]);
        if !statutes.contains(&citation) {
            statutes.push(citation);
        }
    }

    statutes
}
