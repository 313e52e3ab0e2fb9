use serde::{Deserialize, Serialize};

/// One retrievable unit of legal knowledge, as returned by the upstream
/// knowledge-base API. Identity is `entry_id`; two entries with the same id
/// are duplicates regardless of the other fields.
///
/// `similarity` is populated by retrieval, never by storage, so it is absent
/// on entries that arrive through non-similarity paths (fast-path citation
/// matches in particular).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeBaseEntry {
    pub entry_id: String,
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub canonical_citation: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub similarity: Option<f32>,
    #[serde(default)]
    pub rule_no: Option<String>,
    #[serde(default)]
    pub section_no: Option<String>,
    #[serde(default)]
    pub rights_scope: Option<String>,
    #[serde(default)]
    pub source_urls: Vec<String>,
}

impl KnowledgeBaseEntry {
    /// Ranking score: entries without a similarity sort as 0.0.
    pub fn similarity_or_zero(&self) -> f32 {
        self.similarity.unwrap_or(0.0)
    }
}
