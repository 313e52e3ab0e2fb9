use serde::{Deserialize, Serialize};

use super::KnowledgeBaseEntry;

/// Which retrieval path produced the evidence behind a response. The sentinel
/// variants (`Disabled`, `Empty`, `Error`, `None`) mark terminal states where
/// no useful retrieval happened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    Vector,
    Lexical,
    #[serde(rename = "fast-path")]
    FastPath,
    Hybrid,
    None,
    Disabled,
    Empty,
    Error,
    #[default]
    Unknown,
}

impl std::fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Lexical => write!(f, "lexical"),
            Self::FastPath => write!(f, "fast-path"),
            Self::Hybrid => write!(f, "hybrid"),
            Self::None => write!(f, "none"),
            Self::Disabled => write!(f, "disabled"),
            Self::Empty => write!(f, "empty"),
            Self::Error => write!(f, "error"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Metadata describing how a response was produced. Confidence is clamped to
/// [0, 1] on construction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagMetadata {
    pub confidence: f32,
    pub kb_first: bool,
    pub used_sqg: bool,
    pub used_reranking: bool,
    pub retrieval_method: RetrievalMethod,
    #[serde(default)]
    pub legal_topics: Vec<String>,
}

impl RagMetadata {
    pub fn new(
        confidence: f32,
        kb_first: bool,
        used_sqg: bool,
        retrieval_method: RetrievalMethod,
        legal_topics: Vec<String>,
    ) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            kb_first,
            used_sqg,
            // Ranking happens upstream in the KB service; this core never
            // reranks, the flag is kept for wire compatibility.
            used_reranking: false,
            retrieval_method,
            legal_topics,
        }
    }
}

/// The single result type every public entry point returns. Never carries a
/// null: `answer` is empty rather than absent, `error` is empty when nothing
/// went wrong.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnhancedRagResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<KnowledgeBaseEntry>,
    pub metadata: RagMetadata,
    #[serde(default)]
    pub error: String,
}

impl EnhancedRagResponse {
    /// Terminal-state response: disabled feature, blank question, or an
    /// upstream failure. Confidence is zero and `error` explains why.
    pub fn failure(error: impl Into<String>, method: RetrievalMethod) -> Self {
        Self {
            answer: String::new(),
            sources: Vec::new(),
            metadata: RagMetadata::new(0.0, false, false, method, Vec::new()),
            error: error.into(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn is_high_confidence(&self) -> bool {
        self.metadata.confidence >= 0.7
    }

    pub fn is_kb_first(&self) -> bool {
        self.metadata.kb_first
    }
}
