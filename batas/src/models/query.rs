use serde::{Deserialize, Serialize};

pub const DEFAULT_JURISDICTION: &str = "Philippines";

/// How urgent the question is, as judged by query structuring. Drives the
/// dynamic acceptance threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            // Anything unrecognized defaults low, never fails.
            _ => Ok(Self::Low),
        }
    }
}

fn default_jurisdiction() -> String {
    DEFAULT_JURISDICTION.to_string()
}

/// Structured form of an incoming legal question. Built once per question by
/// the structurer (LLM path or heuristic fallback) and never mutated after
/// construction. All list fields are present-but-possibly-empty, never absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredQuery {
    pub normalized_question: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub legal_topics: Vec<String>,
    #[serde(default)]
    pub statutes_referenced: Vec<String>,
    #[serde(default = "default_jurisdiction")]
    pub jurisdiction: String,
    #[serde(default)]
    pub temporal_scope: String,
    #[serde(default)]
    pub related_terms: Vec<String>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub query_expansions: Vec<String>,
}

impl StructuredQuery {
    /// Minimal query carrying only the normalized question text.
    pub fn bare(question: &str) -> Self {
        Self {
            normalized_question: question.trim().to_string(),
            keywords: Vec::new(),
            legal_topics: Vec::new(),
            statutes_referenced: Vec::new(),
            jurisdiction: default_jurisdiction(),
            temporal_scope: String::new(),
            related_terms: Vec::new(),
            urgency: Urgency::Low,
            query_expansions: Vec::new(),
        }
    }

    pub fn has_statutes(&self) -> bool {
        !self.statutes_referenced.is_empty()
    }

    /// Procedural questions get a looser acceptance threshold.
    pub fn is_procedural(&self) -> bool {
        self.legal_topics.iter().any(|topic| {
            let topic = topic.to_lowercase();
            topic.contains("procedural") || topic.contains("process")
        })
    }
}
