use serde::{Deserialize, Serialize};

/// Interaction mode the caller is operating in. Case assessment runs with a
/// slightly lower acceptance threshold and forces retrieval for final
/// reports, where citation accuracy matters most.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Consultation,
    CaseAssessment,
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consultation => write!(f, "consultation"),
            Self::CaseAssessment => write!(f, "case_assessment"),
        }
    }
}

impl std::str::FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "case_assessment" | "case-assessment" | "assessment" => Ok(Self::CaseAssessment),
            // Unknown modes fall back to the general consultation behavior.
            _ => Ok(Self::Consultation),
        }
    }
}
