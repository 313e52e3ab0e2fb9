//! Cost-control pre-filter in front of retrieval.
//!
//! Pure pattern matching, no I/O. The classifier is deliberately
//! conservative: any KB-required indicator forces retrieval before the
//! conversational heuristics get a say.

use crate::models::ChatMode;

/// Explicit legal-citation vocabulary. A query containing any of these is
/// never skipped, whatever the conversational heuristics think.
const KB_REQUIRED_INDICATORS: &[&str] = &[
    "article",
    "section",
    "rule",
    "republic act",
    "r.a.",
    "revised penal code",
    "penal code",
    "civil code",
    "family code",
    "labor code",
    "rules of court",
    "constitution",
    "jurisprudence",
    "penalty for",
    "statute",
    "provision",
    "ordinance",
];

const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "kumusta",
    "kamusta",
    "magandang araw",
];

const FAREWELLS: &[&str] = &[
    "bye", "goodbye", "thank you", "thanks", "salamat", "see you", "ingat",
];

const IDENTITY_PATTERNS: &[&str] = &[
    "who are you",
    "what are you",
    "what can you do",
    "your name",
    "are you a bot",
    "are you human",
    "are you a lawyer",
    "are you real",
];

const USAGE_PATTERNS: &[&str] = &[
    "how do i use",
    "how to use",
    "how does this work",
    "how do you work",
    "what should i ask",
    "how can you help",
];

const ACKNOWLEDGMENTS: &[&str] = &[
    "ok", "okay", "k", "sure", "yes", "no", "yup", "nope", "noted", "got it", "i see", "alright",
    "all right", "fine", "great", "nice", "cool", "sige", "oo", "hindi",
];

const META_PATTERNS: &[&str] = &[
    "this app",
    "this platform",
    "this website",
    "this site",
    "who made you",
    "who created you",
    "who developed you",
    "what version",
];

const OVERVIEW_PATTERNS: &[&str] = &[
    "what is law",
    "what is the law in general",
    "what is the legal system",
    "how does the legal system",
    "branches of law",
    "types of law",
    "sources of law",
];

const OFF_TOPIC_KEYWORDS: &[&str] = &[
    "weather",
    "recipe",
    "movie",
    "film",
    "song",
    "music",
    "sports",
    "basketball",
    "celebrity",
    "horoscope",
    "lottery",
    "restaurant",
    "translate",
    "joke",
];

const SHORT_ANSWER_PREFIXES: &[&str] = &[
    "yes ", "yes,", "no ", "no,", "maybe", "i think", "it was", "it is", "that was", "that is",
    "that's", "probably", "around ", "about ",
];

const TIME_REFERENCES: &[&str] = &[
    "yesterday",
    "today",
    "tomorrow",
    "last week",
    "last month",
    "last year",
    "years ago",
    "this morning",
    "tonight",
];

const SHORT_ACK_MAX_LEN: usize = 15;
const SHORT_FRAGMENT_MAX_LEN: usize = 50;

/// Decide whether retrieval can be skipped for `query`, returning the matched
/// reason. `None` means retrieval must run.
///
/// Rule order is part of the contract: blank first, then the final-report
/// override, then KB-required indicators, then the conversational heuristics.
pub fn skip_reason(
    query: &str,
    mode: ChatMode,
    is_final_report: bool,
) -> Option<&'static str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Some("Empty query");
    }

    // Final reports cite law; retrieval is mandatory regardless of phrasing.
    if is_final_report && mode == ChatMode::CaseAssessment {
        return None;
    }

    let lower = trimmed.to_lowercase();

    if KB_REQUIRED_INDICATORS
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return None;
    }

    if matches_opening(&lower, GREETINGS) {
        return Some("Greeting");
    }
    if matches_opening(&lower, FAREWELLS) {
        return Some("Farewell");
    }
    if IDENTITY_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some("Identity question");
    }
    if USAGE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some("Usage question");
    }
    if is_short_acknowledgment(&lower) {
        return Some("Acknowledgment");
    }
    if META_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some("Platform question");
    }
    if OVERVIEW_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some("Legal system overview");
    }
    if is_arithmetic(&lower) || OFF_TOPIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some("Non-legal question");
    }
    if is_short_conversational(&lower) {
        return Some("Conversational fragment");
    }

    None
}

pub fn should_skip_retrieval(query: &str, mode: ChatMode, is_final_report: bool) -> bool {
    skip_reason(query, mode, is_final_report).is_some()
}

/// Exact match, or a pattern opening a short message ("hi there!"). The
/// character after the pattern must be a non-word boundary so "hi" does not
/// swallow "his employer ...".
fn matches_opening(lower: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| {
        if lower == *p {
            return true;
        }
        if lower.len() <= 30 && lower.starts_with(p) {
            return lower[p.len()..]
                .chars()
                .next()
                .is_some_and(|c| !c.is_alphanumeric());
        }
        false
    })
}

fn is_short_acknowledgment(lower: &str) -> bool {
    if lower.len() > SHORT_ACK_MAX_LEN {
        return false;
    }
    let bare = lower.trim_end_matches(['.', '!']);
    ACKNOWLEDGMENTS.contains(&bare)
}

/// Plain arithmetic: only digits, operators and grouping, with at least one
/// digit and one operator.
fn is_arithmetic(lower: &str) -> bool {
    let mut has_digit = false;
    let mut has_operator = false;
    for c in lower.chars() {
        match c {
            '0'..='9' => has_digit = true,
            '+' | '-' | '*' | '/' | '%' | '=' | '^' => has_operator = true,
            '(' | ')' | '.' | ',' | '?' | ' ' => {}
            _ => return false,
        }
    }
    has_digit && has_operator
}

fn is_short_conversational(lower: &str) -> bool {
    if lower.len() > SHORT_FRAGMENT_MAX_LEN {
        return false;
    }
    SHORT_ANSWER_PREFIXES.iter().any(|p| lower.starts_with(p))
        || TIME_REFERENCES.iter().any(|t| lower.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(query: &str) -> Option<&'static str> {
        skip_reason(query, ChatMode::Consultation, false)
    }

    #[test]
    fn test_blank_query_skips() {
        assert_eq!(reason(""), Some("Empty query"));
        assert_eq!(reason("   "), Some("Empty query"));
    }

    #[test]
    fn test_kb_indicator_wins_over_conversational_heuristics() {
        // "article" and "penalty for" are KB-required indicators; the
        // question must reach retrieval.
        assert_eq!(
            reason("What is the penalty for theft under Article 308?"),
            None
        );
        // Off-topic keyword present, but the indicator still wins.
        assert_eq!(reason("penalty for pirating a movie"), None);
    }

    #[test]
    fn test_final_report_forces_retrieval() {
        assert_eq!(
            skip_reason("hello", ChatMode::CaseAssessment, true),
            None
        );
        // Without the report flag the greeting skips as usual.
        assert_eq!(
            skip_reason("hello", ChatMode::CaseAssessment, false),
            Some("Greeting")
        );
    }

    #[test]
    fn test_greeting_skips() {
        assert_eq!(reason("hello"), Some("Greeting"));
        assert_eq!(reason("Hi there!"), Some("Greeting"));
        assert_eq!(reason("good morning"), Some("Greeting"));
    }

    #[test]
    fn test_farewell_and_thanks_skip() {
        assert_eq!(reason("thanks"), Some("Farewell"));
        assert_eq!(reason("salamat po"), Some("Farewell"));
    }

    #[test]
    fn test_identity_and_usage_skip() {
        assert_eq!(reason("who are you exactly?"), Some("Identity question"));
        assert_eq!(reason("how do i use this assistant"), Some("Usage question"));
    }

    #[test]
    fn test_short_acknowledgment_skips() {
        assert_eq!(reason("ok"), Some("Acknowledgment"));
        assert_eq!(reason("got it!"), Some("Acknowledgment"));
        assert_eq!(reason("sige"), Some("Acknowledgment"));
    }

    #[test]
    fn test_platform_and_overview_skip() {
        assert_eq!(reason("who made you?"), Some("Platform question"));
        assert_eq!(reason("what are the branches of law"), Some("Legal system overview"));
    }

    #[test]
    fn test_arithmetic_and_off_topic_skip() {
        assert_eq!(reason("2 + 2 = ?"), Some("Non-legal question"));
        assert_eq!(reason("what's the weather like"), Some("Non-legal question"));
    }

    #[test]
    fn test_short_conversational_fragment_skips() {
        assert_eq!(reason("yes, around 5pm"), Some("Conversational fragment"));
        assert_eq!(reason("it was yesterday"), Some("Conversational fragment"));
    }

    #[test]
    fn test_substantive_question_is_not_skipped() {
        assert_eq!(reason("Can my employer fire me without due process?"), None);
        assert_eq!(reason("My landlord wants to evict me next month"), None);
    }
}
