use crate::models::{ChatMode, KnowledgeBaseEntry, StructuredQuery, Urgency};

const CITATION_MATCH_BOOST: f32 = 0.2;
const TOPIC_OVERLAP_BOOST: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Evidence is trusted enough to answer KB-first.
    Accept,
    /// Evidence stays attached as supporting context only.
    Reject,
}

/// Multi-signal confidence over a retrieved entry set, clamped to [0, 1].
///
/// Base score blends the best and the average similarity; citation and topic
/// agreement with the structured query add fixed boosts. Boosts are additive
/// and only the final clamp bounds the result.
pub fn score_confidence(entries: &[KnowledgeBaseEntry], query: &StructuredQuery) -> f32 {
    if entries.is_empty() {
        return 0.0;
    }

    let max_similarity = entries
        .iter()
        .map(KnowledgeBaseEntry::similarity_or_zero)
        .fold(0.0f32, f32::max);
    let avg_similarity = entries
        .iter()
        .map(KnowledgeBaseEntry::similarity_or_zero)
        .sum::<f32>()
        / entries.len() as f32;

    let mut score = (max_similarity * 0.9).max(avg_similarity * 0.8);

    if citation_matches_statute(entries, query) {
        score += CITATION_MATCH_BOOST;
    }
    if tags_overlap_topics(entries, query) {
        score += TOPIC_OVERLAP_BOOST;
    }

    score.clamp(0.0, 1.0)
}

fn citation_matches_statute(entries: &[KnowledgeBaseEntry], query: &StructuredQuery) -> bool {
    query.statutes_referenced.iter().any(|statute| {
        let statute = statute.to_lowercase();
        entries
            .iter()
            .any(|entry| entry.canonical_citation.to_lowercase().contains(&statute))
    })
}

fn tags_overlap_topics(entries: &[KnowledgeBaseEntry], query: &StructuredQuery) -> bool {
    query.legal_topics.iter().any(|topic| {
        let topic = topic.to_lowercase();
        entries.iter().any(|entry| {
            entry.tags.iter().any(|tag| {
                let tag = tag.to_lowercase();
                tag.contains(&topic) || topic.contains(&tag)
            })
        })
    })
}

/// Per-query acceptance threshold, derived from the configured base.
///
/// The rules are priority-ordered and NOT cumulative: the first matching rule
/// decides, evaluated top to bottom — statute references, then high urgency,
/// then procedural topics, then case-assessment mode.
pub fn dynamic_threshold(query: &StructuredQuery, mode: ChatMode, base: f32) -> f32 {
    let rules: [(&str, bool, f32); 4] = [
        ("statute-reference", query.has_statutes(), (base * 0.7).max(0.12)),
        (
            "high-urgency",
            query.urgency == Urgency::High,
            (base * 0.8).max(0.14),
        ),
        ("procedural", query.is_procedural(), (base * 0.5).max(0.08)),
        (
            "case-assessment",
            mode == ChatMode::CaseAssessment,
            (base * 0.8).max(0.10),
        ),
    ];

    for (rule, matched, threshold) in rules {
        if matched {
            tracing::debug!(rule, threshold, "Threshold adjusted");
            return threshold;
        }
    }

    base
}

/// Accept is inclusive: confidence equal to the threshold passes the gate.
pub fn decide(confidence: f32, threshold: f32) -> GateDecision {
    if confidence >= threshold {
        GateDecision::Accept
    } else {
        GateDecision::Reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, similarity: Option<f32>) -> KnowledgeBaseEntry {
        KnowledgeBaseEntry {
            entry_id: id.to_string(),
            similarity,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_entry_set_scores_zero() {
        let query = StructuredQuery::bare("anything");
        assert_eq!(score_confidence(&[], &query), 0.0);
    }

    #[test]
    fn test_base_score_blends_max_and_average() {
        let query = StructuredQuery::bare("q");
        // max = 0.6 -> 0.54; avg = 0.4 -> 0.32; max wins
        let entries = vec![entry("a", Some(0.6)), entry("b", Some(0.2))];
        let score = score_confidence(&entries, &query);
        assert!((score - 0.54).abs() < 1e-6);

        // Flat high average where avg*0.8 beats max*0.9 is impossible by
        // construction (avg <= max), so the max branch always dominates when
        // scores are equal.
        let entries = vec![entry("a", Some(0.5)), entry("b", Some(0.5))];
        let score = score_confidence(&entries, &query);
        assert!((score - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_citation_boost_applies_case_insensitively() {
        let mut query = StructuredQuery::bare("penalty under article 308");
        query.statutes_referenced = vec!["Article 308".to_string()];

        let mut matching = entry("a", Some(0.5));
        matching.canonical_citation = "Revised Penal Code, ARTICLE 308".to_string();

        let score = score_confidence(&[matching], &query);
        assert!((score - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_topic_boost_applies_on_tag_overlap() {
        let mut query = StructuredQuery::bare("q");
        query.legal_topics = vec!["criminal".to_string()];

        let mut tagged = entry("a", Some(0.5));
        tagged.tags = vec!["Criminal Law".to_string()];

        let score = score_confidence(&[tagged], &query);
        assert!((score - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_score_clamps_to_exactly_one() {
        let mut query = StructuredQuery::bare("q");
        query.statutes_referenced = vec!["Article 308".to_string()];
        query.legal_topics = vec!["criminal".to_string()];

        let mut stacked = entry("a", Some(1.0));
        stacked.canonical_citation = "Article 308".to_string();
        stacked.tags = vec!["criminal".to_string()];

        // 0.9 + 0.2 + 0.1 would be 1.2; the clamp bounds it.
        assert_eq!(score_confidence(&[stacked], &query), 1.0);
    }

    #[test]
    fn test_threshold_rules_priority_order() {
        let base = 0.18;

        let mut query = StructuredQuery::bare("q");
        query.statutes_referenced = vec!["Rule 114".to_string()];
        query.urgency = Urgency::High;
        // Statute rule outranks the urgency rule even when both match.
        let threshold = dynamic_threshold(&query, ChatMode::Consultation, base);
        assert!((threshold - (base * 0.7).max(0.12)).abs() < 1e-6);

        let mut query = StructuredQuery::bare("q");
        query.urgency = Urgency::High;
        let threshold = dynamic_threshold(&query, ChatMode::Consultation, base);
        assert!((threshold - (base * 0.8).max(0.14)).abs() < 1e-6);

        let mut query = StructuredQuery::bare("q");
        query.legal_topics = vec!["procedural".to_string()];
        let threshold = dynamic_threshold(&query, ChatMode::Consultation, base);
        assert!((threshold - (base * 0.5).max(0.08)).abs() < 1e-6);

        let query = StructuredQuery::bare("q");
        let threshold = dynamic_threshold(&query, ChatMode::CaseAssessment, base);
        assert!((threshold - (base * 0.8).max(0.10)).abs() < 1e-6);

        let query = StructuredQuery::bare("q");
        assert_eq!(dynamic_threshold(&query, ChatMode::Consultation, base), base);
    }

    #[test]
    fn test_threshold_floors_win_for_small_bases() {
        let mut query = StructuredQuery::bare("q");
        query.statutes_referenced = vec!["Rule 114".to_string()];
        // base*0.7 = 0.035 < floor 0.12
        assert_eq!(
            dynamic_threshold(&query, ChatMode::Consultation, 0.05),
            0.12
        );
    }

    #[test]
    fn test_gate_boundary_is_inclusive() {
        assert_eq!(decide(0.18, 0.18), GateDecision::Accept);
        assert_eq!(decide(0.1799, 0.18), GateDecision::Reject);
        assert_eq!(decide(0.5, 0.18), GateDecision::Accept);
    }
}
