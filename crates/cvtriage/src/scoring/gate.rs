//! Job-relevance gate.
//!
//! Rejects candidates that are not plausibly relevant to a specific job
//! before the full weighted score is computed, so an unrelated résumé
//! cannot score non-zero just by containing generic résumé vocabulary.

use super::normalize::normalize;
use super::scorer::{KeywordScorer, MatchKind};

/// Contribution of a literal keyword match to the correspondence score.
const LITERAL_WEIGHT: f64 = 1.0;
/// Contribution of a match found only through an abbreviation expansion.
/// Weighted lower because the match is inferred, not literal.
const EXPANSION_WEIGHT: f64 = 0.7;

/// Computes the correspondence score in [0, 10] between résumé text and a
/// job's keywords.
pub fn correspondence_score(
    scorer: &KeywordScorer,
    text: &str,
    job_keywords: &[String],
) -> f64 {
    if job_keywords.is_empty() {
        return 0.0;
    }

    let normalized_text = normalize(text);
    let mut contributions = 0.0;

    for keyword in job_keywords {
        match scorer.match_keyword(&normalized_text, keyword) {
            Some(MatchKind::Literal) => contributions += LITERAL_WEIGHT,
            Some(MatchKind::Expansion) => contributions += EXPANSION_WEIGHT,
            None => {}
        }
    }

    (contributions / job_keywords.len() as f64 * 10.0).min(10.0)
}
