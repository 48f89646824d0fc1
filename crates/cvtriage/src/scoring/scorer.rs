//! Keyword category scoring.

use serde::{Deserialize, Serialize};

use super::abbrev::AbbreviationTable;
use super::normalize::normalize;

/// Score and matched-term evidence for one keyword category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Match ratio scaled to [0, 10].
    pub score: f64,
    /// The original keywords (not their expansions) that matched.
    pub matched_keywords: Vec<String>,
    /// Size of the keyword list the ratio was computed against.
    pub total_keywords: usize,
}

/// How a keyword was matched against the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The normalized keyword itself appears in the text.
    Literal,
    /// Only an abbreviation-expansion of the keyword appears.
    Expansion,
}

/// Scores extracted text against keyword lists, with accent-insensitive
/// matching and bidirectional abbreviation expansion.
pub struct KeywordScorer {
    abbreviations: AbbreviationTable,
}

impl KeywordScorer {
    pub fn new(abbreviations: AbbreviationTable) -> Self {
        Self { abbreviations }
    }

    pub fn abbreviations(&self) -> &AbbreviationTable {
        &self.abbreviations
    }

    /// Determines whether `keyword` matches `normalized_text`, and how.
    ///
    /// A keyword matches literally when its normalized form is a substring
    /// of the text. It matches via expansion when the keyword is a known
    /// abbreviation and one of its full terms appears, or the keyword is a
    /// full term and its abbreviation appears.
    pub fn match_keyword(&self, normalized_text: &str, keyword: &str) -> Option<MatchKind> {
        let keyword_norm = normalize(keyword);
        if keyword_norm.is_empty() {
            return None;
        }

        if normalized_text.contains(&keyword_norm) {
            return Some(MatchKind::Literal);
        }

        if let Some(expansions) = self.abbreviations.expansions_of(&keyword_norm) {
            if expansions.iter().any(|e| normalized_text.contains(e)) {
                return Some(MatchKind::Expansion);
            }
        }

        if let Some(abbrev) = self.abbreviations.abbreviation_for(&keyword_norm) {
            if normalized_text.contains(abbrev) {
                return Some(MatchKind::Expansion);
            }
        }

        None
    }

    /// Scores one category: `min(10, 10 * matched / total)`. An empty
    /// keyword list scores 0.
    pub fn score_category(&self, text: &str, keywords: &[String]) -> CategoryScore {
        let normalized_text = normalize(text);
        let mut matched = Vec::new();

        for keyword in keywords {
            if self.match_keyword(&normalized_text, keyword).is_some()
                && !matched.contains(keyword)
            {
                matched.push(keyword.clone());
            }
        }

        let total = keywords.len();
        let score = if total == 0 {
            0.0
        } else {
            (matched.len() as f64 / total as f64 * 10.0).min(10.0)
        };

        CategoryScore {
            score,
            matched_keywords: matched,
            total_keywords: total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> KeywordScorer {
        KeywordScorer::new(AbbreviationTable::builtin())
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_full_match_scores_ten() {
        let result = scorer().score_category(
            "experiencia em vendas e marketing",
            &kw(&["experiencia", "vendas"]),
        );
        assert_eq!(result.score, 10.0);
        assert_eq!(result.matched_keywords.len(), 2);
    }

    #[test]
    fn test_partial_match_is_proportional() {
        let result = scorer().score_category(
            "experiencia profissional",
            &kw(&["experiencia", "mestrado", "doutorado", "ingles"]),
        );
        assert_eq!(result.score, 2.5);
        assert_eq!(result.matched_keywords, vec!["experiencia".to_string()]);
    }

    #[test]
    fn test_empty_keyword_list_scores_zero() {
        let result = scorer().score_category("qualquer texto", &[]);
        assert_eq!(result.score, 0.0);
        assert!(result.matched_keywords.is_empty());
        assert_eq!(result.total_keywords, 0);
    }

    #[test]
    fn test_accent_insensitive_matching() {
        let with_accents =
            scorer().score_category("Experiência de trabalho", &kw(&["experiencia"]));
        let without_accents =
            scorer().score_category("experiencia de trabalho", &kw(&["experiencia"]));
        assert_eq!(with_accents.score, without_accents.score);
        assert_eq!(with_accents.score, 10.0);
    }

    #[test]
    fn test_abbreviation_keyword_matches_expansion_in_text() {
        // Keyword "ti" matches text with the full term, including accents.
        let result = scorer().score_category(
            "formado em tecnologia da informação pela universidade",
            &kw(&["ti"]),
        );
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn test_full_term_keyword_matches_abbreviation_in_text() {
        let result = scorer().score_category(
            "atuei no setor de ti por cinco anos",
            &kw(&["tecnologia da informação"]),
        );
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn test_no_match_scores_zero() {
        let result = scorer().score_category(
            "soldador com curso de caldeiraria",
            &kw(&["marketing", "mestrado"]),
        );
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_match_kind_distinguishes_literal_from_expansion() {
        let s = scorer();
        let text = normalize("trabalhei com recursos humanos");
        assert_eq!(s.match_keyword(&text, "recursos humanos"), Some(MatchKind::Literal));
        assert_eq!(s.match_keyword(&text, "rh"), Some(MatchKind::Expansion));
        assert_eq!(s.match_keyword(&text, "logistica"), None);
    }
}
