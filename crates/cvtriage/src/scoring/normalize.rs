//! Text normalization for accent-insensitive keyword matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalizes text for comparison: NFD decomposition, combining marks
/// stripped, lowercased. "Experiência" and "experiencia" normalize to the
/// same string.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("experiência"), "experiencia");
        assert_eq!(normalize("formação"), "formacao");
        assert_eq!(normalize("currículo"), "curriculo");
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(normalize("GRADUAÇÃO"), "graduacao");
        assert_eq!(normalize("Técnico"), "tecnico");
    }

    #[test]
    fn test_plain_ascii_unchanged() {
        assert_eq!(normalize("engineer"), "engineer");
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
    }
}
