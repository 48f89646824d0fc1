//! Static abbreviation table for recruiting-domain terms.
//!
//! Maps common abbreviations (as they appear in job postings and résumés)
//! to their full-term equivalents. The relation is bidirectional: a keyword
//! that is an abbreviation matches text containing any expansion, and a
//! keyword that is a full term matches text containing the abbreviation.

use std::collections::HashMap;

use super::normalize::normalize;

/// Bidirectional abbreviation/expansion lookup, built once at startup and
/// injected into the scorer and gate.
#[derive(Debug, Clone)]
pub struct AbbreviationTable {
    /// abbreviation -> normalized expansions
    expansions: HashMap<String, Vec<String>>,
    /// normalized full term -> abbreviation
    reverse: HashMap<String, String>,
}

/// Abbreviations common in Brazilian recruiting vocabulary. The expansions
/// are stored pre-normalized so matching needs no further processing.
const ENTRIES: &[(&str, &[&str])] = &[
    (
        "tst",
        &[
            "tecnico em seguranca do trabalho",
            "seguranca do trabalho",
        ],
    ),
    ("rh", &["recursos humanos", "gestao de pessoas"]),
    ("ti", &["tecnologia da informacao", "informatica"]),
    ("adm", &["administracao", "administrativo"]),
    ("eng", &["engenharia", "engenheiro", "engenheira"]),
    ("tec", &["tecnico", "tecnologia"]),
    ("sup", &["superior", "supervisao", "supervisor"]),
    ("coord", &["coordenacao", "coordenador"]),
    ("ger", &["gerencia", "gerente"]),
    ("dir", &["diretoria", "diretor", "diretora"]),
    ("aux", &["auxiliar", "assistente"]),
    ("op", &["operacao", "operador"]),
    ("prod", &["producao", "produto"]),
    ("qual", &["qualidade", "controle de qualidade"]),
    ("seg", &["seguranca"]),
    ("amb", &["ambiental", "meio ambiente"]),
    ("cont", &["contabilidade", "contador", "contabil"]),
    ("fin", &["financeiro", "financas"]),
    ("com", &["comercial", "comercio", "vendas"]),
    ("mkt", &["marketing", "mercadologia"]),
    ("log", &["logistica"]),
];

impl AbbreviationTable {
    /// Builds the built-in table.
    pub fn builtin() -> Self {
        let mut expansions = HashMap::new();
        let mut reverse = HashMap::new();

        for (abbrev, terms) in ENTRIES {
            let terms: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
            for term in &terms {
                reverse.insert(term.clone(), abbrev.to_string());
            }
            expansions.insert(abbrev.to_string(), terms);
        }

        Self {
            expansions,
            reverse,
        }
    }

    /// Returns the expansions of `word` if it is a known abbreviation.
    /// `word` may carry accents or mixed case.
    pub fn expansions_of(&self, word: &str) -> Option<&[String]> {
        self.expansions.get(&normalize(word)).map(|v| v.as_slice())
    }

    /// Returns the abbreviation whose expansion set contains `term`, if any.
    pub fn abbreviation_for(&self, term: &str) -> Option<&str> {
        self.reverse.get(&normalize(term)).map(|s| s.as_str())
    }

    /// Number of known abbreviations.
    pub fn len(&self) -> usize {
        self.expansions.len()
    }

    /// True when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }
}

impl Default for AbbreviationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_size() {
        let table = AbbreviationTable::builtin();
        assert_eq!(table.len(), 21);
    }

    #[test]
    fn test_expansions_of_known_abbreviation() {
        let table = AbbreviationTable::builtin();
        let expansions = table.expansions_of("ti").unwrap();
        assert!(expansions.contains(&"tecnologia da informacao".to_string()));
        assert!(expansions.contains(&"informatica".to_string()));
    }

    #[test]
    fn test_expansions_of_is_accent_insensitive() {
        let table = AbbreviationTable::builtin();
        // "TI" with odd casing still resolves.
        assert!(table.expansions_of("TI").is_some());
        assert!(table.expansions_of("unknown").is_none());
    }

    #[test]
    fn test_abbreviation_for_full_term() {
        let table = AbbreviationTable::builtin();
        assert_eq!(table.abbreviation_for("recursos humanos"), Some("rh"));
        // Accented spelling of the same term resolves too.
        assert_eq!(
            table.abbreviation_for("tecnologia da informação"),
            Some("ti")
        );
        assert_eq!(table.abbreviation_for("carpentry"), None);
    }
}
