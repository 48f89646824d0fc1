//! Résumé scoring: text normalization, abbreviation-aware keyword
//! matching, the job-relevance gate and the final classification.

pub mod abbrev;
pub mod classifier;
pub mod gate;
pub mod normalize;
pub mod scorer;

pub use abbrev::AbbreviationTable;
pub use classifier::{
    AttachmentScore, CandidateClassifier, ClassificationResult, ExtractedText, GenericKeywords,
    JobDescription, RelevanceHook, ScoreBreakdown, Status,
};
pub use gate::correspondence_score;
pub use normalize::normalize;
pub use scorer::{CategoryScore, KeywordScorer, MatchKind};
