//! Candidate classification.
//!
//! Orchestrates the relevance gate, keyword scoring and the optional
//! external relevance hook into a final score and status per message.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScoringConfig;
use crate::store::profile_repo::JobProfile;

use super::gate::correspondence_score;
use super::scorer::{CategoryScore, KeywordScorer};

pub const CATEGORY_JOB_KEYWORDS: &str = "job_keywords";
pub const CATEGORY_EDUCATION: &str = "education";
pub const CATEGORY_EXPERIENCE: &str = "experience";
pub const CATEGORY_SKILLS: &str = "skills";

/// Built-in keyword lists for the three generic categories. Immutable data,
/// loaded once and injected alongside the abbreviation table.
#[derive(Debug, Clone)]
pub struct GenericKeywords {
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub skills: Vec<String>,
}

impl GenericKeywords {
    pub fn builtin() -> Self {
        fn list(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }

        Self {
            education: list(&[
                "graduação",
                "bacharelado",
                "licenciatura",
                "mestrado",
                "doutorado",
                "técnico",
                "superior",
                "universidade",
                "faculdade",
                "curso",
            ]),
            experience: list(&[
                "experiência",
                "trabalho",
                "emprego",
                "função",
                "cargo",
                "atuação",
                "atividade",
                "responsabilidade",
                "ano",
                "anos",
            ]),
            skills: list(&[
                "conhecimento",
                "habilidade",
                "competência",
                "domínio",
                "experiência em",
                "trabalho com",
                "utilização",
            ]),
        }
    }
}

impl Default for GenericKeywords {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Final status of a classification. Fixed at creation, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Approved,
    Review,
    Rejected,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Approved => "Approved",
            Status::Review => "Review",
            Status::Rejected => "Rejected",
            Status::Error => "Error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Approved" => Some(Status::Approved),
            "Review" => Some(Status::Review),
            "Rejected" => Some(Status::Rejected),
            "Error" => Some(Status::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category evidence for one attachment's score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub categories: BTreeMap<String, CategoryScore>,
    /// Set when the relevance gate rejected the candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Gate score, recorded whenever a job profile was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correspondence_score: Option<f64>,
    /// External hook indicator, when the hook contributed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_adjustment: Option<f64>,
}

/// Score for one attachment of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentScore {
    pub file_name: String,
    /// Length of the extracted text, zero when extraction failed.
    pub text_length: usize,
    pub extracted: bool,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// The classification of one message, written to the result store exactly
/// once per identity key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub sender_email: String,
    pub subject: String,
    /// Raw message Date header. Part of the identity key, so it is kept
    /// verbatim rather than re-parsed.
    pub message_date: String,
    /// Original attachment file names, comma-joined.
    pub file_names: String,
    pub final_score: f64,
    pub status: Status,
    pub attachments: Vec<AttachmentScore>,
    pub job_profile_id: Option<i64>,
    pub analyzed_at: DateTime<Utc>,
}

impl ClassificationResult {
    /// The deduplication identity: (sender, subject, message date). Not
    /// globally unique by design — a resend of the identical subject and
    /// date counts as the same submission.
    pub fn identity_key(&self) -> (&str, &str, &str) {
        (&self.sender_email, &self.subject, &self.message_date)
    }
}

/// Loosely-constructed job description handed to the external hook.
#[derive(Debug, Clone)]
pub struct JobDescription {
    pub title: String,
    pub requirements: Vec<String>,
}

/// Optional external relevance-adjustment capability. Implementations
/// return a fit indicator in [0, 100], or `None` to decline. Failures must
/// be swallowed and reported as `None`; the caller cannot tell them apart
/// from a declined adjustment.
pub trait RelevanceHook: Send + Sync {
    fn assess(&self, text: &str, job: &JobDescription) -> Option<f64>;
}

/// Extracted text for one attachment, as produced by the extractor.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub file_name: String,
    /// `None` when extraction failed.
    pub text: Option<String>,
}

pub struct CandidateClassifier {
    scorer: KeywordScorer,
    generic: GenericKeywords,
    config: ScoringConfig,
    hook: Option<Box<dyn RelevanceHook>>,
}

impl CandidateClassifier {
    pub fn new(scorer: KeywordScorer, generic: GenericKeywords, config: ScoringConfig) -> Self {
        Self {
            scorer,
            generic,
            config,
            hook: None,
        }
    }

    /// Attaches the optional external relevance hook.
    pub fn with_hook(mut self, hook: Box<dyn RelevanceHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn scorer(&self) -> &KeywordScorer {
        &self.scorer
    }

    /// Classifies one message from the extracted texts of its attachments.
    pub fn classify(
        &self,
        sender_email: &str,
        subject: &str,
        message_date: &str,
        extracted: &[ExtractedText],
        profile: Option<&JobProfile>,
    ) -> ClassificationResult {
        let file_names = extracted
            .iter()
            .map(|e| e.file_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut attachments = Vec::with_capacity(extracted.len());
        let mut extracted_count = 0usize;
        let mut total = 0.0;

        for item in extracted {
            let attachment = match &item.text {
                Some(text) => {
                    let (score, breakdown) = self.score_text(text, profile);
                    extracted_count += 1;
                    total += score;
                    AttachmentScore {
                        file_name: item.file_name.clone(),
                        text_length: text.len(),
                        extracted: true,
                        score,
                        breakdown,
                    }
                }
                None => AttachmentScore {
                    file_name: item.file_name.clone(),
                    text_length: 0,
                    extracted: false,
                    score: 0.0,
                    breakdown: ScoreBreakdown::default(),
                },
            };
            attachments.push(attachment);
        }

        let (final_score, status) = if extracted_count == 0 {
            (0.0, Status::Error)
        } else {
            // Every attachment counts in the mean; a failed extraction
            // contributes zero rather than shrinking the denominator.
            let mean = total / extracted.len() as f64;
            (mean, self.status_for(mean))
        };

        debug!(
            sender = sender_email,
            score = final_score,
            status = %status,
            "message classified"
        );

        ClassificationResult {
            sender_email: sender_email.to_string(),
            subject: subject.to_string(),
            message_date: message_date.to_string(),
            file_names,
            final_score,
            status,
            attachments,
            job_profile_id: profile.map(|p| p.id),
            analyzed_at: Utc::now(),
        }
    }

    /// Scores the text of a single attachment. Returns the attachment score
    /// in [0, 10] and the category breakdown.
    fn score_text(&self, text: &str, profile: Option<&JobProfile>) -> (f64, ScoreBreakdown) {
        let mut breakdown = ScoreBreakdown::default();

        if let Some(profile) = profile {
            let correspondence = correspondence_score(&self.scorer, text, &profile.keywords);
            breakdown.correspondence_score = Some(correspondence);

            // Gate: clearly unrelated résumés are rejected before any
            // category scoring runs.
            if correspondence < self.config.gate_threshold {
                breakdown.rejection_reason = Some(format!(
                    "Résumé does not match the job profile: {:.1}/10.0 correspondence points",
                    correspondence
                ));
                return (0.0, breakdown);
            }
        }

        let education = self.scorer.score_category(text, &self.generic.education);
        let experience = self.scorer.score_category(text, &self.generic.experience);
        let skills = self.scorer.score_category(text, &self.generic.skills);
        let generic_score = (education.score + experience.score + skills.score) / 3.0;

        let mut score = match profile {
            Some(profile) => {
                let job = self.scorer.score_category(text, &profile.keywords);
                let job_score = job.score;
                breakdown
                    .categories
                    .insert(CATEGORY_JOB_KEYWORDS.to_string(), job);
                job_score * 0.7 + generic_score * 0.3
            }
            None => generic_score,
        };

        breakdown
            .categories
            .insert(CATEGORY_EDUCATION.to_string(), education);
        breakdown
            .categories
            .insert(CATEGORY_EXPERIENCE.to_string(), experience);
        breakdown
            .categories
            .insert(CATEGORY_SKILLS.to_string(), skills);

        if let Some(hook) = &self.hook {
            let job_desc = JobDescription {
                title: profile
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| "General screening".to_string()),
                requirements: profile
                    .map(|p| p.keywords.iter().take(10).cloned().collect())
                    .unwrap_or_default(),
            };
            if let Some(indicator) = hook.assess(text, &job_desc) {
                if indicator > 0.0 {
                    score = score * 0.7 + (indicator / 10.0) * 0.3;
                    breakdown.external_adjustment = Some(indicator);
                }
            }
        }

        // One-decimal precision per attachment, same as the stored records.
        ((score * 10.0).round() / 10.0, breakdown)
    }

    fn status_for(&self, score: f64) -> Status {
        if score >= self.config.approve_threshold {
            Status::Approved
        } else if score >= self.config.review_threshold {
            Status::Review
        } else {
            Status::Rejected
        }
    }
}
