pub mod archive;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod mailbox;
pub mod pipeline;
pub mod scoring;
pub mod store;

pub use archive::{ArchiveSink, FilesystemArchive};
pub use config::{
    AccountConfig, Config, GraphConfig, ImapConfig, PipelineConfig, ProviderConfig, ScoringConfig,
};
pub use error::{ExtractError, Result, TriageError};
pub use mailbox::{GraphConnector, ImapConnector, MailboxConnector, SearchWindow};
pub use pipeline::{CancelToken, RunReport, ScanRunner};
pub use scoring::{
    AbbreviationTable, CandidateClassifier, ClassificationResult, GenericKeywords, KeywordScorer,
    RelevanceHook, Status,
};
pub use store::{Database, StoreError};
