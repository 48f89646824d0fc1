use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] crate::mailbox::MailboxError),

    #[error("Storage error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Legacy .doc format is not supported, convert to .docx")]
    LegacyDocFormat,

    #[error("Failed to extract PDF text: {0}")]
    PdfExtraction(String),

    #[error("Failed to extract DOCX text: {0}")]
    DocxExtraction(String),

    #[error("Failed to decode text file: {0}")]
    TextDecoding(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TriageError>;
