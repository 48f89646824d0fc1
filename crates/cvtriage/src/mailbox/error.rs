//! Mailbox provider error types.

use thiserror::Error;

/// Errors that can occur while talking to a mailbox provider.
#[derive(Error, Debug)]
pub enum MailboxError {
    /// Failed to connect to the mail server.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Authentication was rejected by the provider. Distinguished from
    /// transient failures so callers can stop retrying.
    #[error("Authentication failed for account '{account}': {reason}")]
    AuthFailed { account: String, reason: String },

    /// Failed to retrieve credentials from environment variable.
    #[error("Credentials not found: environment variable '{0}' is not set")]
    CredentialsNotFound(String),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// Graph API returned an error response.
    #[error("Graph API error ({status}): {body}")]
    GraphApi { status: u16, body: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a message.
    #[error("Failed to parse message: {0}")]
    ParseError(String),

    /// Mail folder not found.
    #[error("Mail folder '{0}' not found")]
    FolderNotFound(String),

    /// A referenced message disappeared between search and fetch.
    #[error("Message '{0}' not found")]
    MessageNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<async_native_tls::Error> for MailboxError {
    fn from(err: async_native_tls::Error) -> Self {
        MailboxError::TlsError(err.to_string())
    }
}

/// Result type for mailbox operations.
pub type Result<T> = std::result::Result<T, MailboxError>;
