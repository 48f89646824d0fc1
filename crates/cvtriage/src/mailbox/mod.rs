//! Mailbox providers.
//!
//! This module abstracts over the two supported mailbox backends, IMAP
//! and the Microsoft Graph API, behind the `MailboxConnector` trait. Both
//! backends are strictly read-only: nothing is flagged, moved or deleted.

pub mod error;
pub mod graph;
pub mod imap;
pub mod parser;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{AccountConfig, ProviderConfig};

pub use error::MailboxError;
pub use graph::GraphConnector;
pub use imap::ImapConnector;
pub use parser::MessageEnvelopeParser;

/// Restricts a search to messages received on or after `since`.
/// An empty window means the whole folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchWindow {
    pub since: Option<DateTime<Utc>>,
}

/// Opaque handle to one message inside a provider. IMAP stores the UID
/// as a decimal string, Graph its message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
}

/// One attachment of a fetched message, held in memory.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A fetched message with its attachments.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub sender_email: String,
    pub subject: String,
    /// The message's Date header, kept verbatim as part of the
    /// deduplication identity.
    pub message_date: String,
    pub attachments: Vec<Attachment>,
}

/// Unread and total message counts for a folder, where the provider
/// exposes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderCounts {
    pub unread: u64,
    pub total: u64,
}

/// Builds the connector matching an account's provider settings.
pub fn connector_for(account: &AccountConfig, search_cap: usize) -> Box<dyn MailboxConnector> {
    match &account.provider {
        ProviderConfig::Imap(config) => Box::new(ImapConnector::new(
            &account.name,
            config.clone(),
            search_cap,
        )),
        ProviderConfig::Graph(config) => Box::new(GraphConnector::new(
            &account.name,
            config.clone(),
            search_cap,
        )),
    }
}

/// A read-only mailbox backend.
#[async_trait]
pub trait MailboxConnector: Send {
    /// Connects and authenticates. Idempotent when already connected.
    async fn connect(&mut self) -> error::Result<()>;

    /// Finds candidate messages inside the window, most recent first.
    /// Implementations cap the result at the configured search limit.
    async fn search(&mut self, window: &SearchWindow) -> error::Result<Vec<MessageRef>>;

    /// Cheap structural check that a message carries at least one
    /// attachment of an accepted document type, without downloading the
    /// body. Providers that cannot tell return `true` and let the fetch
    /// decide.
    async fn has_candidate_attachments(&mut self, message: &MessageRef) -> error::Result<bool>;

    /// Downloads one message with its attachments.
    async fn fetch(&mut self, message: &MessageRef) -> error::Result<MailMessage>;

    /// Folder counters, if the provider exposes them.
    async fn folder_counts(&mut self) -> error::Result<Option<FolderCounts>>;

    /// Closes the connection gracefully.
    async fn disconnect(&mut self) -> error::Result<()>;
}
