//! IMAP mailbox connector.
//!
//! Opens folders with EXAMINE so the scan never marks messages as read,
//! and fetches bodies with BODY.PEEK[] for the same reason.

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::StreamExt;
use imap_proto::types::BodyStructure;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::config::ImapConfig;
use crate::extract::FormatTag;

use super::error::{MailboxError, Result};
use super::parser::MessageEnvelopeParser;
use super::{FolderCounts, MailMessage, MailboxConnector, MessageRef, SearchWindow};

/// Type alias for the underlying async stream (async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

pub struct ImapConnector {
    account: String,
    config: ImapConfig,
    search_cap: usize,
    session: Option<Session<TlsStream>>,
    total_in_folder: Option<u32>,
    parser: MessageEnvelopeParser,
}

impl ImapConnector {
    pub fn new(account: &str, config: ImapConfig, search_cap: usize) -> Self {
        Self {
            account: account.to_string(),
            config,
            search_cap,
            session: None,
            total_in_folder: None,
            parser: MessageEnvelopeParser::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn password(&self) -> Result<SecretString> {
        std::env::var(&self.config.password_env_var)
            .map(|v| SecretString::from(v.trim().to_string()))
            .map_err(|_| MailboxError::CredentialsNotFound(self.config.password_env_var.clone()))
    }

    fn session_mut(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session
            .as_mut()
            .ok_or_else(|| MailboxError::ConnectionFailed("Not connected".to_string()))
    }

    /// Tries each search query in order, returning the first that the
    /// server accepts. Servers differ on HAS ATTACHMENT support, so the
    /// chain degrades down to a plain ALL.
    async fn search_with_fallback(&mut self, queries: &[String]) -> Result<Vec<u32>> {
        let session = self.session_mut()?;

        let mut last_error = None;
        for query in queries {
            debug!("Searching with query: {}", query);
            match session.uid_search(query).await {
                Ok(uids) => {
                    let uid_list: Vec<u32> = uids.into_iter().collect();
                    debug!("Found {} messages matching '{}'", uid_list.len(), query);
                    return Ok(uid_list);
                }
                Err(e) => {
                    debug!("Search '{}' rejected: {}", query, e);
                    last_error = Some(e);
                }
            }
        }

        Err(MailboxError::ProtocolError(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "No search query accepted".to_string()),
        ))
    }
}

#[async_trait]
impl MailboxConnector for ImapConnector {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        let password = self.password()?;

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Connecting to IMAP server at {}", addr);

        // Establish TCP connection using std::net and wrap with async-io
        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| MailboxError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| MailboxError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| MailboxError::ConnectionFailed(e.to_string()))?;

        let tls = TlsConnector::new();
        let tls_stream = tls
            .connect(&self.config.host, tcp_stream)
            .await
            .map_err(|e| MailboxError::TlsError(e.to_string()))?;

        let client = async_imap::Client::new(tls_stream);

        let mut session = client
            .login(&self.config.username, password.expose_secret())
            .await
            .map_err(|(e, _)| MailboxError::AuthFailed {
                account: self.account.clone(),
                reason: e.to_string(),
            })?;

        info!("Authenticated to IMAP server as {}", self.config.username);

        // Read-only open so the scan leaves the folder untouched.
        let mailbox = session.examine(&self.config.folder).await.map_err(|e| {
            if e.to_string().contains("NO") {
                MailboxError::FolderNotFound(self.config.folder.clone())
            } else {
                MailboxError::ProtocolError(e.to_string())
            }
        })?;

        debug!(
            "Folder '{}' opened with {} messages",
            self.config.folder, mailbox.exists
        );

        self.total_in_folder = Some(mailbox.exists);
        self.session = Some(session);
        Ok(())
    }

    async fn search(&mut self, window: &SearchWindow) -> Result<Vec<MessageRef>> {
        let queries = match window.since {
            Some(since) => {
                let date = since.format("%d-%b-%Y").to_string();
                vec![
                    format!("SINCE {} HAS ATTACHMENT", date),
                    format!("SINCE {}", date),
                    "ALL".to_string(),
                ]
            }
            None => vec!["HAS ATTACHMENT".to_string(), "ALL".to_string()],
        };

        let uids = self.search_with_fallback(&queries).await?;
        let uids = cap_most_recent(uids, self.search_cap);

        Ok(uids
            .into_iter()
            .map(|uid| MessageRef {
                id: uid.to_string(),
            })
            .collect())
    }

    async fn has_candidate_attachments(&mut self, message: &MessageRef) -> Result<bool> {
        let session = self.session_mut()?;

        let mut messages = session
            .uid_fetch(&message.id, "BODYSTRUCTURE")
            .await
            .map_err(|e| MailboxError::ProtocolError(e.to_string()))?;

        let fetched = match messages.next().await {
            Some(Ok(fetched)) => fetched,
            Some(Err(e)) => return Err(MailboxError::ProtocolError(e.to_string())),
            // Server gave nothing back; let the full fetch decide.
            None => return Ok(true),
        };

        Ok(fetched
            .bodystructure()
            .map(structure_has_candidate)
            .unwrap_or(true))
    }

    async fn fetch(&mut self, message: &MessageRef) -> Result<MailMessage> {
        let session = self.session_mut()?;

        debug!("Fetching message UID {}", message.id);

        // BODY.PEEK[] fetches without setting the \Seen flag.
        let mut messages = session
            .uid_fetch(&message.id, "BODY.PEEK[]")
            .await
            .map_err(|e| MailboxError::ProtocolError(e.to_string()))?;

        let fetched = messages
            .next()
            .await
            .ok_or_else(|| MailboxError::MessageNotFound(message.id.clone()))?
            .map_err(|e| MailboxError::ProtocolError(e.to_string()))?;

        // Copy the body out and release the fetch stream (and with it the
        // session borrow) before handing the bytes to the parser.
        let body = fetched
            .body()
            .ok_or_else(|| MailboxError::ProtocolError("Message has no body".to_string()))?
            .to_vec();
        drop(messages);

        self.parser.parse(&body)
    }

    async fn folder_counts(&mut self) -> Result<Option<FolderCounts>> {
        let total = match self.total_in_folder {
            Some(total) => total as u64,
            None => return Ok(None),
        };

        let session = self.session_mut()?;
        let unseen = session
            .uid_search("UNSEEN")
            .await
            .map_err(|e| MailboxError::ProtocolError(e.to_string()))?;

        Ok(Some(FolderCounts {
            unread: unseen.len() as u64,
            total,
        }))
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            session
                .logout()
                .await
                .map_err(|e| MailboxError::ProtocolError(e.to_string()))?;
        }
        self.total_in_folder = None;
        Ok(())
    }
}

impl Drop for ImapConnector {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapConnector dropped without explicit disconnect");
        }
    }
}

/// Keeps the `cap` most recent UIDs. UIDs are assigned in ascending order
/// of arrival, so sorting descending is enough.
fn cap_most_recent(mut uids: Vec<u32>, cap: usize) -> Vec<u32> {
    uids.sort_unstable_by(|a, b| b.cmp(a));
    if uids.len() > cap {
        warn!(
            "Search matched {} messages, keeping the {} most recent",
            uids.len(),
            cap
        );
        uids.truncate(cap);
    }
    uids
}

/// Walks a BODYSTRUCTURE looking for at least one part that could be a
/// résumé document. Text/plain only counts when it is a real attachment,
/// otherwise every message body would pass.
fn structure_has_candidate(structure: &BodyStructure<'_>) -> bool {
    match structure {
        BodyStructure::Basic { common, .. } => {
            let mime = format!("{}/{}", common.ty.ty, common.ty.subtype);
            matches!(
                FormatTag::from_mime(&mime),
                Some(FormatTag::Pdf) | Some(FormatTag::Docx) | Some(FormatTag::Doc)
            )
        }
        BodyStructure::Text { common, .. } => {
            let is_plain = common.ty.subtype.eq_ignore_ascii_case("plain");
            let is_attachment = common
                .disposition
                .as_ref()
                .map(|d| d.ty.eq_ignore_ascii_case("attachment"))
                .unwrap_or(false);
            is_plain && is_attachment
        }
        BodyStructure::Message { body, .. } => structure_has_candidate(body),
        BodyStructure::Multipart { bodies, .. } => bodies.iter().any(structure_has_candidate),
    }
}
