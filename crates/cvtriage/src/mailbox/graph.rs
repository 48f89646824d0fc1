//! Microsoft Graph mailbox connector.
//!
//! Authenticates with the client-credentials flow and reads a shared
//! mailbox through the Graph REST API. Like the IMAP connector it never
//! mutates the mailbox.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::GraphConfig;

use super::error::{MailboxError, Result};
use super::{Attachment, FolderCounts, MailMessage, MailboxConnector, MessageRef, SearchWindow};

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const PAGE_SIZE: usize = 100;

struct AccessToken {
    secret: SecretString,
    expires_at: DateTime<Utc>,
}

pub struct GraphConnector {
    account: String,
    config: GraphConfig,
    search_cap: usize,
    http: reqwest::Client,
    token: Option<AccessToken>,
    /// hasAttachments flags captured during search, so the pre-filter
    /// needs no extra round trip.
    attachment_flags: HashMap<String, bool>,
}

impl GraphConnector {
    pub fn new(account: &str, config: GraphConfig, search_cap: usize) -> Self {
        Self {
            account: account.to_string(),
            config,
            search_cap,
            http: reqwest::Client::new(),
            token: None,
            attachment_flags: HashMap::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.token.is_some()
    }

    fn client_secret(&self) -> Result<SecretString> {
        std::env::var(&self.config.client_secret_env_var)
            .map(|v| SecretString::from(v.trim().to_string()))
            .map_err(|_| {
                MailboxError::CredentialsNotFound(self.config.client_secret_env_var.clone())
            })
    }

    fn mailbox_url(&self, suffix: &str) -> String {
        format!("{}/users/{}{}", GRAPH_BASE, self.config.mailbox, suffix)
    }

    /// Acquires a fresh token when none is held or the current one is
    /// about to expire.
    async fn ensure_token(&mut self) -> Result<()> {
        if let Some(token) = &self.token {
            if token.expires_at > Utc::now() {
                return Ok(());
            }
            debug!("Graph access token expired, requesting a new one");
        }

        let secret = self.client_secret()?;
        let url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.config.tenant_id
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", secret.expose_secret()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailboxError::AuthFailed {
                account: self.account.clone(),
                reason: format!("token request failed ({}): {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await?;
        // Renew a minute early to avoid using a token mid-expiry.
        let expires_at = Utc::now() + chrono::Duration::seconds(token.expires_in as i64 - 60);

        info!("Acquired Graph access token for {}", self.config.mailbox);

        self.token = Some(AccessToken {
            secret: SecretString::from(token.access_token),
            expires_at,
        });
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&mut self, url: &str) -> Result<T> {
        self.ensure_token().await?;
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| MailboxError::ConnectionFailed("Not connected".to_string()))?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 404 {
                return Err(MailboxError::MessageNotFound(url.to_string()));
            }
            return Err(MailboxError::GraphApi {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailboxConnector for GraphConnector {
    async fn connect(&mut self) -> Result<()> {
        self.ensure_token().await
    }

    async fn search(&mut self, window: &SearchWindow) -> Result<Vec<MessageRef>> {
        let mut filters = Vec::new();
        if let Some(since) = window.since {
            filters.push(format!(
                "receivedDateTime ge {}",
                since.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        if self.config.unread_only {
            filters.push("isRead eq false".to_string());
        }

        let mut url = format!(
            "{}?$select=id,hasAttachments&$orderby=receivedDateTime desc&$top={}",
            self.mailbox_url("/mailFolders/inbox/messages"),
            PAGE_SIZE
        );
        if !filters.is_empty() {
            url.push_str("&$filter=");
            url.push_str(&filters.join(" and "));
        }

        self.attachment_flags.clear();
        let mut refs = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next {
            let page: MessageListResponse = self.get_json(&url).await?;

            for summary in page.value {
                self.attachment_flags
                    .insert(summary.id.clone(), summary.has_attachments);
                refs.push(MessageRef { id: summary.id });
                if refs.len() >= self.search_cap {
                    debug!("Search capped at {} messages", self.search_cap);
                    return Ok(refs);
                }
            }

            next = page.next_link;
        }

        debug!("Found {} messages in Graph mailbox", refs.len());
        Ok(refs)
    }

    async fn has_candidate_attachments(&mut self, message: &MessageRef) -> Result<bool> {
        if let Some(&flag) = self.attachment_flags.get(&message.id) {
            return Ok(flag);
        }

        let url = format!(
            "{}?$select=hasAttachments",
            self.mailbox_url(&format!("/messages/{}", message.id))
        );
        let summary: MessageSummary = self.get_json(&url).await?;
        Ok(summary.has_attachments)
    }

    async fn fetch(&mut self, message: &MessageRef) -> Result<MailMessage> {
        let detail_url = format!(
            "{}?$select=subject,from,receivedDateTime",
            self.mailbox_url(&format!("/messages/{}", message.id))
        );
        let detail: MessageDetail = self.get_json(&detail_url).await?;

        let attachments_url = format!(
            "{}?$select=name,contentType,contentBytes",
            self.mailbox_url(&format!("/messages/{}/attachments", message.id))
        );
        let listed: AttachmentListResponse = self.get_json(&attachments_url).await?;

        let mut attachments = Vec::new();
        for item in listed.value {
            let (Some(name), Some(content)) = (item.name, item.content_bytes) else {
                // Item attachments (contacts, nested messages) have no bytes.
                continue;
            };

            let data = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, content)
                .map_err(|e| {
                    MailboxError::ParseError(format!("Invalid attachment encoding: {}", e))
                })?;

            attachments.push(Attachment {
                file_name: name,
                mime_type: item
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                data,
            });
        }

        Ok(MailMessage {
            sender_email: detail
                .from
                .and_then(|r| r.email_address)
                .and_then(|a| a.address)
                .unwrap_or_default(),
            subject: detail.subject.unwrap_or_default(),
            message_date: detail.received_date_time.unwrap_or_default(),
            attachments,
        })
    }

    async fn folder_counts(&mut self) -> Result<Option<FolderCounts>> {
        let url = format!(
            "{}?$select=unreadItemCount,totalItemCount",
            self.mailbox_url("/mailFolders/inbox")
        );
        let info: FolderInfoResponse = self.get_json(&url).await?;
        Ok(Some(FolderCounts {
            unread: info.unread_item_count,
            total: info.total_item_count,
        }))
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Tokens are bearer-only; dropping ours is all there is to do.
        self.token = None;
        self.attachment_flags.clear();
        Ok(())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct MessageListResponse {
    value: Vec<MessageSummary>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageSummary {
    id: String,
    #[serde(default)]
    has_attachments: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    subject: Option<String>,
    from: Option<Recipient>,
    received_date_time: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    email_address: Option<EmailAddress>,
}

#[derive(Deserialize)]
struct EmailAddress {
    address: Option<String>,
}

#[derive(Deserialize)]
struct AttachmentListResponse {
    value: Vec<GraphAttachment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphAttachment {
    name: Option<String>,
    content_type: Option<String>,
    content_bytes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderInfoResponse {
    unread_item_count: u64,
    total_item_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GraphConfig {
        GraphConfig {
            tenant_id: "tenant-id".to_string(),
            client_id: "client-id".to_string(),
            client_secret_env_var: "CVTRIAGE_TEST_UNSET_SECRET".to_string(),
            mailbox: "vagas@empresa.com".to_string(),
            unread_only: true,
        }
    }

    #[test]
    fn test_connector_starts_disconnected() {
        let connector = GraphConnector::new("hiring", test_config(), 1000);
        assert!(!connector.is_connected());
    }

    #[test]
    fn test_mailbox_url() {
        let connector = GraphConnector::new("hiring", test_config(), 1000);
        assert_eq!(
            connector.mailbox_url("/mailFolders/inbox"),
            "https://graph.microsoft.com/v1.0/users/vagas@empresa.com/mailFolders/inbox"
        );
    }

    #[tokio::test]
    async fn test_missing_client_secret() {
        let mut connector = GraphConnector::new("hiring", test_config(), 1000);
        let result = connector.connect().await;
        assert!(matches!(
            result,
            Err(MailboxError::CredentialsNotFound(_))
        ));
    }

    #[test]
    fn test_message_list_deserialization() {
        let json = r#"{
            "value": [
                {"id": "AAA", "hasAttachments": true},
                {"id": "BBB", "hasAttachments": false}
            ],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/next"
        }"#;
        let page: MessageListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.value.len(), 2);
        assert!(page.value[0].has_attachments);
        assert!(page.next_link.is_some());
    }

    #[test]
    fn test_folder_info_deserialization() {
        let json = r#"{"unreadItemCount": 12, "totalItemCount": 345}"#;
        let info: FolderInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(info.unread_item_count, 12);
        assert_eq!(info.total_item_count, 345);
    }
}
