//! MIME parsing and attachment extraction.

use log::debug;
use mail_parser::{Message, MessageParser, MimeHeaders, PartType};

use super::error::{MailboxError, Result};
use super::{Attachment, MailMessage};

/// Parses raw RFC 822 messages into the envelope fields and attachments
/// the pipeline works with.
pub struct MessageEnvelopeParser;

impl MessageEnvelopeParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a raw message into a `MailMessage`.
    pub fn parse(&self, raw: &[u8]) -> Result<MailMessage> {
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| MailboxError::ParseError("Failed to parse message".to_string()))?;

        let sender_email = message
            .from()
            .and_then(|addr| addr.first())
            .and_then(|a| a.address())
            .unwrap_or_default()
            .to_string();

        let subject = message.subject().unwrap_or_default().to_string();
        let message_date = message.date().map(|d| d.to_rfc3339()).unwrap_or_default();

        let attachments = self.extract_attachments(&message);

        debug!(
            "Parsed message from={} subject={:?} attachments={}",
            sender_email,
            subject,
            attachments.len()
        );

        Ok(MailMessage {
            sender_email,
            subject,
            message_date,
            attachments,
        })
    }

    fn extract_attachments(&self, message: &Message) -> Vec<Attachment> {
        let mut attachments = Vec::new();

        for part in message.parts.iter() {
            if !is_attachment(part) {
                continue;
            }

            let data = match &part.body {
                PartType::Binary(data) | PartType::InlineBinary(data) => data.to_vec(),
                PartType::Text(text) => text.as_bytes().to_vec(),
                _ => continue,
            };

            let mime_type = part
                .content_type()
                .map(|ct| {
                    if let Some(subtype) = ct.subtype() {
                        format!("{}/{}", ct.ctype(), subtype)
                    } else {
                        ct.ctype().to_string()
                    }
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let raw_name = part
                .attachment_name()
                .or_else(|| part.content_type().and_then(|ct| ct.attribute("name")))
                .unwrap_or_default();

            let file_name = sanitize_file_name(raw_name);
            if file_name.is_empty() {
                continue;
            }

            attachments.push(Attachment {
                file_name,
                mime_type,
                data,
            });
        }

        attachments
    }
}

impl Default for MessageEnvelopeParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks if a message part is an attachment.
fn is_attachment(part: &mail_parser::MessagePart) -> bool {
    if let Some(disposition) = part.content_disposition() {
        if disposition.ctype() == "attachment" {
            return true;
        }
    }

    // Inline parts that still carry a filename count as attachments.
    part.attachment_name().is_some()
}

/// Strips path components and control characters from a candidate's
/// attachment file name.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    cleaned.trim().trim_matches('.').to_string()
}
