//! The scan runner drives one pass over a mailbox.

use std::time::Duration;

use tracing::{debug, info, info_span, warn};

use crate::archive::ArchiveSink;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extract::ExtractorRegistry;
use crate::mailbox::{MailMessage, MailboxConnector, SearchWindow};
use crate::scoring::{CandidateClassifier, ClassificationResult, ExtractedText, Status};
use crate::store::profile_repo::JobProfile;
use crate::store::{result_repo, Database};

use super::{CancelToken, RunReport};

pub struct ScanRunner {
    config: PipelineConfig,
    classifier: CandidateClassifier,
    extractors: ExtractorRegistry,
    db: Database,
    archive: Option<Box<dyn ArchiveSink>>,
}

impl ScanRunner {
    pub fn new(config: PipelineConfig, classifier: CandidateClassifier, db: Database) -> Self {
        Self {
            config,
            classifier,
            extractors: ExtractorRegistry::new(),
            db,
            archive: None,
        }
    }

    /// Attaches an archive sink that receives every processed attachment,
    /// routed by final status.
    pub fn with_archive(mut self, archive: Box<dyn ArchiveSink>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Runs one scan over the mailbox. The connection is always closed
    /// before this returns, whatever the outcome of the scan.
    pub async fn run(
        &self,
        connector: &mut dyn MailboxConnector,
        window: SearchWindow,
        profile: Option<&JobProfile>,
        cancel: &CancelToken,
    ) -> Result<RunReport> {
        connector.connect().await?;

        let outcome = self.run_connected(connector, window, profile, cancel).await;

        if let Err(e) = connector.disconnect().await {
            warn!("Failed to disconnect cleanly: {}", e);
        }

        outcome
    }

    async fn run_connected(
        &self,
        connector: &mut dyn MailboxConnector,
        window: SearchWindow,
        profile: Option<&JobProfile>,
        cancel: &CancelToken,
    ) -> Result<RunReport> {
        let _span = info_span!("scan").entered();

        if let Ok(Some(counts)) = connector.folder_counts().await {
            info!(
                "Folder has {} messages, {} unread",
                counts.total, counts.unread
            );
        }

        let refs = connector.search(&window).await?;
        info!("Scanning {} candidate messages", refs.len());

        let mut report = RunReport::default();
        let batch_size = self.config.batch_size.max(1);

        for (batch_index, batch) in refs.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                info!("Scan cancelled after {} batches", batch_index);
                report.cancelled = true;
                break;
            }

            if batch_index > 0 && self.config.batch_pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_pause_ms)).await;
            }

            for message_ref in batch {
                match connector.has_candidate_attachments(message_ref).await {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!("Message {} has no candidate attachments", message_ref.id);
                        report.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!("Pre-filter failed for {}: {}", message_ref.id, e);
                        report.errored += 1;
                        continue;
                    }
                }

                let message = match connector.fetch(message_ref).await {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Failed to fetch message {}: {}", message_ref.id, e);
                        report.errored += 1;
                        continue;
                    }
                };

                match self.process_message(&message, profile) {
                    Ok(Processed::Stored(result)) => {
                        self.archive_attachments(&message, &result);
                        report.processed += 1;
                    }
                    Ok(Processed::Skipped) => report.skipped += 1,
                    Err(e) => {
                        warn!("Failed to process message {}: {}", message_ref.id, e);
                        report.errored += 1;
                    }
                }
            }
        }

        info!(
            "Scan finished: {} processed, {} skipped, {} errored",
            report.processed, report.skipped, report.errored
        );
        Ok(report)
    }

    /// Classifies and stores one fetched message. Returns `Skipped` when
    /// the message has no supported attachments or was analyzed before.
    fn process_message(
        &self,
        message: &MailMessage,
        profile: Option<&JobProfile>,
    ) -> Result<Processed> {
        let supported: Vec<_> = message
            .attachments
            .iter()
            .filter(|a| ExtractorRegistry::accepts(&a.file_name))
            .collect();

        if supported.is_empty() {
            debug!("No supported attachments from {}", message.sender_email);
            return Ok(Processed::Skipped);
        }

        if result_repo::exists(
            &self.db,
            &message.sender_email,
            &message.subject,
            &message.message_date,
        )? {
            debug!("Message from {} already analyzed", message.sender_email);
            return Ok(Processed::Skipped);
        }

        let extracted: Vec<ExtractedText> = supported
            .iter()
            .map(|attachment| {
                let text = match self.extractors.extract(&attachment.file_name, &attachment.data)
                {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!("Extraction failed for '{}': {}", attachment.file_name, e);
                        None
                    }
                };
                ExtractedText {
                    file_name: attachment.file_name.clone(),
                    text,
                }
            })
            .collect();

        let result = self.classifier.classify(
            &message.sender_email,
            &message.subject,
            &message.message_date,
            &extracted,
            profile,
        );

        let result_id = result_repo::upsert(&self.db, &result)?;
        debug!(
            "Stored result {} for {} as {}",
            result_id, result.sender_email, result.status
        );

        // Approvals are only tracked per job profile; a profileless scan
        // still stores the result but records no approval.
        if result.status == Status::Approved {
            if let Some(profile_id) = result.job_profile_id {
                result_repo::record_approval(
                    &self.db,
                    profile_id,
                    &result.sender_email,
                    &result.file_names,
                )?;
            }
        }

        Ok(Processed::Stored(result))
    }

    fn archive_attachments(&self, message: &MailMessage, result: &ClassificationResult) {
        let Some(archive) = &self.archive else {
            return;
        };

        for attachment in &message.attachments {
            if !ExtractorRegistry::accepts(&attachment.file_name) {
                continue;
            }
            if let Err(e) = archive.store(
                result.status,
                &result.sender_email,
                &attachment.file_name,
                &attachment.data,
            ) {
                warn!("Failed to archive '{}': {}", attachment.file_name, e);
            }
        }
    }
}

enum Processed {
    Stored(ClassificationResult),
    Skipped,
}
