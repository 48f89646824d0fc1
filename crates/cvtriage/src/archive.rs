//! Attachment archive.
//!
//! Processed attachments can be copied into a folder tree on disk,
//! routed by the final status, so reviewers can open the résumés of
//! approved candidates without touching the mailbox.

use std::path::PathBuf;

use log::debug;

use crate::error::ArchiveError;
use crate::scoring::Status;

pub trait ArchiveSink: Send + Sync {
    /// Stores one attachment and returns its final path.
    fn store(
        &self,
        status: Status,
        sender_email: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<PathBuf, ArchiveError>;
}

/// Archives attachments under `root/<status>/<sender>/<file>`.
pub struct FilesystemArchive {
    root: PathBuf,
}

impl FilesystemArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn status_dir(status: Status) -> &'static str {
        match status {
            Status::Approved => "approved",
            Status::Review => "review",
            Status::Rejected => "rejected",
            Status::Error => "error",
        }
    }
}

impl ArchiveSink for FilesystemArchive {
    fn store(
        &self,
        status: Status,
        sender_email: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<PathBuf, ArchiveError> {
        let dir = self
            .root
            .join(Self::status_dir(status))
            .join(safe_component(sender_email));

        std::fs::create_dir_all(&dir).map_err(|e| ArchiveError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;

        let mut path = dir.join(safe_component(file_name));
        if path.exists() {
            // Same sender, same file name: keep both copies apart.
            path = dir.join(format!(
                "{}-{}",
                uuid::Uuid::new_v4().simple(),
                safe_component(file_name)
            ));
        }

        std::fs::write(&path, data).map_err(|e| ArchiveError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        debug!("Archived '{}' to {}", file_name, path.display());
        Ok(path)
    }
}

/// Makes a string safe to use as a single path component.
fn safe_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}
