//! Screening result repository.
//!
//! One row per analyzed message, keyed on (sender, subject, message date).
//! Inserts use `INSERT OR IGNORE` against the unique identity index so a
//! rescan of the same mailbox never duplicates or overwrites a result.

use rusqlite::{params, OptionalExtension};

use crate::scoring::{ClassificationResult, Status};

use super::{Database, StoreError};

/// A stored screening result row.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub id: i64,
    pub sender_email: String,
    pub subject: String,
    pub message_date: String,
    pub file_names: String,
    pub final_score: f64,
    pub status: Status,
    pub job_profile_id: Option<i64>,
    pub analyzed_at: String,
}

/// Aggregate counts over all stored results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreeningStats {
    pub total: u64,
    pub approved: u64,
    pub review: u64,
    pub rejected: u64,
    pub errored: u64,
    pub average_score: f64,
}

/// Inserts a result if its identity key is not already present and returns
/// its row id. On a duplicate identity the stored row is left untouched and
/// its existing id comes back unchanged. The result row and its attachment
/// rows are written in one transaction.
pub fn upsert(db: &Database, result: &ClassificationResult) -> Result<i64, StoreError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO results
             (sender_email, subject, message_date, file_names, final_score, status, job_profile_id, analyzed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                result.sender_email,
                result.subject,
                result.message_date,
                result.file_names,
                result.final_score,
                result.status.as_str(),
                result.job_profile_id,
                result.analyzed_at.to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            let existing: i64 = tx.query_row(
                "SELECT id FROM results
                 WHERE sender_email = ?1 AND subject = ?2 AND message_date = ?3",
                params![result.sender_email, result.subject, result.message_date],
                |r| r.get(0),
            )?;
            tx.commit()?;
            return Ok(existing);
        }

        let result_id = tx.last_insert_rowid();
        for attachment in &result.attachments {
            let breakdown = serde_json::to_string(&attachment.breakdown)?;
            tx.execute(
                "INSERT INTO attachment_results
                 (result_id, file_name, text_length, extracted, score, breakdown)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    result_id,
                    attachment.file_name,
                    attachment.text_length as i64,
                    attachment.extracted as i64,
                    attachment.score,
                    breakdown,
                ],
            )?;
        }

        tx.commit()?;
        Ok(result_id)
    })
}

/// Checks whether a result with this identity key is already stored.
pub fn exists(
    db: &Database,
    sender_email: &str,
    subject: &str,
    message_date: &str,
) -> Result<bool, StoreError> {
    db.with_conn(|conn| {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM results
                 WHERE sender_email = ?1 AND subject = ?2 AND message_date = ?3",
                params![sender_email, subject, message_date],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    })
}

/// Records an approval, deduplicated on (profile, sender, file names).
/// Returns `true` when this approval is new. Only approvals made against a
/// job profile are recorded, so the profile id is mandatory here.
pub fn record_approval(
    db: &Database,
    job_profile_id: i64,
    sender_email: &str,
    file_names: &str,
) -> Result<bool, StoreError> {
    db.with_conn(|conn| {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO approved_candidates
             (job_profile_id, sender_email, file_names, approved_at)
             VALUES (?1, ?2, ?3, datetime('now'))",
            params![job_profile_id, sender_email, file_names],
        )?;
        Ok(inserted > 0)
    })
}

/// Lists results with a given status, newest analysis first.
pub fn list_by_status(db: &Database, status: Status) -> Result<Vec<ResultRow>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, sender_email, subject, message_date, file_names,
                    final_score, status, job_profile_id, analyzed_at
             FROM results WHERE status = ?1 ORDER BY analyzed_at DESC",
        )?;
        let mut rows = stmt.query(params![status.as_str()])?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(row_to_result(row)?);
        }
        Ok(results)
    })
}

/// Aggregates stored results. The average score skips errored rows, which
/// carry a fixed zero rather than a real score.
pub fn stats(db: &Database) -> Result<ScreeningStats, StoreError> {
    db.with_conn(|conn| {
        let count = |status: &str| -> Result<u64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM results WHERE status = ?1",
                params![status],
                |r| r.get(0),
            )
        };

        let total: u64 = conn.query_row("SELECT COUNT(*) FROM results", [], |r| r.get(0))?;
        let average_score: f64 = conn.query_row(
            "SELECT COALESCE(AVG(final_score), 0.0) FROM results WHERE status != 'Error'",
            [],
            |r| r.get(0),
        )?;

        Ok(ScreeningStats {
            total,
            approved: count("Approved")?,
            review: count("Review")?,
            rejected: count("Rejected")?,
            errored: count("Error")?,
            average_score,
        })
    })
}

fn row_to_result(row: &rusqlite::Row<'_>) -> Result<ResultRow, StoreError> {
    let status_raw: String = row.get(6)?;
    let status = Status::from_str(&status_raw).unwrap_or(Status::Error);

    Ok(ResultRow {
        id: row.get(0)?,
        sender_email: row.get(1)?,
        subject: row.get(2)?,
        message_date: row.get(3)?,
        file_names: row.get(4)?,
        final_score: row.get(5)?,
        status,
        job_profile_id: row.get(7)?,
        analyzed_at: row.get(8)?,
    })
}
