//! Job profile repository.
//!
//! A job profile is the set of keywords a hiring round screens against.
//! At most one profile is active at a time; saving a new one deactivates
//! the rest.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::{Database, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProfile {
    pub id: i64,
    pub name: String,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

/// Saves a new profile, deactivating any prior active profile with the
/// same name.
pub fn save(db: &Database, name: &str, keywords: &[String]) -> Result<JobProfile, StoreError> {
    let keywords_json = serde_json::to_string(keywords)?;
    let created_at = Utc::now();

    db.with_conn(|conn| {
        conn.execute(
            "UPDATE job_profiles SET active = 0 WHERE active = 1 AND name = ?1",
            params![name],
        )?;
        conn.execute(
            "INSERT INTO job_profiles (name, keywords, created_at, active)
             VALUES (?1, ?2, ?3, 1)",
            params![name, keywords_json, created_at.to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();

        Ok(JobProfile {
            id,
            name: name.to_string(),
            keywords: keywords.to_vec(),
            created_at,
            active: true,
        })
    })
}

/// Returns the currently active profile, if any.
pub fn find_active(db: &Database) -> Result<Option<JobProfile>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, keywords, created_at, active FROM job_profiles
             WHERE active = 1 ORDER BY created_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_profile(row)?)),
            None => Ok(None),
        }
    })
}

/// Lists all profiles, newest first.
pub fn list(db: &Database) -> Result<Vec<JobProfile>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, keywords, created_at, active FROM job_profiles
             ORDER BY created_at DESC",
        )?;
        let mut rows = stmt.query([])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(row_to_profile(row)?);
        }
        Ok(profiles)
    })
}

fn row_to_profile(row: &rusqlite::Row<'_>) -> Result<JobProfile, StoreError> {
    let keywords_json: String = row.get(2)?;
    let created_at_raw: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(JobProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        keywords: serde_json::from_str(&keywords_json)?,
        created_at,
        active: row.get::<_, i64>(4)? != 0,
    })
}
