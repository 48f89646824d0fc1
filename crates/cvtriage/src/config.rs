//! Runtime configuration.
//!
//! Loaded once at process start from a JSON file and injected into the
//! components that need it. Credentials are never stored in the config
//! itself; they are resolved from environment variables at connect time.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Scoring thresholds. The defaults come from the tuned production values;
/// they are data, not derived constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// Minimum correspondence score a résumé needs against a specific job
    /// before full scoring runs. Below this the candidate is rejected
    /// outright.
    pub gate_threshold: f64,
    /// Message-level score at or above which a candidate is Approved.
    pub approve_threshold: f64,
    /// Message-level score at or above which a candidate goes to Review.
    pub review_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            gate_threshold: 2.0,
            approve_threshold: 3.0,
            review_threshold: 1.5,
        }
    }
}

/// Pipeline pacing and limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Message references processed per batch.
    pub batch_size: usize,
    /// Pause between batches, in milliseconds. A courtesy to the provider,
    /// not a correctness requirement.
    pub batch_pause_ms: u64,
    /// Cap on candidate references when searching "all messages".
    pub search_cap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_pause_ms: 200,
            search_cap: 1000,
        }
    }
}

/// Which provider kind a mailbox account uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "provider")]
pub enum ProviderConfig {
    Imap(ImapConfig),
    Graph(GraphConfig),
}

/// IMAP account settings. The password is read from `password_env_var` at
/// connect time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImapConfig {
    pub host: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    pub username: String,
    pub password_env_var: String,
    #[serde(default = "default_folder")]
    pub folder: String,
}

fn default_imap_port() -> u16 {
    993
}

fn default_folder() -> String {
    "INBOX".to_string()
}

/// Microsoft Graph application settings (client-credentials flow). The
/// client secret is read from `client_secret_env_var` at connect time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret_env_var: String,
    /// Mailbox owner whose messages are queried.
    pub mailbox: String,
    /// When true, only unread messages are listed.
    #[serde(default)]
    pub unread_only: bool,
}

/// One configured mailbox account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    pub name: String,
    #[serde(flatten)]
    pub provider: ProviderConfig,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// SQLite database path. Defaults to `~/.cvtriage/cvtriage.db`.
    #[serde(default)]
    pub database_path: Option<std::path::PathBuf>,
    /// Base directory for the archival collaborator.
    #[serde(default)]
    pub archive_dir: Option<std::path::PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for account in &self.accounts {
            if account.name.is_empty() {
                return Err(ConfigError::Validation {
                    message: "account name must not be empty".to_string(),
                });
            }
            if let ProviderConfig::Imap(imap) = &account.provider {
                if imap.host.is_empty() {
                    return Err(ConfigError::Validation {
                        message: format!("account '{}': IMAP host must not be empty", account.name),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            scoring: ScoringConfig::default(),
            pipeline: PipelineConfig::default(),
            database_path: None,
            archive_dir: None,
        }
    }
}

/// Returns the canonical database path: `~/.cvtriage/cvtriage.db`.
pub fn default_database_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|h| h.join(".cvtriage").join("cvtriage.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scoring_defaults() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.gate_threshold, 2.0);
        assert_eq!(scoring.approve_threshold, 3.0);
        assert_eq!(scoring.review_threshold, 1.5);
    }

    #[test]
    fn test_pipeline_defaults() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.batch_size, 100);
        assert_eq!(pipeline.batch_pause_ms, 200);
        assert_eq!(pipeline.search_cap, 1000);
    }

    #[test]
    fn test_load_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.accounts.is_empty());
        assert_eq!(config.scoring.approve_threshold, 3.0);
    }

    #[test]
    fn test_load_imap_account() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "accounts": [{{
                    "name": "recruiting",
                    "provider": "imap",
                    "host": "imap.example.com",
                    "username": "hr@example.com",
                    "passwordEnvVar": "RECRUITING_PASSWORD"
                }}],
                "scoring": {{ "gateThreshold": 2.5 }}
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.scoring.gate_threshold, 2.5);
        match &config.accounts[0].provider {
            ProviderConfig::Imap(imap) => {
                assert_eq!(imap.port, 993);
                assert_eq!(imap.folder, "INBOX");
            }
            _ => panic!("expected IMAP provider"),
        }
    }

    #[test]
    fn test_load_graph_account() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "accounts": [{{
                    "name": "shared",
                    "provider": "graph",
                    "tenantId": "tenant",
                    "clientId": "client",
                    "clientSecretEnvVar": "GRAPH_SECRET",
                    "mailbox": "recruiting@example.com"
                }}]
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        match &config.accounts[0].provider {
            ProviderConfig::Graph(graph) => {
                assert_eq!(graph.mailbox, "recruiting@example.com");
                assert!(!graph.unread_only);
            }
            _ => panic!("expected Graph provider"),
        }
    }

    #[test]
    fn test_empty_account_name_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "accounts": [{{
                    "name": "",
                    "provider": "imap",
                    "host": "imap.example.com",
                    "username": "hr@example.com",
                    "passwordEnvVar": "X"
                }}]
            }}"#
        )
        .unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Validation { .. })
        ));
    }
}
