//! Service-account credentials that gate access to the workbook.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Environment variable holding the credential JSON inline.
pub const CREDENTIALS_JSON_VAR: &str = "SURVEY_SERVICE_ACCOUNT_JSON";
/// Environment variable naming a file that holds the credential JSON.
pub const CREDENTIALS_FILE_VAR: &str = "SURVEY_SERVICE_ACCOUNT_FILE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("No credentials found, set SURVEY_SERVICE_ACCOUNT_JSON or SURVEY_SERVICE_ACCOUNT_FILE")]
    Missing,

    #[error("Failed to read credentials from {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Credentials are not valid JSON: {message}")]
    Invalid { message: String },

    #[error("Credentials are missing `{field}`")]
    Incomplete { field: &'static str },
}

/// A service-account style credential.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    private_key: String,
    /// Name of the workbook the account is allowed to open.
    #[serde(default)]
    pub workbook: Option<String>,
}

impl ServiceAccount {
    /// Loads credentials from the process environment.
    pub fn from_env() -> Result<Self, CredentialError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads credentials using `lookup` to read variables. Inline JSON wins
    /// over a file path.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CredentialError> {
        if let Some(json) = lookup(CREDENTIALS_JSON_VAR).filter(|s| !s.trim().is_empty()) {
            return Self::from_json(&json);
        }

        let path = lookup(CREDENTIALS_FILE_VAR)
            .filter(|s| !s.trim().is_empty())
            .ok_or(CredentialError::Missing)?;

        let json = std::fs::read_to_string(&path).map_err(|e| CredentialError::Unreadable {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let account: ServiceAccount =
            serde_json::from_str(json).map_err(|e| CredentialError::Invalid {
                message: e.to_string(),
            })?;

        if account.client_email.trim().is_empty() {
            return Err(CredentialError::Incomplete {
                field: "client_email",
            });
        }
        if account.private_key.trim().is_empty() {
            return Err(CredentialError::Incomplete {
                field: "private_key",
            });
        }

        Ok(account)
    }

    pub fn fingerprint(&self) -> KeyFingerprint {
        KeyFingerprint::of(&self.private_key)
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &self.fingerprint())
            .field("workbook", &self.workbook)
            .finish()
    }
}

/// Hash of a private key, safe to log.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct KeyFingerprint(String);

impl KeyFingerprint {
    pub fn of(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        Self(digest[..16].iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show first 8 chars
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}
