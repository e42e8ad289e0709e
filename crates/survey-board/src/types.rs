use crate::config::Config;
use crate::store::{CredentialError, MemoryWorkbook, ServiceAccount, SqliteWorkbook, Workbook};
use std::sync::Arc;
use tracing::info;

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: Config,
    pub workbook: Workbook,
}

impl AppState {
    /// Opens the workbook the credentials grant access to.
    ///
    /// Startup never fails here: missing credentials or an unreachable
    /// workbook leave the store inert and the reason is kept for display.
    pub fn new(config: Config, credentials: Result<ServiceAccount, CredentialError>) -> Arc<Self> {
        let workbook = open_workbook(&config, credentials);
        Self::with_workbook(config, workbook)
    }

    pub fn with_workbook(config: Config, workbook: Workbook) -> Arc<Self> {
        Arc::new(Self { config, workbook })
    }
}

fn open_workbook(config: &Config, credentials: Result<ServiceAccount, CredentialError>) -> Workbook {
    let account = match credentials {
        Ok(account) => account,
        Err(e) => return Workbook::inert(format!("Workbook credentials unavailable: {}", e)),
    };

    info!(
        client_email = %account.client_email,
        key = %account.fingerprint(),
        workbook = account.workbook.as_deref().unwrap_or("default"),
        "Opening workbook"
    );

    let opened = if config.in_memory {
        Ok(Workbook::new(Arc::new(MemoryWorkbook::new())))
    } else {
        SqliteWorkbook::open(&config.db_path).map(|db| Workbook::new(Arc::new(db)))
    };

    match opened {
        Ok(Ok(workbook)) => workbook,
        Ok(Err(e)) | Err(e) => Workbook::inert(format!("Failed to open workbook: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_leave_store_inert() {
        let state = AppState::new(Config::default(), Err(CredentialError::Missing));

        assert!(!state.workbook.is_available());
        assert!(state
            .workbook
            .unavailable_reason()
            .unwrap()
            .contains("No credentials found"));
    }

    #[test]
    fn test_valid_credentials_open_store() {
        let account = ServiceAccount::from_json(r#"{"client_email": "a@b", "private_key": "k"}"#)
            .unwrap();
        let config = Config {
            in_memory: true,
            ..Config::default()
        };

        let state = AppState::new(config, Ok(account));
        assert!(state.workbook.is_available());
        assert_eq!(state.workbook.unavailable_reason(), None);
    }

    #[test]
    fn test_unopenable_database_leaves_store_inert() {
        let account = ServiceAccount::from_json(r#"{"client_email": "a@b", "private_key": "k"}"#)
            .unwrap();
        let config = Config {
            db_path: "/nonexistent/dir/board.sqlite3".to_string(),
            ..Config::default()
        };

        let state = AppState::new(config, Ok(account));
        assert!(!state.workbook.is_available());
    }
}
