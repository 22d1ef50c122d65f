//! Runtime configuration for embedding the core.
//!
//! # Responsibility
//! - Describe storage location, logging and grouping defaults in one value.
//! - Turn that value into a running session and, optionally, file logging.
//!
//! # Invariants
//! - `db_path = None` means a private in-memory database.
//! - `log_dir = None` leaves logging uninitialized.

use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::model::group::GroupingMode;
use crate::persist::gateway::SqliteGateway;
use crate::service::session::{GroupingSession, SessionError};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_TARGET: usize = 2;

/// Core configuration.
///
/// Missing fields fall back to [`CoreConfig::default`] when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<PathBuf>,
    pub default_mode: GroupingMode,
    pub default_target: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            default_mode: GroupingMode::default(),
            default_target: DEFAULT_TARGET,
        }
    }
}

impl CoreConfig {
    /// Starts file logging when `log_dir` is set.
    ///
    /// # Errors
    /// - Any `LoggingError` from an unknown level, a relative directory or a
    ///   conflicting earlier initialization.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        match &self.log_dir {
            Some(dir) => init_logging(&self.log_level, &dir.to_string_lossy()),
            None => Ok(()),
        }
    }

    /// Opens the configured store and starts a session in `default_mode`.
    pub fn open_session(&self) -> Result<GroupingSession, SessionError> {
        let gateway = match &self.db_path {
            Some(path) => SqliteGateway::open(path)?,
            None => SqliteGateway::open_in_memory()?,
        };
        let mut session = GroupingSession::open(gateway)?;
        session.set_mode(self.default_mode);
        Ok(session)
    }
}
