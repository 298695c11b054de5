use thiserror::Error;

use crate::config::SettingsError;
use crate::core::MatchError;
use crate::services::{HistoryError, NotifyError, RosterError};

/// Every way a matching run can fail
///
/// Nothing is retried; the binary logs the error and exits.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Matching(#[from] MatchError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("Notification failed: {0}")]
    Notification(#[from] NotifyError),

    #[error("Failed to render run report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
