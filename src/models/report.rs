use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::PairingMode;

/// Outcome of a single pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub criteria: Vec<String>,
    pub mode: PairingMode,
    pub candidates: usize,
    pub confirmed: usize,
}

/// Summary of a matching session, printed as JSON by the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(rename = "runId")]
    pub run_id: Uuid,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "rosterSize")]
    pub roster_size: usize,
    #[serde(rename = "historySize")]
    pub history_size: usize,
    pub passes: Vec<PassSummary>,
    /// Encoded as `email_a&email_b`
    pub matches: Vec<String>,
    pub unmatched: Vec<String>,
    #[serde(rename = "notificationsSent")]
    pub notifications_sent: usize,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
