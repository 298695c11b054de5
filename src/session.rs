use chrono::Utc;
use uuid::Uuid;

use crate::config::Settings;
use crate::core::{unmatched, Matcher};
use crate::error::Result;
use crate::models::RunReport;
use crate::services::{load_roster, notify_all, HistoryStore, Notifier};

/// Run one full matching session
///
/// Loads the roster and history, runs every configured pass, appends the
/// new matches to the history and then notifies both sides of each match.
/// History is written before any mail goes out, so a relay failure never
/// loses a recorded match.
pub fn run_session(settings: &Settings, notifier: &dyn Notifier) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!("Starting matching run {}", run_id);

    let roster = load_roster(&settings.roster, &settings.matching.required_attributes())?;

    let store = HistoryStore::new(&settings.history.path);
    let history = store.load()?;

    let matcher = Matcher::new(settings.matching.department_policy());
    let result = matcher.run_passes(&roster, &settings.matching.passes, &history)?;

    let left_over: Vec<String> = unmatched(&roster, &result.state)
        .into_iter()
        .map(|person| person.email.clone())
        .collect();
    if !left_over.is_empty() {
        tracing::warn!("{} people left unmatched: {}", left_over.len(), left_over.join(", "));
    }

    store.append(result.matches())?;

    let notifications_sent = notify_all(notifier, result.matches())?;

    tracing::info!(
        "Run {} complete: {} matches from {} people",
        run_id,
        result.matches().len(),
        roster.len()
    );

    Ok(RunReport {
        run_id,
        started_at,
        roster_size: roster.len(),
        history_size: history.len(),
        matches: result.matches().iter().map(|m| m.encode()).collect(),
        passes: result.passes,
        unmatched: left_over,
        notifications_sent,
    })
}
