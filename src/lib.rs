//! Roster Match - pairs roster members on shared attributes
//!
//! Runs passes of progressively looser equality criteria over a roster,
//! confirming pairs first-come-first-served while skipping people already
//! matched this session and pairs recorded by earlier runs.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use crate::core::{candidate_pairs, confirm_unique, partition_by_department, unmatched, Matcher};
pub use error::{Error, Result};
pub use models::{ConfirmedMatch, MatchHistory, MatchPass, MatchState, Person, RunReport};
pub use session::run_session;
