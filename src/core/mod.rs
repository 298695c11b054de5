// Core algorithm exports
pub mod filters;
pub mod matcher;

pub use filters::{join_key, partition_by_department, MatchError};
pub use matcher::{candidate_pairs, confirm_unique, unmatched, MatchResult, Matcher};
