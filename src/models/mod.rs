// Model exports
pub mod domain;
pub mod report;

pub use domain::{
    CandidatePair, ConfirmedMatch, DepartmentPolicy, MatchHistory, MatchPass, MatchState,
    PairKey, PairingMode, Person, PAIR_SEPARATOR,
};
pub use report::{PassSummary, RunReport};
