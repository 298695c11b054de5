use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use validator::Validate;

/// Separator between the two emails of an encoded pair (`a@x&b@x`)
pub const PAIR_SEPARATOR: char = '&';

/// A roster member
///
/// `email` identifies the person; every column other than `email` and
/// `department` lands in `attributes` and can be used as a match criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Person {
    #[validate(email)]
    pub email: String,
    pub department: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Person {
    pub fn new(email: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            department: department.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly used by tests and fixtures
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Two people whose criteria attributes are equal
///
/// Produced by the equi-join in join order; may be a self-pair or the
/// mirror of another candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePair {
    pub left: String,
    pub right: String,
}

impl CandidatePair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn is_self_pair(&self) -> bool {
        self.left == self.right
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.left, &self.right)
    }
}

/// Order-independent identity of a pair
///
/// Always holds the lexicographically smaller email first, so `a&b` and
/// `b&a` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Parse an encoded pair in either order. Returns `None` unless the
    /// line holds exactly two non-empty emails.
    pub fn parse(encoded: &str) -> Option<Self> {
        let (a, b) = encoded.trim().split_once(PAIR_SEPARATOR)?;
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() || b.contains(PAIR_SEPARATOR) {
            return None;
        }
        Some(Self::new(a, b))
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.first, PAIR_SEPARATOR, self.second)
    }
}

/// A pair accepted during a session, kept in join order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedMatch {
    pub email_a: String,
    pub email_b: String,
}

impl ConfirmedMatch {
    pub fn new(email_a: impl Into<String>, email_b: impl Into<String>) -> Self {
        Self {
            email_a: email_a.into(),
            email_b: email_b.into(),
        }
    }

    /// `email_a&email_b`
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.email_a, PAIR_SEPARATOR, self.email_b)
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.email_a, &self.email_b)
    }
}

/// Pairs confirmed in earlier sessions
#[derive(Debug, Clone, Default)]
pub struct MatchHistory {
    pairs: HashSet<PairKey>,
}

impl MatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PairKey) -> bool {
        self.pairs.insert(key)
    }

    /// True when the pair was recorded before, in either order
    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.pairs.contains(&PairKey::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<PairKey> for MatchHistory {
    fn from_iter<I: IntoIterator<Item = PairKey>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Whether a pass joins across the department split or inside the
/// secondary group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    CrossDepartment,
    SameDepartment,
}

impl fmt::Display for PairingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingMode::CrossDepartment => write!(f, "cross_department"),
            PairingMode::SameDepartment => write!(f, "same_department"),
        }
    }
}

/// One matching pass: a criteria set plus a department-mixing mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MatchPass {
    #[validate(length(min = 1))]
    pub criteria: Vec<String>,
    pub mode: PairingMode,
}

impl MatchPass {
    pub fn cross(criteria: &[&str]) -> Self {
        Self {
            criteria: criteria.iter().map(|c| c.to_string()).collect(),
            mode: PairingMode::CrossDepartment,
        }
    }

    pub fn same(criteria: &[&str]) -> Self {
        Self {
            criteria: criteria.iter().map(|c| c.to_string()).collect(),
            mode: PairingMode::SameDepartment,
        }
    }
}

/// How the roster is split before cross-department passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentPolicy {
    /// Exact (case-sensitive) department of group A
    pub primary: String,
    /// Departments admitted to group B; empty means everyone not in A
    pub secondary: Vec<String>,
}

impl DepartmentPolicy {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Vec::new(),
        }
    }

    pub fn is_primary(&self, person: &Person) -> bool {
        person.department == self.primary
    }

    pub fn is_secondary(&self, person: &Person) -> bool {
        !self.is_primary(person)
            && (self.secondary.is_empty() || self.secondary.contains(&person.department))
    }
}

impl Default for DepartmentPolicy {
    fn default() -> Self {
        Self::new("operations")
    }
}

/// Session state threaded through every pass
///
/// `matched` holds every email already claimed this session; `confirmed`
/// holds the accepted pairs in acceptance order.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    matched: HashSet<String>,
    confirmed: Vec<ConfirmedMatch>,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, email: &str) -> bool {
        self.matched.contains(email)
    }

    /// Record a match and claim both participants
    pub fn confirm(&mut self, confirmed: ConfirmedMatch) {
        self.matched.insert(confirmed.email_a.clone());
        self.matched.insert(confirmed.email_b.clone());
        self.confirmed.push(confirmed);
    }

    pub fn confirmed(&self) -> &[ConfirmedMatch] {
        &self.confirmed
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }
}
