use std::collections::HashMap;

use crate::core::filters::{join_key, partition_by_department, MatchError};
use crate::models::{
    CandidatePair, ConfirmedMatch, DepartmentPolicy, MatchHistory, MatchPass, MatchState,
    PairingMode, PassSummary, Person,
};

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub state: MatchState,
    pub passes: Vec<PassSummary>,
}

impl MatchResult {
    pub fn matches(&self) -> &[ConfirmedMatch] {
        self.state.confirmed()
    }
}

/// Main matching orchestrator - runs passes of progressively looser criteria
///
/// # Pass Stages
/// 1. Department partition (group A = primary department, group B = the rest)
/// 2. Equi-join on the pass criteria (A x B, or B x B for same-department passes)
/// 3. First-come-first-served confirmation against session and history exclusions
///
/// State is never held on the matcher; each pass takes the session state
/// and hands back the updated one.
#[derive(Debug, Clone)]
pub struct Matcher {
    policy: DepartmentPolicy,
}

impl Matcher {
    pub fn new(policy: DepartmentPolicy) -> Self {
        Self { policy }
    }

    pub fn with_default_policy() -> Self {
        Self {
            policy: DepartmentPolicy::default(),
        }
    }

    /// Run one pass over the residual population
    pub fn run_pass(
        &self,
        roster: &[Person],
        pass: &MatchPass,
        state: MatchState,
        history: &MatchHistory,
    ) -> Result<(MatchState, PassSummary), MatchError> {
        let (group_a, group_b) = partition_by_department(roster, &self.policy);

        let candidates = match pass.mode {
            PairingMode::CrossDepartment => candidate_pairs(&group_a, &group_b, &pass.criteria)?,
            PairingMode::SameDepartment => candidate_pairs(&group_b, &group_b, &pass.criteria)?,
        };

        let before = state.confirmed().len();
        let state = confirm_unique(&candidates, state, history);
        let confirmed = state.confirmed().len() - before;

        tracing::info!(
            "Pass {:?} ({}): {} candidates, {} confirmed, {} people matched so far",
            pass.criteria,
            pass.mode,
            candidates.len(),
            confirmed,
            state.matched_count()
        );

        let summary = PassSummary {
            criteria: pass.criteria.clone(),
            mode: pass.mode,
            candidates: candidates.len(),
            confirmed,
        };

        Ok((state, summary))
    }

    /// Run every pass in order, starting from an empty session
    ///
    /// Earlier passes win: a person claimed by an exact match is never
    /// offered to a fallback pass.
    pub fn run_passes(
        &self,
        roster: &[Person],
        passes: &[MatchPass],
        history: &MatchHistory,
    ) -> Result<MatchResult, MatchError> {
        let mut state = MatchState::new();
        let mut summaries = Vec::with_capacity(passes.len());

        for pass in passes {
            let (next, summary) = self.run_pass(roster, pass, state, history)?;
            state = next;
            summaries.push(summary);
        }

        Ok(MatchResult {
            state,
            passes: summaries,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_policy()
    }
}

/// Equi-join `group_a` against `group_b` on every criteria attribute
///
/// Emits pairs in join order: each left person in input order, paired with
/// each matching right person in input order. Self-pairs and mirrored
/// duplicates are kept; `confirm_unique` drops them.
pub fn candidate_pairs(
    group_a: &[&Person],
    group_b: &[&Person],
    criteria: &[String],
) -> Result<Vec<CandidatePair>, MatchError> {
    // Index the right side by its join key, preserving input order per key
    let mut index: HashMap<Vec<&str>, Vec<&str>> = HashMap::new();
    for person in group_b {
        if let Some(key) = join_key(person, criteria)? {
            index.entry(key).or_default().push(person.email.as_str());
        }
    }

    let mut candidates = Vec::new();
    for person in group_a {
        let Some(key) = join_key(person, criteria)? else {
            continue;
        };
        if let Some(partners) = index.get(&key) {
            for partner in partners {
                candidates.push(CandidatePair::new(person.email.as_str(), *partner));
            }
        }
    }

    Ok(candidates)
}

/// Confirm candidates first-come-first-served
///
/// A candidate is accepted iff neither person is claimed yet, the two
/// emails differ, and the pair (in either order) is not in `history`.
/// Accepted pairs claim both people immediately, so later candidates in
/// the same call already see them.
pub fn confirm_unique(
    candidates: &[CandidatePair],
    mut state: MatchState,
    history: &MatchHistory,
) -> MatchState {
    for candidate in candidates {
        if candidate.is_self_pair()
            || state.is_claimed(&candidate.left)
            || state.is_claimed(&candidate.right)
        {
            continue;
        }

        if history.contains(&candidate.left, &candidate.right) {
            tracing::debug!("Skipping {}: already matched in a previous run", candidate.key());
            continue;
        }

        let confirmed = ConfirmedMatch::new(candidate.left.as_str(), candidate.right.as_str());
        tracing::debug!("Confirmed match {}", confirmed.encode());
        state.confirm(confirmed);
    }

    state
}

/// Roster members nobody has claimed, in roster order
pub fn unmatched<'a>(roster: &'a [Person], state: &MatchState) -> Vec<&'a Person> {
    roster
        .iter()
        .filter(|person| !state.is_claimed(&person.email))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PairKey;

    fn create_person(email: &str, department: &str, method: &str, location: &str) -> Person {
        Person::new(email, department)
            .with_attribute("meeting_method", method)
            .with_attribute("office_location", location)
    }

    fn method_and_location() -> Vec<String> {
        vec!["meeting_method".to_string(), "office_location".to_string()]
    }

    fn three_person_roster() -> Vec<Person> {
        vec![
            create_person("a@x", "operations", "chat", "NYC"),
            create_person("b@x", "support", "chat", "NYC"),
            create_person("c@x", "support", "chat", "NYC"),
        ]
    }

    #[test]
    fn test_candidate_pairs_cross_department() {
        let roster = three_person_roster();
        let (ops, support) = partition_by_department(&roster, &DepartmentPolicy::new("operations"));

        let candidates = candidate_pairs(&ops, &support, &method_and_location()).unwrap();

        assert_eq!(
            candidates,
            vec![CandidatePair::new("a@x", "b@x"), CandidatePair::new("a@x", "c@x")]
        );
    }

    #[test]
    fn test_confirm_first_seen_wins() {
        let roster = three_person_roster();
        let (ops, support) = partition_by_department(&roster, &DepartmentPolicy::new("operations"));
        let candidates = candidate_pairs(&ops, &support, &method_and_location()).unwrap();

        let state = confirm_unique(&candidates, MatchState::new(), &MatchHistory::new());

        assert_eq!(state.confirmed(), &[ConfirmedMatch::new("a@x", "b@x")]);
        let left: Vec<&str> = unmatched(&roster, &state).iter().map(|p| p.email.as_str()).collect();
        assert_eq!(left, vec!["c@x"]);
    }

    #[test]
    fn test_self_join_includes_and_drops_self_pairs() {
        let roster = vec![
            create_person("b@x", "support", "chat", "NYC"),
            create_person("c@x", "support", "chat", "NYC"),
        ];
        let (_, support) = partition_by_department(&roster, &DepartmentPolicy::new("operations"));

        let candidates = candidate_pairs(&support, &support, &method_and_location()).unwrap();
        assert_eq!(candidates.len(), 4);
        assert!(candidates[0].is_self_pair());

        let state = confirm_unique(&candidates, MatchState::new(), &MatchHistory::new());
        assert_eq!(state.confirmed(), &[ConfirmedMatch::new("b@x", "c@x")]);
    }

    #[test]
    fn test_history_excludes_pair_in_either_order() {
        let candidates = vec![CandidatePair::new("a@x", "b@x")];

        for stored in ["a@x&b@x", "b@x&a@x"] {
            let history: MatchHistory = PairKey::parse(stored).into_iter().collect();
            let state = confirm_unique(&candidates, MatchState::new(), &history);
            assert!(state.confirmed().is_empty(), "history entry {} should exclude", stored);
        }
    }

    #[test]
    fn test_claimed_people_carry_across_calls() {
        let mut state = MatchState::new();
        state.confirm(ConfirmedMatch::new("a@x", "b@x"));

        let candidates = vec![CandidatePair::new("b@x", "c@x"), CandidatePair::new("c@x", "d@x")];
        let state = confirm_unique(&candidates, state, &MatchHistory::new());

        assert_eq!(
            state.confirmed(),
            &[ConfirmedMatch::new("a@x", "b@x"), ConfirmedMatch::new("c@x", "d@x")]
        );
    }

    #[test]
    fn test_empty_roster() {
        let roster: Vec<Person> = Vec::new();
        let matcher = Matcher::with_default_policy();

        let result = matcher
            .run_passes(&roster, &[MatchPass::cross(&["meeting_method"])], &MatchHistory::new())
            .unwrap();

        assert!(result.matches().is_empty());
        assert_eq!(result.passes[0].candidates, 0);
        assert!(unmatched(&roster, &result.state).is_empty());
    }

    #[test]
    fn test_earlier_pass_has_priority() {
        // a/b share method and location; a/c only share method
        let roster = vec![
            create_person("a@x", "operations", "chat", "NYC"),
            create_person("c@x", "support", "chat", "LDN"),
            create_person("b@x", "support", "chat", "NYC"),
        ];
        let matcher = Matcher::with_default_policy();
        let passes = vec![
            MatchPass::cross(&["meeting_method", "office_location"]),
            MatchPass::cross(&["meeting_method"]),
        ];

        let result = matcher.run_passes(&roster, &passes, &MatchHistory::new()).unwrap();

        assert_eq!(result.matches(), &[ConfirmedMatch::new("a@x", "b@x")]);
        assert_eq!(result.passes[0].confirmed, 1);
        assert_eq!(result.passes[1].confirmed, 0);
    }

    #[test]
    fn test_fallback_pass_matches_residual() {
        let roster = vec![
            create_person("a@x", "operations", "chat", "NYC"),
            create_person("b@x", "support", "chat", "LDN"),
        ];
        let matcher = Matcher::with_default_policy();
        let passes = vec![
            MatchPass::cross(&["meeting_method", "office_location"]),
            MatchPass::cross(&["meeting_method"]),
        ];

        let result = matcher.run_passes(&roster, &passes, &MatchHistory::new()).unwrap();

        assert_eq!(result.passes[0].confirmed, 0);
        assert_eq!(result.matches(), &[ConfirmedMatch::new("a@x", "b@x")]);
    }

    #[test]
    fn test_same_department_pass_ignores_primary_group() {
        let roster = vec![
            create_person("a@x", "operations", "chat", "NYC"),
            create_person("z@x", "operations", "chat", "NYC"),
        ];
        let matcher = Matcher::with_default_policy();

        let result = matcher
            .run_passes(&roster, &[MatchPass::same(&["meeting_method"])], &MatchHistory::new())
            .unwrap();

        assert!(result.matches().is_empty());
    }

    #[test]
    fn test_missing_criteria_attribute_fails_pass() {
        let roster = vec![
            create_person("a@x", "operations", "chat", "NYC"),
            create_person("b@x", "support", "chat", "NYC"),
        ];
        let matcher = Matcher::with_default_policy();

        let err = matcher
            .run_passes(&roster, &[MatchPass::cross(&["team_size"])], &MatchHistory::new())
            .unwrap_err();

        assert!(matches!(err, MatchError::MissingAttribute { attribute, .. } if attribute == "team_size"));
    }
}
