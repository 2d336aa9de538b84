//! Candidate and attempt bookkeeping per quantifier.
//!
//! The registry records, for every quantifier, which ground terms have been
//! offered as candidates for each variable position (with their insertion
//! age, phase and relevance), how often each has been part of an attempted
//! instantiation, and which attempted tuples succeeded. The enumeration
//! engine reads these records back as feature scalars; embedders can mine
//! them for training data.
//!
//! The registry is an explicit context object owned by the session, not a
//! process-wide singleton.

use rustc_hash::FxHashMap;

use crate::ast::TermId;

/// Bookkeeping scalars of one (variable, candidate term) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermCandidateInfo {
    /// Insertion order among the candidates of this variable, 0-based.
    pub age: usize,
    /// Registry phase at first sighting.
    pub phase: usize,
    /// Whether the term was in the relevant domain at first sighting.
    pub relevant: bool,
    /// Number of attempted instantiations this candidate took part in.
    pub tried: usize,
}

#[derive(Debug, Default)]
struct QuantifierEntry {
    infos: Vec<FxHashMap<TermId, TermCandidateInfo>>,
    phase: usize,
    successful: Vec<Vec<TermId>>,
    rejected: Vec<Vec<TermId>>,
}

/// Per-quantifier candidate/attempt records.
#[derive(Debug, Default)]
pub struct QuantifierRegistry {
    entries: FxHashMap<TermId, QuantifierEntry>,
}

impl QuantifierRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any record exists for `quantifier`.
    pub fn has_quantifier(&self, quantifier: TermId) -> bool {
        self.entries.contains_key(&quantifier)
    }

    fn entry(&mut self, quantifier: TermId, var_count: usize) -> &mut QuantifierEntry {
        let entry = self.entries.entry(quantifier).or_default();
        if entry.infos.len() < var_count {
            entry.infos.resize_with(var_count, FxHashMap::default);
        }
        entry
    }

    /// Record `term` as a candidate for variable `var_ix` of `quantifier`.
    ///
    /// Returns `true` on first sighting; repeated registrations keep the
    /// original age, phase and relevance.
    pub fn register_candidate(
        &mut self,
        quantifier: TermId,
        var_count: usize,
        var_ix: usize,
        term: TermId,
        relevant: bool,
    ) -> bool {
        let entry = self.entry(quantifier, var_count);
        let phase = entry.phase;
        let infos = &mut entry.infos[var_ix];
        if infos.contains_key(&term) {
            return false;
        }
        let age = infos.len();
        infos.insert(
            term,
            TermCandidateInfo {
                age,
                phase,
                relevant,
                tried: 0,
            },
        );
        true
    }

    /// Record an attempted instantiation, bumping the try-count of every
    /// candidate in the tuple.
    ///
    /// # Panics
    ///
    /// Panics if a term of the tuple was never registered as a candidate
    /// for its position.
    pub fn register_attempt(&mut self, quantifier: TermId, terms: &[TermId]) {
        let entry = self.entry(quantifier, terms.len());
        for (var_ix, term) in terms.iter().enumerate() {
            let info = entry.infos[var_ix]
                .get_mut(term)
                .expect("attempt with an unregistered candidate");
            info.tried += 1;
        }
    }

    /// Record whether an attempted tuple was kept or rejected by the caller.
    pub fn register_outcome(&mut self, quantifier: TermId, terms: &[TermId], successful: bool) {
        let entry = self.entry(quantifier, terms.len());
        if successful {
            entry.successful.push(terms.to_vec());
        } else {
            entry.rejected.push(terms.to_vec());
        }
    }

    /// Current phase of `quantifier` (0 before any record).
    pub fn current_phase(&self, quantifier: TermId) -> usize {
        self.entries.get(&quantifier).map_or(0, |e| e.phase)
    }

    /// Advance the phase of `quantifier`. Candidates registered afterwards
    /// carry the new phase.
    pub fn increase_phase(&mut self, quantifier: TermId) {
        self.entries.entry(quantifier).or_default().phase += 1;
    }

    /// Bookkeeping scalars of a registered candidate.
    pub fn candidate_info(
        &self,
        quantifier: TermId,
        var_ix: usize,
        term: TermId,
    ) -> Option<&TermCandidateInfo> {
        self.entries
            .get(&quantifier)?
            .infos
            .get(var_ix)?
            .get(&term)
    }

    /// Attempted tuples the caller reported as kept.
    pub fn successful_attempts(&self, quantifier: TermId) -> &[Vec<TermId>] {
        match self.entries.get(&quantifier) {
            Some(e) => &e.successful,
            None => &[],
        }
    }

    /// Attempted tuples the caller reported as rejected.
    pub fn rejected_attempts(&self, quantifier: TermId) -> &[Vec<TermId>] {
        match self.entries.get(&quantifier) {
            Some(e) => &e.rejected,
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TermManager;

    fn setup() -> (TermManager, TermId, TermId, TermId) {
        let mut tm = TermManager::new();
        let x = tm.mk_bound_var("x", tm.sorts.int_sort);
        let body = tm.mk_eq(x, x);
        let q = tm.mk_forall(vec![x], body);
        let a = tm.mk_var("a", tm.sorts.int_sort);
        let b = tm.mk_var("b", tm.sorts.int_sort);
        (tm, q, a, b)
    }

    #[test]
    fn test_candidate_ages_and_phases() {
        let (_tm, q, a, b) = setup();
        let mut reg = QuantifierRegistry::new();

        assert!(reg.register_candidate(q, 1, 0, a, true));
        reg.increase_phase(q);
        assert!(reg.register_candidate(q, 1, 0, b, false));
        // re-registration is a no-op
        assert!(!reg.register_candidate(q, 1, 0, a, false));

        let ia = reg.candidate_info(q, 0, a).unwrap();
        assert_eq!((ia.age, ia.phase, ia.relevant, ia.tried), (0, 0, true, 0));
        let ib = reg.candidate_info(q, 0, b).unwrap();
        assert_eq!((ib.age, ib.phase, ib.relevant, ib.tried), (1, 1, false, 0));
        assert_eq!(reg.current_phase(q), 1);
    }

    #[test]
    fn test_attempts_bump_try_counts() {
        let (_tm, q, a, b) = setup();
        let mut reg = QuantifierRegistry::new();
        reg.register_candidate(q, 1, 0, a, false);
        reg.register_candidate(q, 1, 0, b, false);

        reg.register_attempt(q, &[a]);
        reg.register_attempt(q, &[a]);
        reg.register_attempt(q, &[b]);
        assert_eq!(reg.candidate_info(q, 0, a).unwrap().tried, 2);
        assert_eq!(reg.candidate_info(q, 0, b).unwrap().tried, 1);
    }

    #[test]
    #[should_panic(expected = "unregistered candidate")]
    fn test_attempt_with_unknown_candidate_panics() {
        let (_tm, q, a, _b) = setup();
        let mut reg = QuantifierRegistry::new();
        reg.register_attempt(q, &[a]);
    }

    #[test]
    fn test_outcome_sets() {
        let (_tm, q, a, b) = setup();
        let mut reg = QuantifierRegistry::new();
        reg.register_candidate(q, 1, 0, a, false);
        reg.register_candidate(q, 1, 0, b, false);

        reg.register_outcome(q, &[a], true);
        reg.register_outcome(q, &[b], false);
        assert_eq!(reg.successful_attempts(q), &[vec![a]]);
        assert_eq!(reg.rejected_attempts(q), &[vec![b]]);
    }
}
