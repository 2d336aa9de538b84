//! Tuple enumerators over candidate index space.
//!
//! An enumerator walks the mixed-radix index space spanned by the candidate
//! lists of one quantifier and yields term tuples through the
//! init / has-next / next / failure-reason protocol. Reported failure masks
//! feed the [`IndexTrie`], which prunes every later tuple subsumed by a
//! failed signature.

mod astar;
mod staged;

pub use astar::AStarTupleEnumerator;
pub use staged::StagedTupleEnumerator;

use smallvec::SmallVec;

use crate::ast::TermId;
use crate::config::EnumeratorEnv;
use crate::error::Result;
use crate::index_trie::IndexTrie;
use crate::producer::TermProducer;
use crate::session::SessionContext;

/// Index tuple over candidate lists, one digit per quantified variable.
pub type IndexTuple = SmallVec<[usize; 8]>;

/// Protocol of a tuple enumerator.
///
/// Call order per session: `init` once; then `has_next`, and while it holds,
/// `next` followed by an optional `failure_reason` for the emitted tuple.
pub trait TermTupleEnumerator {
    /// Prepare candidate lists, register candidates, seed the first tuple.
    fn init(&mut self, cx: &mut SessionContext<'_>) -> Result<()>;

    /// Advance to the next tuple not subsumed by a recorded failure.
    fn has_next(&mut self, cx: &mut SessionContext<'_>) -> bool;

    /// Write the current tuple into `out`. Variables with an empty
    /// candidate list (full effort only) yield `None`.
    fn next(&mut self, out: &mut Vec<Option<TermId>>);

    /// Report why the last emitted tuple failed: `mask[i]` marks variable
    /// `i` as contributing to the failure.
    fn failure_reason(&mut self, mask: &[bool]);
}

/// State shared by the concrete enumerators.
pub(crate) struct EnumeratorBase {
    pub(crate) quantifier: TermId,
    pub(crate) variable_count: usize,
    /// Effective per-variable list sizes: capped by the candidate limit,
    /// floored at 1 under full effort.
    pub(crate) terms_sizes: Vec<usize>,
    /// List sizes before the full-effort floor; zero marks a variable
    /// emitted as `None`.
    pub(crate) raw_counts: Vec<usize>,
    pub(crate) term_index: IndexTuple,
    pub(crate) step_counter: u64,
    pub(crate) disabled: IndexTrie,
    pub(crate) alive: bool,
    pub(crate) change_prefix: usize,
    pub(crate) env: EnumeratorEnv,
}

impl EnumeratorBase {
    pub(crate) fn new(quantifier: TermId, variable_count: usize, env: EnumeratorEnv) -> Self {
        Self {
            quantifier,
            variable_count,
            terms_sizes: Vec::new(),
            raw_counts: Vec::new(),
            term_index: IndexTuple::new(),
            step_counter: 0,
            disabled: IndexTrie::new(true),
            alive: false,
            change_prefix: variable_count,
            env,
        }
    }

    /// Prepare every variable's candidate list, register the candidates and
    /// seed the all-zero tuple. Leaves `alive` false when a variable has no
    /// candidates under strict effort.
    pub(crate) fn init(
        &mut self,
        cx: &mut SessionContext<'_>,
        producer: &mut dyn TermProducer,
    ) -> Result<()> {
        self.alive = true;
        self.step_counter = 0;
        self.change_prefix = self.variable_count;
        self.terms_sizes.clear();
        self.raw_counts.clear();

        let register = self.env.logging || cx.predictor.is_some() || cx.tuple_predictor.is_some();
        let mut any_new = false;
        for var_ix in 0..self.variable_count {
            let count = producer.prepare_terms(cx, var_ix);
            if count == 0 && !self.env.full_effort {
                tracing::debug!(var_ix, "no candidates, aborting session");
                self.alive = false;
                return Ok(());
            }
            let size = match self.env.candidate_limit {
                Some(limit) => count.min(limit),
                None => count,
            };
            self.raw_counts.push(size);
            self.terms_sizes.push(size.max(1));

            if register {
                for ix in 0..size {
                    let term = producer.term_original(var_ix, ix);
                    let relevant = cx
                        .relevant_domain
                        .is_some_and(|rd| rd.terms(self.quantifier, var_ix).contains(&term));
                    any_new |= cx.registry.register_candidate(
                        self.quantifier,
                        self.variable_count,
                        var_ix,
                        term,
                        relevant,
                    );
                }
                if size == 0 {
                    // full effort: the placeholder filled in later is a
                    // candidate too
                    let sort = cx.tm.sort_of(cx.tm.bound_vars(self.quantifier)[var_ix]);
                    let fallback = cx.db.term_for_sort(sort);
                    any_new |= cx.registry.register_candidate(
                        self.quantifier,
                        self.variable_count,
                        var_ix,
                        fallback,
                        false,
                    );
                }
            }
        }
        if any_new {
            cx.registry.increase_phase(self.quantifier);
        }
        producer.initialize(cx)?;

        self.term_index.clear();
        self.term_index.resize(self.variable_count, 0);
        Ok(())
    }

    /// Whether the current tuple escapes every recorded failure signature.
    pub(crate) fn vet_current(&self) -> bool {
        !self.disabled.find(&self.term_index, self.change_prefix)
    }

    pub(crate) fn record_failure(&mut self, mask: &[bool]) {
        assert_eq!(mask.len(), self.variable_count, "failure mask arity mismatch");
        self.disabled.add(mask, &self.term_index);
        if let Some(highest) = mask.iter().rposition(|&m| m) {
            self.change_prefix = highest + 1;
        }
        tracing::trace!(?mask, change_prefix = self.change_prefix, "failure recorded");
    }

    /// Write the current tuple through `producer` into `out`.
    pub(crate) fn emit(&self, producer: &dyn TermProducer, out: &mut Vec<Option<TermId>>) {
        out.clear();
        for var_ix in 0..self.variable_count {
            if self.raw_counts[var_ix] == 0 {
                out.push(None);
            } else {
                out.push(Some(producer.term(var_ix, self.term_index[var_ix])));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TermManager;
    use crate::producer::{BasicTermProducer, InMemoryTermDb};

    fn fixture() -> (TermManager, TermId, InMemoryTermDb) {
        let mut tm = TermManager::new();
        let x = tm.mk_bound_var("x", tm.sorts.int_sort);
        let y = tm.mk_bound_var("y", tm.sorts.int_sort);
        let body = tm.mk_leq(x, y);
        let q = tm.mk_forall(vec![x, y], body);
        let mut db = InMemoryTermDb::new();
        for i in 0..3 {
            let t = tm.mk_int(i);
            db.add_term(&tm, t);
        }
        (tm, q, db)
    }

    #[test]
    fn test_base_init_seeds_zero_tuple() {
        let (tm, q, db) = fixture();
        let mut cx = SessionContext::new(&tm, &db);
        let mut producer = BasicTermProducer::new(q, false);
        let mut base = EnumeratorBase::new(q, 2, EnumeratorEnv::default());
        base.init(&mut cx, &mut producer).unwrap();

        assert!(base.alive);
        assert_eq!(base.terms_sizes, vec![3, 3]);
        assert_eq!(base.term_index.as_slice(), &[0, 0]);
        assert_eq!(base.change_prefix, 2);
    }

    #[test]
    fn test_candidate_limit_caps_sizes() {
        let (tm, q, db) = fixture();
        let mut cx = SessionContext::new(&tm, &db);
        let mut producer = BasicTermProducer::new(q, false);
        let env = EnumeratorEnv {
            candidate_limit: Some(2),
            ..EnumeratorEnv::default()
        };
        let mut base = EnumeratorBase::new(q, 2, env);
        base.init(&mut cx, &mut producer).unwrap();
        assert_eq!(base.terms_sizes, vec![2, 2]);
    }

    #[test]
    fn test_failure_updates_change_prefix() {
        let (tm, q, db) = fixture();
        let mut cx = SessionContext::new(&tm, &db);
        let mut producer = BasicTermProducer::new(q, false);
        let mut base = EnumeratorBase::new(q, 2, EnumeratorEnv::default());
        base.init(&mut cx, &mut producer).unwrap();

        base.record_failure(&[true, false]);
        assert_eq!(base.change_prefix, 1);
        // the failing prefix is now subsumed
        assert!(!base.vet_current());
        base.term_index[0] = 1;
        assert!(base.vet_current());
    }

    #[test]
    fn test_strict_effort_aborts_on_empty_domain() {
        let mut tm = TermManager::new();
        let s = tm.sorts.declare("U");
        let x = tm.mk_bound_var("x", s);
        let body = tm.mk_eq(x, x);
        let q = tm.mk_forall(vec![x], body);
        let db = InMemoryTermDb::new();

        let mut cx = SessionContext::new(&tm, &db);
        let mut producer = BasicTermProducer::new(q, false);
        let mut base = EnumeratorBase::new(q, 1, EnumeratorEnv::default());
        base.init(&mut cx, &mut producer).unwrap();
        assert!(!base.alive);
    }
}
