//! Best-first tuple enumeration.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::ast::{TermId, TermKind};
use crate::enumerate::{EnumeratorBase, IndexTuple, TermTupleEnumerator};
use crate::error::Result;
use crate::features::{featurize_quantifier, featurize_term, FeatureVector, Featurize, TERM_SCALARS};
use crate::producer::{LearnedProducer, TermProducer};
use crate::session::SessionContext;

/// Heap entry: score first, then first-in-first-out on ties.
///
/// The tie-break makes enumeration under a constant predictor degrade to
/// breadth-first order, so tuples come out by non-decreasing digit sum.
struct ScoredTuple {
    score: f64,
    seq: u64,
    tuple: IndexTuple,
}

impl PartialEq for ScoredTuple {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for ScoredTuple {}

impl Ord for ScoredTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScoredTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first enumerator guided by predictor scores.
///
/// The open heap starts at the all-zero tuple; popping a tuple emits it and
/// pushes its unvisited single-digit successors. A tuple's score is the
/// joint tuple predictor when one is configured, otherwise the product of
/// the per-term scores of its components. The visited set guarantees each
/// tuple is emitted at most once and the successor relation guarantees all
/// of the index space is reached, so the walk is exhaustive whatever the
/// scores.
///
/// The learned producer is owned, not taken as an opaque decorator chain:
/// per-term scores are read in the producer's reordered index space, and
/// an outer decorator would silently shift that space.
pub struct AStarTupleEnumerator<'a> {
    base: EnumeratorBase,
    producer: LearnedProducer<'a>,
    open: BinaryHeap<ScoredTuple>,
    visited: FxHashSet<IndexTuple>,
    seq: u64,
    quantifier_features: Option<Featurize>,
}

impl<'a> AStarTupleEnumerator<'a> {
    /// Enumerator over the candidate lists of `producer`.
    pub fn new(base: EnumeratorBase, producer: LearnedProducer<'a>) -> Self {
        Self {
            base,
            producer,
            open: BinaryHeap::new(),
            visited: FxHashSet::default(),
            seq: 0,
            quantifier_features: None,
        }
    }

    fn score(&self, cx: &mut SessionContext<'_>, tuple: &IndexTuple) -> f64 {
        if cx.tuple_predictor.is_some() {
            self.score_joint(cx, tuple)
        } else {
            let mut product = 1.0;
            for var_ix in 0..self.base.variable_count {
                if self.base.raw_counts[var_ix] == 0 {
                    continue;
                }
                product *= self.producer.predict(var_ix, tuple[var_ix]);
            }
            product
        }
    }

    fn score_joint(&self, cx: &mut SessionContext<'_>, tuple: &IndexTuple) -> f64 {
        let predictor = cx.tuple_predictor.expect("checked by caller");
        let layout = cx
            .tuple_layout
            .as_ref()
            .expect("tuple layout accompanies the tuple predictor");
        let qf = self
            .quantifier_features
            .as_ref()
            .expect("quantifier featurized at init");

        let mut vec = FeatureVector::new(layout);
        featurize_quantifier(&mut vec, qf);
        for var_ix in 0..self.base.variable_count {
            if self.base.raw_counts[var_ix] == 0 {
                for _ in 0..TermKind::COUNT + TERM_SCALARS {
                    vec.add_value(0.0);
                }
                continue;
            }
            let term = self.producer.term(var_ix, tuple[var_ix]);
            let info = *cx
                .registry
                .candidate_info(self.base.quantifier, var_ix, term)
                .expect("candidates registered at init");
            featurize_term(&mut vec, cx.tm, term, var_ix, &info, qf);
        }
        vec.pad();
        cx.stats.featurize_calls += 1;
        cx.stats.predictions += 1;
        predictor.predict(vec.values())
    }

    fn push_successors(&mut self, cx: &mut SessionContext<'_>, tuple: &IndexTuple) {
        for var_ix in (0..self.base.variable_count).rev() {
            if tuple[var_ix] + 1 >= self.base.terms_sizes[var_ix] {
                continue;
            }
            let mut successor = tuple.clone();
            successor[var_ix] += 1;
            if !self.visited.insert(successor.clone()) {
                continue;
            }
            let score = self.score(cx, &successor);
            self.open.push(ScoredTuple {
                score,
                seq: self.seq,
                tuple: successor,
            });
            self.seq += 1;
        }
    }

    /// Pop the best open tuple into the current index and expand it.
    fn next_combination_attempt(&mut self, cx: &mut SessionContext<'_>) -> bool {
        let Some(top) = self.open.pop() else {
            return false;
        };
        self.base.term_index = top.tuple;
        let tuple = self.base.term_index.clone();
        self.push_successors(cx, &tuple);
        true
    }
}

impl TermTupleEnumerator for AStarTupleEnumerator<'_> {
    fn init(&mut self, cx: &mut SessionContext<'_>) -> Result<()> {
        self.base.init(cx, &mut self.producer)?;
        if !self.base.alive {
            return Ok(());
        }
        if cx.tuple_predictor.is_some() {
            let mut qf = Featurize::new(true);
            qf.count(cx.tm, self.base.quantifier);
            cx.stats.featurize_calls += 1;
            self.quantifier_features = Some(qf);
        }

        self.open.clear();
        self.visited.clear();
        self.seq = 0;

        let seed: IndexTuple = self.base.term_index.clone();
        self.visited.insert(seed.clone());
        let score = self.score(cx, &seed);
        self.open.push(ScoredTuple {
            score,
            seq: self.seq,
            tuple: seed,
        });
        self.seq += 1;
        // the first has_next emits the current index, so consume the seed
        // entry now rather than re-emitting it on the second step
        self.next_combination_attempt(cx);
        Ok(())
    }

    fn has_next(&mut self, cx: &mut SessionContext<'_>) -> bool {
        if !self.base.alive {
            return false;
        }
        if self.base.step_counter == 0 {
            self.base.step_counter = 1;
            return true;
        }
        loop {
            if !self.next_combination_attempt(cx) {
                self.base.alive = false;
                return false;
            }
            if self.base.vet_current() {
                self.base.change_prefix = self.base.variable_count;
                return true;
            }
            cx.stats.pruned_tuples += 1;
        }
    }

    fn next(&mut self, out: &mut Vec<Option<TermId>>) {
        self.base.emit(&self.producer, out);
    }

    fn failure_reason(&mut self, mask: &[bool]) {
        self.base.record_failure(mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TermManager;
    use crate::config::EnumeratorEnv;
    use crate::features::FeatureLayout;
    use crate::predict::ConstantPredictor;
    use crate::producer::{BasicTermProducer, InMemoryTermDb};

    fn fixture(counts: [usize; 2]) -> (TermManager, TermId, InMemoryTermDb) {
        let mut tm = TermManager::new();
        let s = tm.sorts.declare("U");
        let t = tm.sorts.declare("V");
        let x = tm.mk_bound_var("x", s);
        let y = tm.mk_bound_var("y", t);
        let ex = tm.mk_eq(x, x);
        let ey = tm.mk_eq(y, y);
        let body = tm.mk_and(vec![ex, ey]);
        let q = tm.mk_forall(vec![x, y], body);

        let mut db = InMemoryTermDb::new();
        for i in 0..counts[0] {
            let c = tm.mk_var(format!("u{i}"), s);
            db.add_term(&tm, c);
        }
        for i in 0..counts[1] {
            let c = tm.mk_var(format!("v{i}"), t);
            db.add_term(&tm, c);
        }
        (tm, q, db)
    }

    #[test]
    fn test_constant_scores_give_breadth_first_order() {
        let (tm, q, db) = fixture([3, 2]);
        let predictor = ConstantPredictor::new(0.5, FeatureLayout::term().len());
        let mut cx = SessionContext::new(&tm, &db)
            .with_predictor(&predictor)
            .unwrap();

        let inner = BasicTermProducer::new(q, false);
        let producer = LearnedProducer::new(Box::new(inner), q, None);
        let base = EnumeratorBase::new(q, 2, EnumeratorEnv::default());
        let mut en = AStarTupleEnumerator::new(base, producer);
        en.init(&mut cx).unwrap();

        let mut seen = Vec::new();
        let mut out = Vec::new();
        while en.has_next(&mut cx) {
            en.next(&mut out);
            seen.push(en.base.term_index.to_vec());
            assert!(seen.len() <= 6, "runaway enumeration");
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![1, 0],
                vec![1, 1],
                vec![2, 0],
                vec![2, 1],
            ]
        );
    }

    #[test]
    fn test_failure_mask_prunes_tuples() {
        let (tm, q, db) = fixture([3, 2]);
        let predictor = ConstantPredictor::new(0.5, FeatureLayout::term().len());
        let mut cx = SessionContext::new(&tm, &db)
            .with_predictor(&predictor)
            .unwrap();

        let inner = BasicTermProducer::new(q, false);
        let producer = LearnedProducer::new(Box::new(inner), q, None);
        let base = EnumeratorBase::new(q, 2, EnumeratorEnv::default());
        let mut en = AStarTupleEnumerator::new(base, producer);
        en.init(&mut cx).unwrap();

        let mut seen = Vec::new();
        let mut out = Vec::new();
        let mut first = true;
        while en.has_next(&mut cx) {
            en.next(&mut out);
            seen.push(en.base.term_index.to_vec());
            if first {
                en.failure_reason(&[true, false]);
                first = false;
            }
            assert!(seen.len() <= 6, "runaway enumeration");
        }
        // (0, 1) is subsumed by the failed (0, *) signature
        assert!(!seen.contains(&vec![0, 1]));
        assert_eq!(seen[0], vec![0, 0]);
        assert_eq!(seen.len(), 5);
        assert!(cx.stats.pruned_tuples >= 1);
    }

    #[test]
    fn test_emits_each_tuple_once() {
        let (tm, q, db) = fixture([3, 3]);
        let predictor = ConstantPredictor::new(1.0, FeatureLayout::term().len());
        let mut cx = SessionContext::new(&tm, &db)
            .with_predictor(&predictor)
            .unwrap();

        let inner = BasicTermProducer::new(q, false);
        let producer = LearnedProducer::new(Box::new(inner), q, None);
        let base = EnumeratorBase::new(q, 2, EnumeratorEnv::default());
        let mut en = AStarTupleEnumerator::new(base, producer);
        en.init(&mut cx).unwrap();

        let mut seen = Vec::new();
        while en.has_next(&mut cx) {
            seen.push(en.base.term_index.to_vec());
            assert!(seen.len() <= 9, "runaway enumeration");
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 9);
    }
}
