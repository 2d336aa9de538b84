//! Staged lexicographic tuple enumeration.

use crate::ast::TermId;
use crate::config::StageStrategy;
use crate::enumerate::{EnumeratorBase, TermTupleEnumerator};
use crate::error::Result;
use crate::producer::TermProducer;
use crate::session::SessionContext;

/// Lexicographic enumerator organized in stages.
///
/// Under [`StageStrategy::Max`] stage `s` holds the tuples whose maximum
/// digit is exactly `s`; under [`StageStrategy::Sum`] those whose digit sum
/// is exactly `s`. Stages are exhausted in order, each in lexicographic
/// order, so cheap tuples (small indices) come first and no tuple repeats.
pub struct StagedTupleEnumerator<'a> {
    base: EnumeratorBase,
    producer: Box<dyn TermProducer + 'a>,
    stage: usize,
    stage_count: usize,
}

impl<'a> StagedTupleEnumerator<'a> {
    /// Enumerator over `producer`'s candidate lists.
    pub fn new(base: EnumeratorBase, producer: Box<dyn TermProducer + 'a>) -> Self {
        Self {
            base,
            producer,
            stage: 0,
            stage_count: 0,
        }
    }

    fn strategy(&self) -> StageStrategy {
        self.base.env.stage_strategy
    }

    /// Move to the next stage and seed its lexicographically smallest tuple.
    fn increase_stage(&mut self) -> bool {
        self.base.change_prefix = self.base.variable_count;
        self.stage += 1;
        if self.stage >= self.stage_count {
            return false;
        }
        tracing::trace!(stage = self.stage, "entering stage");
        match self.strategy() {
            StageStrategy::Sum => self.seed_stage_sum(),
            StageStrategy::Max => self.seed_stage_max(),
        }
        true
    }

    /// Smallest sum-stage tuple: pack the stage into the least significant
    /// digits.
    fn seed_stage_sum(&mut self) {
        let n = self.base.variable_count;
        let mut missing = self.stage;
        for digit in (0..n).rev() {
            let cap = self.base.terms_sizes[digit] - 1;
            let value = missing.min(cap);
            self.base.term_index[digit] = value;
            missing -= value;
        }
        debug_assert_eq!(missing, 0, "stage exceeds index space");
    }

    /// Smallest max-stage tuple: zeros with the stage at the least
    /// significant digit large enough to hold it.
    fn seed_stage_max(&mut self) {
        let n = self.base.variable_count;
        for digit in 0..n {
            self.base.term_index[digit] = 0;
        }
        for digit in (0..n).rev() {
            if self.stage < self.base.terms_sizes[digit] {
                self.base.term_index[digit] = self.stage;
                return;
            }
        }
        unreachable!("stage exceeds every list size");
    }

    /// Lexicographically next tuple of the current sum stage, changing some
    /// digit inside the change prefix. The digit sum is preserved by
    /// repacking the freed amount into the least significant suffix digits.
    fn next_combination_sum(&mut self) -> bool {
        let n = self.base.variable_count;
        let sizes = &self.base.terms_sizes;
        let index = &mut self.base.term_index;

        let mut suffix_sum = 0;
        let mut increase_digit = None;
        for digit in (0..n).rev() {
            suffix_sum += index[digit];
            let new_value = index[digit] + 1;
            if digit < self.base.change_prefix
                && new_value < sizes[digit]
                && new_value <= suffix_sum
            {
                index[digit] = new_value;
                increase_digit = Some(digit);
                break;
            }
        }
        let Some(increase_digit) = increase_digit else {
            return false;
        };
        let mut missing = suffix_sum - index[increase_digit];
        for digit in (increase_digit + 1..n).rev() {
            let value = missing.min(sizes[digit] - 1);
            index[digit] = value;
            missing -= value;
        }
        debug_assert_eq!(missing, 0, "sum redistribution failed");
        true
    }

    /// Lexicographically next tuple of the current max stage: increase the
    /// least significant digit inside the change prefix that stays within
    /// the stage, zero the suffix, and re-place the stage value if the
    /// changed prefix no longer carries it.
    fn next_combination_max(&mut self) -> bool {
        let n = self.base.variable_count;
        let sizes = &self.base.terms_sizes;
        let index = &mut self.base.term_index;

        let mut increase_digit = None;
        for digit in (0..self.base.change_prefix).rev() {
            let new_value = index[digit] + 1;
            if new_value <= self.stage && new_value < sizes[digit] {
                index[digit] = new_value;
                for later in digit + 1..n {
                    index[later] = 0;
                }
                increase_digit = Some(digit);
                break;
            }
        }
        let Some(increase_digit) = increase_digit else {
            return false;
        };
        if index[..=increase_digit].contains(&self.stage) {
            return true;
        }
        for digit in (increase_digit + 1..n).rev() {
            if self.stage < sizes[digit] {
                index[digit] = self.stage;
                return true;
            }
        }
        unreachable!("no digit can carry the stage");
    }

    /// Advance within the stage, or seed the next stage.
    fn next_combination_attempt(&mut self) -> bool {
        let advanced = match self.strategy() {
            StageStrategy::Sum => self.next_combination_sum(),
            StageStrategy::Max => self.next_combination_max(),
        };
        advanced || self.increase_stage()
    }
}

impl TermTupleEnumerator for StagedTupleEnumerator<'_> {
    fn init(&mut self, cx: &mut SessionContext<'_>) -> Result<()> {
        self.base.init(cx, self.producer.as_mut())?;
        if !self.base.alive {
            return Ok(());
        }
        self.stage = 0;
        self.stage_count = 1;
        for &size in &self.base.terms_sizes {
            match self.strategy() {
                StageStrategy::Sum => self.stage_count += size - 1,
                StageStrategy::Max => self.stage_count = self.stage_count.max(size),
            }
        }
        Ok(())
    }

    fn has_next(&mut self, cx: &mut SessionContext<'_>) -> bool {
        if !self.base.alive {
            return false;
        }
        if self.base.step_counter == 0 {
            // the all-zero seed belongs to stage 0 of both strategies
            self.base.step_counter = 1;
            return true;
        }
        loop {
            if !self.next_combination_attempt() {
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
        self.base.emit(self.producer.as_ref(), out);
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
    use crate::producer::{BasicTermProducer, InMemoryTermDb};

    fn fixture(counts: [usize; 2]) -> (TermManager, TermId, InMemoryTermDb) {
        let mut tm = TermManager::new();
        let s = tm.sorts.declare("U");
        let t = tm.sorts.declare("V");
        let x = tm.mk_bound_var("x", s);
        let y = tm.mk_bound_var("y", t);
        let body = tm.mk_eq(x, x);
        let body2 = tm.mk_eq(y, y);
        let conj = tm.mk_and(vec![body, body2]);
        let q = tm.mk_forall(vec![x, y], conj);

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

    fn enumerate_indices(
        tm: &TermManager,
        q: TermId,
        db: &InMemoryTermDb,
        env: EnumeratorEnv,
        failures: &[(usize, Vec<bool>)],
    ) -> Vec<Vec<usize>> {
        let mut cx = SessionContext::new(tm, db);
        let producer = BasicTermProducer::new(q, false);
        let base = EnumeratorBase::new(q, 2, env);
        let mut en = StagedTupleEnumerator::new(base, Box::new(producer));
        en.init(&mut cx).unwrap();

        let mut seen = Vec::new();
        let mut out = Vec::new();
        let mut step = 0;
        while en.has_next(&mut cx) {
            en.next(&mut out);
            seen.push(en.base.term_index.to_vec());
            if let Some((_, mask)) = failures.iter().find(|(at, _)| *at == step) {
                en.failure_reason(mask);
            }
            step += 1;
            assert!(step < 100, "runaway enumeration");
        }
        seen
    }

    #[test]
    fn test_max_strategy_full_sequence() {
        let (tm, q, db) = fixture([3, 2]);
        let seen = enumerate_indices(&tm, q, &db, EnumeratorEnv::default(), &[]);
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
    fn test_sum_strategy_full_sequence() {
        let (tm, q, db) = fixture([3, 2]);
        let env = EnumeratorEnv {
            stage_strategy: StageStrategy::Sum,
            ..EnumeratorEnv::default()
        };
        let seen = enumerate_indices(&tm, q, &db, env, &[]);
        // stages 0..=3 by digit sum, lexicographic within each stage
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
    fn test_sum_strategy_orders_by_digit_sum() {
        let (tm, q, db) = fixture([3, 3]);
        let env = EnumeratorEnv {
            stage_strategy: StageStrategy::Sum,
            ..EnumeratorEnv::default()
        };
        let seen = enumerate_indices(&tm, q, &db, env, &[]);
        assert_eq!(seen.len(), 9);
        let sums: Vec<usize> = seen.iter().map(|t| t.iter().sum()).collect();
        let mut sorted = sums.clone();
        sorted.sort_unstable();
        assert_eq!(sums, sorted, "digit sums must be non-decreasing");
        // no repeats
        let mut dedup = seen.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 9);
    }

    #[test]
    fn test_failure_mask_prunes_matching_prefix() {
        let (tm, q, db) = fixture([3, 2]);
        // first variable blamed on the seed tuple: every (0, _) is skipped
        let failures = vec![(0, vec![true, false])];
        let seen = enumerate_indices(&tm, q, &db, EnumeratorEnv::default(), &failures);
        assert_eq!(
            seen,
            vec![vec![0, 0], vec![1, 0], vec![1, 1], vec![2, 0], vec![2, 1]]
        );
    }

    #[test]
    fn test_all_blamed_mask_only_skips_exact_tuple() {
        let (tm, q, db) = fixture([3, 2]);
        // fully specified failures carry no pruning information
        let failures = vec![(0, vec![true, true])];
        let seen = enumerate_indices(&tm, q, &db, EnumeratorEnv::default(), &failures);
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_full_effort_emits_placeholder_for_empty_list() {
        let (mut tm, q, mut db) = fixture([2, 0]);
        // a canonical term must exist for the empty sort
        let t_sort = tm.sort_of(tm.bound_vars(q)[1]);
        let fallback = tm.mk_var("v_default", t_sort);
        db.set_default(t_sort, fallback);

        let env = EnumeratorEnv {
            full_effort: true,
            ..EnumeratorEnv::default()
        };
        let mut cx = SessionContext::new(&tm, &db);
        let producer = BasicTermProducer::new(q, false);
        let base = EnumeratorBase::new(q, 2, env);
        let mut en = StagedTupleEnumerator::new(base, Box::new(producer));
        en.init(&mut cx).unwrap();

        let mut out = Vec::new();
        let mut tuples = Vec::new();
        while en.has_next(&mut cx) {
            en.next(&mut out);
            tuples.push(out.clone());
        }
        assert_eq!(tuples.len(), 2);
        for tuple in &tuples {
            assert!(tuple[0].is_some());
            assert!(tuple[1].is_none());
        }
    }
}
