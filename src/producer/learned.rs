//! Learned-reordering producer decorator.

use crate::ast::TermId;
use crate::error::Result;
use crate::features::{featurize_quantifier, featurize_term, FeatureVector, Featurize};
use crate::producer::TermProducer;
use crate::session::SessionContext;

/// Decorator that reorders each candidate list by descending predictor
/// score.
///
/// On initialization the quantifier is featurized once, each candidate term
/// is scored against the session's term predictor, and a stable
/// descending-sort permutation is built per variable. Without a configured
/// predictor the decorator is the identity.
///
/// Scores are exposed through [`predict`](Self::predict) in the reordered
/// index space, which is what the best-first enumerator consumes.
pub struct LearnedProducer<'a> {
    inner: Box<dyn TermProducer + 'a>,
    quantifier: TermId,
    threshold: Option<f64>,
    counts: Vec<usize>,
    permutations: Vec<Vec<usize>>,
    predictions: Vec<Vec<f64>>,
    initialized: bool,
}

impl<'a> LearnedProducer<'a> {
    /// Wrap `inner` for the given quantifier. With `threshold` set, scores
    /// are binarized: at least the threshold becomes 1, below it 0.
    pub fn new(
        inner: Box<dyn TermProducer + 'a>,
        quantifier: TermId,
        threshold: Option<f64>,
    ) -> Self {
        Self {
            inner,
            quantifier,
            threshold,
            counts: Vec::new(),
            permutations: Vec::new(),
            predictions: Vec::new(),
            initialized: false,
        }
    }

    /// Score of the `ix`-th candidate for `var_ix` in the reordered list.
    ///
    /// # Panics
    ///
    /// Panics before initialization, or when the session has no term
    /// predictor.
    pub fn predict(&self, var_ix: usize, ix: usize) -> f64 {
        assert!(self.initialized, "producer not initialized");
        assert!(
            !self.predictions.is_empty(),
            "no term predictor configured"
        );
        self.predictions[var_ix][self.permutations[var_ix][ix]]
    }
}

impl TermProducer for LearnedProducer<'_> {
    fn prepare_terms(&mut self, cx: &mut SessionContext<'_>, var_ix: usize) -> usize {
        let count = self.inner.prepare_terms(cx, var_ix);
        if self.counts.len() <= var_ix {
            self.counts.resize(var_ix + 1, 0);
        }
        self.counts[var_ix] = count;
        count
    }

    fn term(&self, var_ix: usize, ix: usize) -> TermId {
        assert!(self.initialized, "producer not initialized");
        self.inner.term(var_ix, self.permutations[var_ix][ix])
    }

    fn term_original(&self, var_ix: usize, ix: usize) -> TermId {
        self.inner.term_original(var_ix, ix)
    }

    fn initialize(&mut self, cx: &mut SessionContext<'_>) -> Result<()> {
        self.inner.initialize(cx)?;
        self.permutations = self
            .counts
            .iter()
            .map(|&count| (0..count).collect())
            .collect();

        let Some(predictor) = cx.predictor else {
            // identity ordering, no scores
            self.initialized = true;
            return Ok(());
        };

        let var_count = self.counts.len();
        let mut qf = Featurize::new(true);
        qf.count(cx.tm, self.quantifier);
        cx.stats.featurize_calls += 1;

        let mut vec = FeatureVector::new(&cx.term_layout);
        featurize_quantifier(&mut vec, &qf);

        self.predictions = Vec::with_capacity(var_count);
        for (var_ix, &count) in self.counts.iter().enumerate() {
            let mut scores = Vec::with_capacity(count);
            for ix in 0..count {
                let term = self.inner.term(var_ix, ix);
                if cx.registry.candidate_info(self.quantifier, var_ix, term).is_none() {
                    // candidates capped away by the enumerator still get scored
                    let relevant = cx
                        .relevant_domain
                        .is_some_and(|rd| rd.terms(self.quantifier, var_ix).contains(&term));
                    cx.registry
                        .register_candidate(self.quantifier, var_count, var_ix, term, relevant);
                }
                let info = *cx
                    .registry
                    .candidate_info(self.quantifier, var_ix, term)
                    .expect("candidate registered above");
                vec.push();
                featurize_term(&mut vec, cx.tm, term, var_ix, &info, &qf);
                cx.stats.featurize_calls += 1;
                let mut score = predictor.predict(vec.values());
                cx.stats.predictions += 1;
                vec.pop();
                if let Some(threshold) = self.threshold {
                    score = if score >= threshold { 1.0 } else { 0.0 };
                }
                scores.push(score);
            }
            let perm = &mut self.permutations[var_ix];
            perm.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
            tracing::debug!(var_ix, order = ?perm, "learned candidate order");
            self.predictions.push(scores);
        }
        cx.stats.learned_reorderings += 1;
        self.initialized = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{TermKind, TermManager};
    use crate::features::FeatureLayout;
    use crate::predict::Predictor;
    use crate::producer::{BasicTermProducer, InMemoryTermDb};

    /// Scores a term block by its depth scalar.
    struct DepthScorer {
        num_features: usize,
    }

    impl DepthScorer {
        fn new() -> Self {
            Self {
                num_features: FeatureLayout::term().len(),
            }
        }
    }

    impl Predictor for DepthScorer {
        fn num_features(&self) -> usize {
            self.num_features
        }

        fn predict(&self, features: &[f64]) -> f64 {
            // depth is the fifth scalar after the two kind histograms
            features[2 * TermKind::COUNT + 4]
        }
    }

    fn fixture() -> (TermManager, TermId, Vec<TermId>, InMemoryTermDb) {
        let mut tm = TermManager::new();
        let x = tm.mk_bound_var("x", tm.sorts.int_sort);
        let body = tm.mk_eq(x, x);
        let q = tm.mk_forall(vec![x], body);

        let a = tm.mk_var("a", tm.sorts.int_sort);
        let fa = tm.mk_apply("f", tm.sorts.int_sort, vec![a]);
        let gfa = tm.mk_apply("g", tm.sorts.int_sort, vec![fa]);
        let mut db = InMemoryTermDb::new();
        for &t in &[a, fa, gfa] {
            db.add_term(&tm, t);
        }
        (tm, q, vec![a, fa, gfa], db)
    }

    #[test]
    fn test_reorders_by_descending_score() {
        let (tm, q, terms, db) = fixture();
        let scorer = DepthScorer::new();
        let mut cx = SessionContext::new(&tm, &db)
            .with_predictor(&scorer)
            .unwrap();

        let inner = BasicTermProducer::new(q, false);
        let mut producer = LearnedProducer::new(Box::new(inner), q, None);
        assert_eq!(producer.prepare_terms(&mut cx, 0), 3);
        producer.initialize(&mut cx).unwrap();

        // depths 0, 1, 2 sorted descending
        assert_eq!(producer.term(0, 0), terms[2]);
        assert_eq!(producer.term(0, 1), terms[1]);
        assert_eq!(producer.term(0, 2), terms[0]);
        assert_eq!(producer.predict(0, 0), 2.0);
        assert_eq!(producer.predict(0, 2), 0.0);
        // registration order stays the base order
        assert_eq!(producer.term_original(0, 0), terms[0]);
        assert_eq!(cx.stats.predictions, 3);
    }

    #[test]
    fn test_threshold_binarizes_scores_stably() {
        let (tm, q, terms, db) = fixture();
        let scorer = DepthScorer::new();
        let mut cx = SessionContext::new(&tm, &db)
            .with_predictor(&scorer)
            .unwrap();

        let inner = BasicTermProducer::new(q, false);
        let mut producer = LearnedProducer::new(Box::new(inner), q, Some(1.0));
        producer.prepare_terms(&mut cx, 0);
        producer.initialize(&mut cx).unwrap();

        // scores binarize to [0, 1, 1]; the stable sort keeps fa before gfa
        assert_eq!(producer.term(0, 0), terms[1]);
        assert_eq!(producer.term(0, 1), terms[2]);
        assert_eq!(producer.term(0, 2), terms[0]);
        assert_eq!(producer.predict(0, 0), 1.0);
        assert_eq!(producer.predict(0, 2), 0.0);
    }

    #[test]
    fn test_identity_without_predictor() {
        let (tm, q, terms, db) = fixture();
        let mut cx = SessionContext::new(&tm, &db);

        let inner = BasicTermProducer::new(q, false);
        let mut producer = LearnedProducer::new(Box::new(inner), q, None);
        producer.prepare_terms(&mut cx, 0);
        producer.initialize(&mut cx).unwrap();
        for (ix, &t) in terms.iter().enumerate() {
            assert_eq!(producer.term(0, ix), t);
        }
    }
}
