//! Session context and the enumeration driver.
//!
//! A [`SessionContext`] bundles everything that outlives a single
//! enumeration session: the term manager, the ground-term database, the
//! optional relevant domain and predictors, the candidate registry, the RNG
//! stream and the statistics counters. [`run_session`] then drives one full
//! init / has-next / next / failure-reason round against a caller-supplied
//! judge.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ast::{TermId, TermManager};
use crate::config::EnumeratorEnv;
use crate::enumerate::{
    AStarTupleEnumerator, EnumeratorBase, StagedTupleEnumerator, TermTupleEnumerator,
};
use crate::error::{EnumError, Result};
use crate::features::FeatureLayout;
use crate::predict::Predictor;
use crate::producer::{
    BasicTermProducer, LearnedProducer, PoolTermProducer, RandomizeProducer,
    RelevantDomainProducer, RelevantDomain, TermDb, TermPools, TermProducer,
};
use crate::registry::QuantifierRegistry;

/// Counters accumulated across sessions.
#[derive(Debug, Clone, Default)]
pub struct EnumeratorStats {
    /// Sessions started.
    pub sessions: u64,
    /// Tuples handed to the judge.
    pub tuples_emitted: u64,
    /// Predictor evaluations.
    pub predictions: u64,
    /// Feature extraction passes.
    pub featurize_calls: u64,
    /// Tuples skipped because a failure signature subsumed them.
    pub pruned_tuples: u64,
    /// Candidate-list reorderings performed by the learned producer.
    pub learned_reorderings: u64,
}

/// Long-lived engine state shared by all sessions.
pub struct SessionContext<'a> {
    /// Term manager the quantifiers and candidates live in.
    pub tm: &'a TermManager,
    /// Ground-term database.
    pub db: &'a dyn TermDb,
    /// Relevant-domain analysis, when available.
    pub relevant_domain: Option<&'a dyn RelevantDomain>,
    /// Per-term predictor used by the learned producer.
    pub predictor: Option<&'a dyn Predictor>,
    /// Joint tuple predictor used by the best-first enumerator.
    pub tuple_predictor: Option<&'a dyn Predictor>,
    /// Candidate and attempt records.
    pub registry: QuantifierRegistry,
    /// RNG stream shared by all randomizing producers; successive sessions
    /// continue the same stream.
    pub rng: StdRng,
    /// Layout of per-term feature vectors.
    pub term_layout: FeatureLayout,
    /// Layout of tuple feature vectors; present with a tuple predictor.
    pub tuple_layout: Option<FeatureLayout>,
    /// Counters.
    pub stats: EnumeratorStats,
}

impl<'a> SessionContext<'a> {
    /// Context over a term manager and term database, deterministic RNG
    /// seed 0, no relevant domain, no predictors.
    pub fn new(tm: &'a TermManager, db: &'a dyn TermDb) -> Self {
        Self {
            tm,
            db,
            relevant_domain: None,
            predictor: None,
            tuple_predictor: None,
            registry: QuantifierRegistry::new(),
            rng: StdRng::seed_from_u64(0),
            term_layout: FeatureLayout::term(),
            tuple_layout: None,
            stats: EnumeratorStats::default(),
        }
    }

    /// Reseed the RNG stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Attach a relevant-domain analysis.
    pub fn with_relevant_domain(mut self, rd: &'a dyn RelevantDomain) -> Self {
        self.relevant_domain = Some(rd);
        self
    }

    /// Attach a per-term predictor. Its declared feature count must match
    /// the term layout.
    pub fn with_predictor(mut self, predictor: &'a dyn Predictor) -> Result<Self> {
        if predictor.num_features() != self.term_layout.len() {
            return Err(EnumError::FeatureCountMismatch {
                expected: predictor.num_features(),
                got: self.term_layout.len(),
            });
        }
        self.predictor = Some(predictor);
        Ok(self)
    }

    /// Attach a joint tuple predictor. Its declared feature count must
    /// match the tuple layout.
    pub fn with_tuple_predictor(mut self, predictor: &'a dyn Predictor) -> Result<Self> {
        let layout = FeatureLayout::tuple();
        if predictor.num_features() != layout.len() {
            return Err(EnumError::FeatureCountMismatch {
                expected: predictor.num_features(),
                got: layout.len(),
            });
        }
        self.tuple_predictor = Some(predictor);
        self.tuple_layout = Some(layout);
        Ok(self)
    }
}

/// Where the base candidate lists come from.
pub enum ProducerSource<'p> {
    /// All ground terms of each variable's sort.
    Database {
        /// Skip terms containing instantiation constants.
        exclude_inst_constants: bool,
    },
    /// The relevant-domain term lists.
    RelevantDomain,
    /// A user-attached term pool.
    Pool {
        /// Pool store to read from.
        pools: &'p dyn TermPools,
        /// The pool attached to the quantifier.
        pool: TermId,
    },
}

/// Judge verdict on an attempted tuple.
pub enum Verdict {
    /// The instantiation was kept; the session ends.
    Success,
    /// The instantiation was rejected. A non-empty mask blames the variable
    /// positions that caused the failure and prunes their signature; an
    /// empty mask records nothing.
    Failure(Vec<bool>),
}

fn base_producer<'p>(
    quantifier: TermId,
    source: ProducerSource<'p>,
) -> Box<dyn TermProducer + 'p> {
    match source {
        ProducerSource::Database {
            exclude_inst_constants,
        } => Box::new(BasicTermProducer::new(quantifier, exclude_inst_constants)),
        ProducerSource::RelevantDomain => Box::new(RelevantDomainProducer::new(quantifier)),
        ProducerSource::Pool { pools, pool } => Box::new(PoolTermProducer::new(pools, pool)),
    }
}

/// Build the enumerator for one session: best-first when a tuple predictor
/// is configured or explicitly requested, staged otherwise, over the
/// producer chain the configuration asks for.
pub fn build_enumerator<'s>(
    cx: &SessionContext<'s>,
    env: &EnumeratorEnv,
    quantifier: TermId,
    source: ProducerSource<'s>,
) -> Result<Box<dyn TermTupleEnumerator + 's>> {
    if matches!(source, ProducerSource::RelevantDomain) && cx.relevant_domain.is_none() {
        return Err(EnumError::MissingRelevantDomain);
    }
    let variable_count = cx.tm.num_bound_vars(quantifier);
    let base = EnumeratorBase::new(quantifier, variable_count, env.clone());

    let use_astar = env.prefer_astar || cx.tuple_predictor.is_some();
    if use_astar {
        if cx.predictor.is_none() && cx.tuple_predictor.is_none() {
            return Err(EnumError::PredictorRequired);
        }
        // the best-first heuristic reads scores in the learned producer's
        // index space, so the learned producer stays outermost and any
        // randomization happens inside it
        let mut inner = base_producer(quantifier, source);
        if let Some(probability) = env.rnd_probability {
            inner = Box::new(RandomizeProducer::new(inner, probability, env.rnd_distance));
        }
        let learned = LearnedProducer::new(inner, quantifier, env.ml_threshold);
        return Ok(Box::new(AStarTupleEnumerator::new(base, learned)));
    }

    let mut chain = base_producer(quantifier, source);
    if cx.predictor.is_some() {
        chain = Box::new(LearnedProducer::new(chain, quantifier, env.ml_threshold));
    }
    if let Some(probability) = env.rnd_probability {
        chain = Box::new(RandomizeProducer::new(chain, probability, env.rnd_distance));
    }
    Ok(Box::new(StagedTupleEnumerator::new(base, chain)))
}

/// Drive one enumeration session for `quantifier`.
///
/// Tuples are completed (placeholders replaced by each sort's canonical
/// term), optionally registered, and handed to `judge` until it accepts
/// one or the index space is exhausted. Returns the accepted tuple, or
/// `None` on exhaustion or when a variable has no candidates under strict
/// effort.
pub fn run_session<'s>(
    cx: &mut SessionContext<'s>,
    env: &EnumeratorEnv,
    quantifier: TermId,
    source: ProducerSource<'s>,
    mut judge: impl FnMut(&[TermId]) -> Verdict,
) -> Result<Option<Vec<TermId>>> {
    cx.stats.sessions += 1;
    let mut enumerator = build_enumerator(cx, env, quantifier, source)?;
    enumerator.init(cx)?;

    let logging = env.logging || cx.predictor.is_some() || cx.tuple_predictor.is_some();
    let variable_count = cx.tm.num_bound_vars(quantifier);
    let mut tuple = Vec::with_capacity(variable_count);

    while enumerator.has_next(cx) {
        enumerator.next(&mut tuple);
        cx.stats.tuples_emitted += 1;

        let completed: Vec<TermId> = tuple
            .iter()
            .enumerate()
            .map(|(var_ix, term)| match term {
                Some(t) => *t,
                None => {
                    let sort = cx.tm.sort_of(cx.tm.bound_vars(quantifier)[var_ix]);
                    cx.db.term_for_sort(sort)
                }
            })
            .collect();
        if logging {
            cx.registry.register_attempt(quantifier, &completed);
        }
        tracing::trace!(?completed, "attempting instantiation");

        match judge(&completed) {
            Verdict::Success => {
                if logging {
                    cx.registry.register_outcome(quantifier, &completed, true);
                }
                return Ok(Some(completed));
            }
            Verdict::Failure(mask) => {
                if logging {
                    cx.registry.register_outcome(quantifier, &completed, false);
                }
                if !mask.is_empty() {
                    enumerator.failure_reason(&mask);
                }
            }
        }
    }
    Ok(None)
}
