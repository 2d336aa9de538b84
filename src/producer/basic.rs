//! Base term producers: database-backed, relevant-domain and pool-backed.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{SortId, TermId};
use crate::producer::{TermPools, TermProducer};
use crate::session::SessionContext;

/// Candidate lists drawn from the ground-term database, one list per sort.
///
/// Terms are deduplicated by congruence representative, keeping the first
/// term of each class. Same-sort variables share one cached list.
#[derive(Debug)]
pub struct BasicTermProducer {
    quantifier: TermId,
    exclude_inst_constants: bool,
    lists: Vec<Vec<TermId>>,
    sort_cache: FxHashMap<SortId, Vec<TermId>>,
}

impl BasicTermProducer {
    /// Producer for the given quantifier; with `exclude_inst_constants`,
    /// terms containing instantiation constants are skipped.
    pub fn new(quantifier: TermId, exclude_inst_constants: bool) -> Self {
        Self {
            quantifier,
            exclude_inst_constants,
            lists: Vec::new(),
            sort_cache: FxHashMap::default(),
        }
    }
}

impl TermProducer for BasicTermProducer {
    fn prepare_terms(&mut self, cx: &mut SessionContext<'_>, var_ix: usize) -> usize {
        let sort = cx.tm.sort_of(cx.tm.bound_vars(self.quantifier)[var_ix]);
        if !self.sort_cache.contains_key(&sort) {
            let mut list = Vec::new();
            let mut seen = FxHashSet::default();
            for ix in 0..cx.db.num_ground_terms(sort) {
                let term = cx.db.ground_term(sort, ix);
                if self.exclude_inst_constants && cx.db.has_inst_constant(term) {
                    continue;
                }
                if seen.insert(cx.db.representative(term)) {
                    list.push(term);
                }
            }
            tracing::trace!(?sort, terms = list.len(), "collected ground terms");
            self.sort_cache.insert(sort, list);
        }
        if self.lists.len() <= var_ix {
            self.lists.resize(var_ix + 1, Vec::new());
        }
        self.lists[var_ix] = self.sort_cache[&sort].clone();
        self.lists[var_ix].len()
    }

    fn term(&self, var_ix: usize, ix: usize) -> TermId {
        self.lists[var_ix][ix]
    }
}

/// Candidate lists taken verbatim from the relevant-domain analysis.
#[derive(Debug)]
pub struct RelevantDomainProducer {
    quantifier: TermId,
    lists: Vec<Vec<TermId>>,
}

impl RelevantDomainProducer {
    /// Producer reading `cx.relevant_domain` for the given quantifier.
    pub fn new(quantifier: TermId) -> Self {
        Self {
            quantifier,
            lists: Vec::new(),
        }
    }
}

impl TermProducer for RelevantDomainProducer {
    fn prepare_terms(&mut self, cx: &mut SessionContext<'_>, var_ix: usize) -> usize {
        let rd = cx
            .relevant_domain
            .expect("no relevant domain configured");
        let list = rd.terms(self.quantifier, var_ix).to_vec();
        if self.lists.len() <= var_ix {
            self.lists.resize(var_ix + 1, Vec::new());
        }
        self.lists[var_ix] = list;
        self.lists[var_ix].len()
    }

    fn term(&self, var_ix: usize, ix: usize) -> TermId {
        self.lists[var_ix][ix]
    }
}

/// Candidate lists taken from a user-attached term pool.
///
/// Pool contents are re-collected on every preparation, so terms added to
/// the pool between sessions show up in the next session.
pub struct PoolTermProducer<'p> {
    pools: &'p dyn TermPools,
    pool: TermId,
    lists: Vec<Vec<TermId>>,
}

impl<'p> PoolTermProducer<'p> {
    /// Producer reading `pool` through the given pools interface.
    pub fn new(pools: &'p dyn TermPools, pool: TermId) -> Self {
        Self {
            pools,
            pool,
            lists: Vec::new(),
        }
    }
}

impl TermProducer for PoolTermProducer<'_> {
    fn prepare_terms(&mut self, _cx: &mut SessionContext<'_>, var_ix: usize) -> usize {
        if self.lists.len() <= var_ix {
            self.lists.resize(var_ix + 1, Vec::new());
        }
        self.lists[var_ix].clear();
        self.pools.collect(self.pool, var_ix, &mut self.lists[var_ix]);
        self.lists[var_ix].len()
    }

    fn term(&self, var_ix: usize, ix: usize) -> TermId {
        self.lists[var_ix][ix]
    }
}
