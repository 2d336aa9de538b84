//! Candidate term producers.
//!
//! A [`TermProducer`] owns, for one quantifier, the ordered candidate lists
//! the tuple enumerators index into. Base producers pull terms from a
//! ground-term database, a relevant-domain analysis or a user pool;
//! decorators ([`RandomizeProducer`](crate::producer::RandomizeProducer),
//! [`LearnedProducer`](crate::producer::LearnedProducer)) reorder an inner
//! producer without changing its contents.

mod basic;
mod learned;
mod randomize;

pub use basic::{BasicTermProducer, PoolTermProducer, RelevantDomainProducer};
pub use learned::LearnedProducer;
pub use randomize::RandomizeProducer;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{SortId, TermId, TermManager};
use crate::error::Result;
use crate::session::SessionContext;

/// Read-only view of the ground terms the surrounding solver knows.
pub trait TermDb {
    /// Number of ground terms of the given sort.
    fn num_ground_terms(&self, sort: SortId) -> usize;

    /// The `ix`-th ground term of the given sort, `ix <
    /// num_ground_terms(sort)`.
    fn ground_term(&self, sort: SortId, ix: usize) -> TermId;

    /// Canonical term of a sort, used to fill variables whose candidate
    /// list is empty under full effort. Implementations must be able to
    /// produce one for every sort the engine sees.
    fn term_for_sort(&self, sort: SortId) -> TermId;

    /// Congruence-class representative of a term. Defaults to the term
    /// itself (no equality information).
    fn representative(&self, term: TermId) -> TermId {
        term
    }

    /// Whether the term contains an instantiation constant. Such terms can
    /// be excluded from candidate lists.
    fn has_inst_constant(&self, _term: TermId) -> bool {
        false
    }
}

/// Per-quantifier relevant-domain analysis.
pub trait RelevantDomain {
    /// Relevant candidate terms for variable `var_ix` of `quantifier`.
    fn terms(&self, quantifier: TermId, var_ix: usize) -> &[TermId];
}

/// Named term pools attached to quantifiers by the user.
pub trait TermPools {
    /// Append the current contents of `pool` for variable `var_ix` to
    /// `out`. Called on every preparation; pools may grow between sessions.
    fn collect(&self, pool: TermId, var_ix: usize, out: &mut Vec<TermId>);
}

/// Ordered candidate lists for the variables of one quantifier.
///
/// Protocol per session: `prepare_terms` once for every variable, then
/// `initialize` once, then any number of `term` lookups.
pub trait TermProducer {
    /// Build the candidate list for `var_ix` and return its length.
    fn prepare_terms(&mut self, cx: &mut SessionContext<'_>, var_ix: usize) -> usize;

    /// The `ix`-th candidate for `var_ix`, in this producer's order.
    ///
    /// # Panics
    ///
    /// Panics if the variable was not prepared or `ix` is out of range.
    fn term(&self, var_ix: usize, ix: usize) -> TermId;

    /// The `ix`-th candidate in the undecorated base order, for candidate
    /// registration. Decorators forward to their inner producer.
    fn term_original(&self, var_ix: usize, ix: usize) -> TermId {
        self.term(var_ix, ix)
    }

    /// One-time setup after every variable has been prepared.
    fn initialize(&mut self, _cx: &mut SessionContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Map-backed [`TermDb`] for embedders without a solver core, and for tests.
#[derive(Debug, Default)]
pub struct InMemoryTermDb {
    by_sort: FxHashMap<SortId, Vec<TermId>>,
    representatives: FxHashMap<TermId, TermId>,
    inst_constants: FxHashSet<TermId>,
    defaults: FxHashMap<SortId, TermId>,
}

impl InMemoryTermDb {
    /// Empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ground term. The first term added per sort becomes that sort's
    /// canonical term unless [`set_default`](Self::set_default) overrides it.
    pub fn add_term(&mut self, tm: &TermManager, term: TermId) {
        let sort = tm.sort_of(term);
        self.by_sort.entry(sort).or_default().push(term);
        self.defaults.entry(sort).or_insert(term);
    }

    /// Merge `term` into the congruence class of `representative`.
    pub fn set_representative(&mut self, term: TermId, representative: TermId) {
        self.representatives.insert(term, representative);
    }

    /// Mark a term as containing an instantiation constant.
    pub fn mark_inst_constant(&mut self, term: TermId) {
        self.inst_constants.insert(term);
    }

    /// Override the canonical term of a sort.
    pub fn set_default(&mut self, sort: SortId, term: TermId) {
        self.defaults.insert(sort, term);
    }
}

impl TermDb for InMemoryTermDb {
    fn num_ground_terms(&self, sort: SortId) -> usize {
        self.by_sort.get(&sort).map_or(0, Vec::len)
    }

    fn ground_term(&self, sort: SortId, ix: usize) -> TermId {
        self.by_sort[&sort][ix]
    }

    fn term_for_sort(&self, sort: SortId) -> TermId {
        *self
            .defaults
            .get(&sort)
            .expect("no canonical term registered for sort")
    }

    fn representative(&self, term: TermId) -> TermId {
        self.representatives.get(&term).copied().unwrap_or(term)
    }

    fn has_inst_constant(&self, term: TermId) -> bool {
        self.inst_constants.contains(&term)
    }
}
