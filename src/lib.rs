//! Term-tuple enumeration for enumerative quantifier instantiation.
//!
//! Given a universally quantified formula and a candidate list of ground
//! terms per bound variable, this crate enumerates candidate instantiation
//! tuples for a surrounding solver to try: either in staged lexicographic
//! order (cheap tuples first) or best-first under a learned scoring model.
//! Failed attempts can be blamed on a subset of variable positions, and
//! every later tuple subsumed by a failed signature is pruned.
//!
//! # Example
//!
//! ```
//! use quantenum::{
//!     run_session, EnumeratorEnv, InMemoryTermDb, ProducerSource, SessionContext,
//!     TermManager, Verdict,
//! };
//!
//! let mut tm = TermManager::new();
//! let u = tm.sorts.declare("U");
//! let x = tm.mk_bound_var("x", u);
//! let body = tm.mk_eq(x, x);
//! let q = tm.mk_forall(vec![x], body);
//!
//! let mut db = InMemoryTermDb::new();
//! let a = tm.mk_var("a", u);
//! let b = tm.mk_var("b", u);
//! db.add_term(&tm, a);
//! db.add_term(&tm, b);
//!
//! let mut cx = SessionContext::new(&tm, &db);
//! let env = EnumeratorEnv::default();
//! let source = ProducerSource::Database { exclude_inst_constants: false };
//! let found = run_session(&mut cx, &env, q, source, |tuple| {
//!     if tuple[0] == b {
//!         Verdict::Success
//!     } else {
//!         Verdict::Failure(vec![])
//!     }
//! })
//! .unwrap();
//! assert_eq!(found, Some(vec![b]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod features;
pub mod index_trie;
pub mod predict;
pub mod producer;
pub mod registry;
pub mod session;

pub use ast::{SortId, Term, TermId, TermKind, TermManager};
pub use config::{EnumeratorEnv, StageStrategy};
pub use enumerate::{
    AStarTupleEnumerator, IndexTuple, StagedTupleEnumerator, TermTupleEnumerator,
};
pub use error::{EnumError, Result};
pub use features::{
    featurize_quantifier, featurize_term, FeatureLayout, FeatureVector, Featurize,
};
pub use index_trie::IndexTrie;
pub use predict::{
    sigmoid, BoostedTreesPredictor, ConstantPredictor, Predictor, SigmoidPredictor, TreeNode,
};
pub use producer::{
    BasicTermProducer, InMemoryTermDb, LearnedProducer, PoolTermProducer, RandomizeProducer,
    RelevantDomain, RelevantDomainProducer, TermDb, TermPools, TermProducer,
};
pub use registry::{QuantifierRegistry, TermCandidateInfo};
pub use session::{
    build_enumerator, run_session, EnumeratorStats, ProducerSource, SessionContext, Verdict,
};

/// Upper bound on tuple arity in the tuple feature layout. Variable blocks
/// past a quantifier's actual arity stay zero.
pub const MAX_TUPLE_VARIABLES: usize = 100;
