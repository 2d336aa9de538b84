//! Feature extraction for learned term ordering.
//!
//! A feature vector describes a (quantifier, candidate term) pair, or a whole
//! candidate tuple, as a flat `f64` slice: dense bag-of-kinds histograms
//! followed by a handful of bookkeeping scalars. The slot order is fixed by a
//! [`FeatureLayout`] so that a trained model and the extractor agree on
//! positions.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{TermId, TermKind, TermManager};
use crate::registry::TermCandidateInfo;
use crate::MAX_TUPLE_VARIABLES;

/// Number of scalar slots appended after a term's kind histogram.
pub(crate) const TERM_SCALARS: usize = 6;

/// Names and length of a feature-vector layout.
///
/// Layouts are plain values; build one per session (or share one by
/// reference) rather than keeping a global.
#[derive(Debug, Clone)]
pub struct FeatureLayout {
    names: Vec<String>,
}

impl FeatureLayout {
    /// Layout for scoring a single candidate term: the quantifier's kind
    /// histogram, the term's kind histogram, then the bookkeeping scalars.
    pub fn term() -> Self {
        let mut names = Vec::with_capacity(2 * TermKind::COUNT + TERM_SCALARS);
        for kind in TermKind::ALL {
            names.push(format!("q_{}", kind.name()));
        }
        for kind in TermKind::ALL {
            names.push(format!("t_{}", kind.name()));
        }
        for scalar in Self::SCALAR_NAMES {
            names.push(scalar.to_string());
        }
        Self { names }
    }

    /// Layout for scoring a whole tuple: the quantifier's kind histogram
    /// followed by one term block per variable position, up to
    /// [`MAX_TUPLE_VARIABLES`]. Positions beyond the tuple's arity stay zero.
    pub fn tuple() -> Self {
        let per_var = TermKind::COUNT + TERM_SCALARS;
        let mut names = Vec::with_capacity(TermKind::COUNT + MAX_TUPLE_VARIABLES * per_var);
        for kind in TermKind::ALL {
            names.push(format!("q_{}", kind.name()));
        }
        for var_ix in 0..MAX_TUPLE_VARIABLES {
            for kind in TermKind::ALL {
                names.push(format!("t{}_{}", var_ix, kind.name()));
            }
            for scalar in Self::SCALAR_NAMES {
                names.push(format!("t{}_{}", var_ix, scalar));
            }
        }
        Self { names }
    }

    const SCALAR_NAMES: [&'static str; TERM_SCALARS] =
        ["var_frequency", "age", "phase", "relevant", "depth", "tried"];

    /// Total number of slots.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the layout has no slots.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slot names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Populated length of a tuple layout for a given arity: histogram plus
    /// `var_count` term blocks.
    pub fn prefix_len(var_count: usize) -> usize {
        assert!(var_count <= MAX_TUPLE_VARIABLES, "tuple arity over the layout limit");
        TermKind::COUNT + var_count * (TermKind::COUNT + TERM_SCALARS)
    }
}

/// Append-only feature buffer with checkpoint markers.
///
/// `push` records the current length; `pop` truncates back to the most
/// recent marker. The learned producer uses this to share the quantifier
/// prefix across per-term extractions.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    values: Vec<f64>,
    markers: Vec<usize>,
    capacity: usize,
}

impl FeatureVector {
    /// Empty vector sized for `layout`.
    pub fn new(layout: &FeatureLayout) -> Self {
        Self {
            values: Vec::with_capacity(layout.len()),
            markers: Vec::new(),
            capacity: layout.len(),
        }
    }

    /// Whether every slot of the layout has been written.
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Append one value.
    ///
    /// # Panics
    ///
    /// Panics when the vector is already full.
    pub fn add_value(&mut self, value: f64) {
        assert!(!self.is_full(), "feature vector overflow");
        self.values.push(value);
    }

    /// Record a checkpoint at the current length.
    pub fn push(&mut self) {
        self.markers.push(self.values.len());
    }

    /// Truncate back to the most recent checkpoint.
    ///
    /// # Panics
    ///
    /// Panics when no checkpoint is recorded.
    pub fn pop(&mut self) {
        let mark = self.markers.pop().expect("feature vector marker underflow");
        self.values.truncate(mark);
    }

    /// Zero-fill the remaining slots up to the layout length.
    pub fn pad(&mut self) {
        self.values.resize(self.capacity, 0.0);
    }

    /// The values written so far.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Bag-of-kinds counter over a term DAG.
///
/// Kind counts are memoized by term identity, so a shared subterm is counted
/// once. Bound-variable position counts are deliberately *not* memoized:
/// every DAG edge to a bound variable counts, which is what makes the
/// frequency a usage measure rather than a presence bit.
#[derive(Debug)]
pub struct Featurize {
    track_bound_variables: bool,
    frequencies: [u32; TermKind::COUNT],
    bound_frequencies: Vec<u32>,
    bound_positions: FxHashMap<TermId, usize>,
    visited: FxHashSet<TermId>,
    quantifier: Option<TermId>,
}

impl Featurize {
    /// New counter; with `track_bound_variables` set, counting a quantifier
    /// root also accumulates per-position bound-variable frequencies.
    pub fn new(track_bound_variables: bool) -> Self {
        Self {
            track_bound_variables,
            frequencies: [0; TermKind::COUNT],
            bound_frequencies: Vec::new(),
            bound_positions: FxHashMap::default(),
            visited: FxHashSet::default(),
            quantifier: None,
        }
    }

    /// Accumulate counts for `term` and everything below it.
    ///
    /// # Panics
    ///
    /// With bound-variable tracking enabled, panics if two distinct
    /// quantifiers are counted through the same instance; positional counts
    /// are only meaningful against a single variable list.
    pub fn count(&mut self, tm: &TermManager, term: TermId) {
        if self.track_bound_variables && tm.kind(term) == TermKind::Forall {
            assert!(
                self.quantifier.is_none() || self.quantifier == Some(term),
                "bound-variable tracking is limited to a single quantifier"
            );
            if self.quantifier.is_none() {
                self.quantifier = Some(term);
                let vars = tm.bound_vars(term);
                self.bound_frequencies = vec![0; vars.len()];
                for (ix, &v) in vars.iter().enumerate() {
                    self.bound_positions.insert(v, ix);
                }
            }
        }

        let mut stack = vec![term];
        while let Some(current) = stack.pop() {
            self.touch(tm, current);
            if !self.visited.insert(current) {
                continue;
            }
            self.frequencies[tm.kind(current).index()] += 1;
            stack.extend(tm.children(current).iter().copied());
        }
    }

    // Runs on every edge, before the visited check.
    fn touch(&mut self, tm: &TermManager, term: TermId) {
        if !self.track_bound_variables || tm.kind(term) != TermKind::BoundVar {
            return;
        }
        if let Some(&ix) = self.bound_positions.get(&term) {
            self.bound_frequencies[ix] += 1;
        }
    }

    /// Count of unique subterms with the given kind.
    pub fn frequency(&self, kind: TermKind) -> u32 {
        self.frequencies[kind.index()]
    }

    /// Per-position bound-variable occurrence counts (DAG edges, not unique
    /// nodes). Empty unless a quantifier was counted with tracking enabled.
    pub fn bound_frequencies(&self) -> &[u32] {
        &self.bound_frequencies
    }
}

/// Append the quantifier's kind histogram to `vec`.
pub fn featurize_quantifier(vec: &mut FeatureVector, quantifier_features: &Featurize) {
    for kind in TermKind::ALL {
        vec.add_value(f64::from(quantifier_features.frequency(kind)));
    }
}

/// Append a candidate term's kind histogram and bookkeeping scalars to `vec`.
///
/// `var_ix` selects the bound-variable frequency from the quantifier's
/// counts; `info` supplies the registry scalars for this candidate.
pub fn featurize_term(
    vec: &mut FeatureVector,
    tm: &TermManager,
    term: TermId,
    var_ix: usize,
    info: &TermCandidateInfo,
    quantifier_features: &Featurize,
) {
    let mut tf = Featurize::new(false);
    tf.count(tm, term);
    for kind in TermKind::ALL {
        vec.add_value(f64::from(tf.frequency(kind)));
    }
    let var_frequency = quantifier_features
        .bound_frequencies()
        .get(var_ix)
        .copied()
        .unwrap_or(0);
    vec.add_value(f64::from(var_frequency));
    vec.add_value(info.age as f64);
    vec.add_value(info.phase as f64);
    vec.add_value(if info.relevant { 1.0 } else { 0.0 });
    vec.add_value(f64::from(tm.depth(term)));
    vec.add_value(info.tried as f64);
}
