//! Randomizing producer decorator.

use rand::Rng;

use crate::ast::TermId;
use crate::error::Result;
use crate::producer::TermProducer;
use crate::session::SessionContext;

/// Decorator that permutes each variable's candidate list.
///
/// Walking the list left to right, each position is swapped forward with
/// probability `probability`; the swap distance is drawn geometrically with
/// continuation parameter `distance`, and `distance == 0` swaps with the
/// immediate neighbor. The result is always a bijection, and the identity
/// when `probability == 0`.
pub struct RandomizeProducer<'a> {
    inner: Box<dyn TermProducer + 'a>,
    probability: f64,
    distance: f64,
    permutations: Vec<Vec<usize>>,
}

impl<'a> RandomizeProducer<'a> {
    /// Wrap `inner` with the given swap probability and distance parameter.
    pub fn new(inner: Box<dyn TermProducer + 'a>, probability: f64, distance: f64) -> Self {
        Self {
            inner,
            probability,
            distance,
            permutations: Vec::new(),
        }
    }

    fn randomize_permutation(&self, cx: &mut SessionContext<'_>, count: usize) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..count).collect();
        let immediate = self.distance == 0.0;
        let mut i = 0;
        while i < count {
            if cx.rng.random::<f64>() >= self.probability {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            if !immediate {
                while cx.rng.random::<f64>() < self.distance && j < count {
                    j += 1;
                }
            }
            if j < count {
                perm.swap(i, j);
            }
            i = j + 1;
        }
        perm
    }
}

impl TermProducer for RandomizeProducer<'_> {
    fn prepare_terms(&mut self, cx: &mut SessionContext<'_>, var_ix: usize) -> usize {
        let count = self.inner.prepare_terms(cx, var_ix);
        let perm = self.randomize_permutation(cx, count);
        if self.permutations.len() <= var_ix {
            self.permutations.resize(var_ix + 1, Vec::new());
        }
        self.permutations[var_ix] = perm;
        count
    }

    fn term(&self, var_ix: usize, ix: usize) -> TermId {
        self.inner.term(var_ix, self.permutations[var_ix][ix])
    }

    fn term_original(&self, var_ix: usize, ix: usize) -> TermId {
        self.inner.term_original(var_ix, ix)
    }

    fn initialize(&mut self, cx: &mut SessionContext<'_>) -> Result<()> {
        self.inner.initialize(cx)
    }
}
