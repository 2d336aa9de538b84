//! Enumeration session options.

/// Staging strategy for the lexicographic enumerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStrategy {
    /// Stage `s` contains tuples whose maximum digit is `s`.
    #[default]
    Max,
    /// Stage `s` contains tuples whose digit sum is `s`.
    Sum,
}

/// Per-session options of the enumeration engine.
///
/// The defaults reproduce the plain staged enumerator: max staging, strict
/// effort, no reordering, no randomization, no candidate cap.
#[derive(Debug, Clone)]
pub struct EnumeratorEnv {
    /// Full effort: variables with empty candidate lists get a placeholder
    /// (`None` in the emitted tuple) instead of aborting the session.
    pub full_effort: bool,
    /// Staging strategy for the staged enumerator.
    pub stage_strategy: StageStrategy,
    /// Register attempts and outcomes with the quantifier registry.
    ///
    /// Implied whenever a predictor is configured, since candidate
    /// bookkeeping feeds the feature scalars.
    pub logging: bool,
    /// Binarize learned scores: predictions at or above the threshold
    /// become 1, the rest 0. `None` keeps raw scores.
    pub ml_threshold: Option<f64>,
    /// Swap probability of the randomizing producer; `None` disables it.
    pub rnd_probability: Option<f64>,
    /// Geometric forward-distance parameter of the randomizing producer.
    /// 0 swaps with the immediate neighbor only.
    pub rnd_distance: f64,
    /// Uniform cap on per-variable candidate list length.
    pub candidate_limit: Option<usize>,
    /// Force best-first enumeration even without a joint tuple predictor.
    pub prefer_astar: bool,
}

impl Default for EnumeratorEnv {
    fn default() -> Self {
        Self {
            full_effort: false,
            stage_strategy: StageStrategy::Max,
            logging: false,
            ml_threshold: None,
            rnd_probability: None,
            rnd_distance: 0.0,
            candidate_limit: None,
            prefer_astar: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_env() {
        let env = EnumeratorEnv::default();
        assert!(!env.full_effort);
        assert_eq!(env.stage_strategy, StageStrategy::Max);
        assert!(env.rnd_probability.is_none());
        assert!(env.candidate_limit.is_none());
    }
}
