//! Error types for the enumeration engine.

/// Errors raised while composing or loading engine components.
///
/// In-session contract violations (out-of-range indices, lookups before
/// preparation, feature-vector overflow) are caller bugs and panic instead
/// of being reported here; see the panic sections of the individual methods.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnumError {
    /// The predictor declares a different feature count than the layout provides.
    #[error("predictor expects {expected} features but the layout provides {got}")]
    FeatureCountMismatch {
        /// Feature count declared by the predictor.
        expected: usize,
        /// Feature count of the configured layout.
        got: usize,
    },

    /// Best-first enumeration was requested without a term predictor.
    #[error("best-first enumeration requires a term predictor")]
    PredictorRequired,

    /// A relevant-domain producer was requested but no relevant domain is configured.
    #[error("no relevant domain configured")]
    MissingRelevantDomain,

    /// A predictor model could not be constructed from its parameters.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A predictor model could not be serialized or deserialized.
    #[error("model serialization error: {0}")]
    Serialization(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, EnumError>;
