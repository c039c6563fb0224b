#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a choice is constructed without any candidate.
    #[error("choices cannot be empty")]
    EmptyChoices,

    /// Returned when the repetitions count of a choice is zero.
    #[error("invalid repetitions: {0} must be at least 1")]
    InvalidRepetitions(usize),

    /// Returned when the transition weights of an ordered choice are empty.
    #[error("transition weights must be a non-empty vector")]
    InvalidTransitions,

    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when the mutation scale is not strictly positive.
    #[error("invalid sigma: {0} must be positive")]
    InvalidSigma(f64),

    /// Returned when no candidate of a choice accepts an assigned value.
    #[error("could not find a candidate accepting value {value}")]
    NoMatchingCandidate {
        /// Display form of the rejected value.
        value: String,
    },

    /// Returned when a parameter rejects a value of the wrong kind or shape.
    #[error("value mismatch: expected {expected}, got {got}")]
    ValueMismatch {
        /// Description of what the parameter accepts.
        expected: &'static str,
        /// Display form of the rejected value.
        got: String,
    },

    /// Returned when an assigned value lies outside the parameter bounds.
    #[error("value {value} is outside bounds [{low}, {high}]")]
    OutOfBounds {
        /// The rejected value.
        value: f64,
        /// The lower bound.
        low: f64,
        /// The upper bound.
        high: f64,
    },

    /// Returned when a frozen parameter is modified.
    #[error("cannot modify frozen parameter {name}")]
    Frozen {
        /// The name of the frozen parameter.
        name: String,
    },

    /// Returned when the number of values or indices does not match the repetitions.
    #[error("repetition mismatch: expected {expected} values, got {got}")]
    RepetitionMismatch {
        /// The expected number of values.
        expected: usize,
        /// The actual number of values provided.
        got: usize,
    },

    /// Returned when standardized data or weights have the wrong length.
    #[error("dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch {
        /// The expected length.
        expected: usize,
        /// The actual length.
        got: usize,
    },
}

/// A convenience type alias for `Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Whether this error means "this candidate does not take that value".
    ///
    /// Trial assignment skips such candidates and moves on to the next one.
    pub(crate) fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ValueMismatch { .. }
                | Self::OutOfBounds { .. }
                | Self::RepetitionMismatch { .. }
                | Self::NoMatchingCandidate { .. }
        )
    }
}
