//! Core descriptor types shared by all parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Structural properties of a parameter, used by optimizers to pick a strategy.
///
/// Descriptors of a composite parameter are the conjunction (`&`) of its own
/// descriptors and those of everything it contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Descriptors {
    /// Whether reading the value involves no random draw.
    pub deterministic: bool,
    /// Whether the value varies continuously with the standardized data.
    pub continuous: bool,
    /// Whether neighbouring standardized values map to neighbouring values.
    pub ordered: bool,
}

impl Default for Descriptors {
    fn default() -> Self {
        Self {
            deterministic: true,
            continuous: true,
            ordered: true,
        }
    }
}

impl core::ops::BitAnd for Descriptors {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self {
            deterministic: self.deterministic && rhs.deterministic,
            continuous: self.continuous && rhs.continuous,
            ordered: self.ordered && rhs.ordered,
        }
    }
}

/// The closed set of choice variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChoiceKind {
    /// Weight-driven categorical selection.
    Unordered {
        /// Whether indices are decoded by argmax instead of sampling.
        deterministic: bool,
        /// Number of independent draws, if explicitly requested.
        repetitions: Option<usize>,
    },
    /// Position-driven selection with local transitions.
    Ordered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_conjunction() {
        let choice = Descriptors {
            deterministic: false,
            continuous: true,
            ordered: false,
        };
        let combined = choice & Descriptors::default();
        assert_eq!(combined, choice);
        let ordered = Descriptors {
            deterministic: true,
            continuous: false,
            ordered: true,
        };
        assert_eq!(
            choice & ordered,
            Descriptors {
                deterministic: false,
                continuous: false,
                ordered: false,
            }
        );
    }
}
