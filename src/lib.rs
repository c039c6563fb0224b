#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Categorical parameters for black-box optimizers that search continuous
//! space. A [`Choice`] or [`TransitionChoice`] declares a discrete decision
//! over a set of candidates and maps it in and out of the flat standardized
//! vector that continuous optimizers mutate, so any continuous strategy can
//! search over discrete structures.
//!
//! # Getting Started
//!
//! ```
//! use parametrize::prelude::*;
//!
//! let mut rng = fastrand::Rng::with_seed(42);
//! let mut optimizer = Choice::new(["sgd", "adam", "rmsprop"]).unwrap();
//!
//! // Candidates are drawn lazily from the softmax of the weights
//! let drawn = optimizer.value(&mut rng);
//! assert!(matches!(drawn, Value::Str(_)));
//!
//! // Forcing a value resets the weights towards it
//! optimizer.set_value(&Value::from("adam")).unwrap();
//! assert_eq!(optimizer.index(&mut rng).unwrap(), 1);
//!
//! // Mutation perturbs the weights and redraws
//! optimizer.mutate(&mut rng).unwrap();
//! assert!(optimizer.index(&mut rng).unwrap() < 3);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Parameter`](parameter::Parameter) | A node of the parameter tree: value, mutation, spawning, standardized data. |
//! | [`Array`](parameter::Array) | Continuous leaf; backs weights and positions, usable as a candidate. |
//! | [`Choice`] | Unordered selection drawn from softmax weights, with optional repetitions. |
//! | [`TransitionChoice`] | Ordered selection moving by local steps. |
//! | [`Candidate`](choice::Candidate) | A constant value or a nested parameter offered by a choice. |
//! | [`discretization`] | The weight and threshold encodings between indices and real numbers. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on [`Value`], [`ValueHash`], [`Descriptors`] and [`ChoiceKind`] | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) on draws, resets and transitions | off |

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod choice;
pub mod discretization;
mod error;
pub mod parameter;
mod rng_util;
mod types;
mod value;

pub use choice::{BaseChoice, Choice, TransitionChoice};
pub use error::{Error, Result};
pub use types::{ChoiceKind, Descriptors};
pub use value::{Value, ValueHash};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use parametrize::prelude::*;
/// ```
pub mod prelude {
    pub use crate::choice::{
        BaseChoice, Candidate, Candidates, Choice, ChoiceBuilder, TransitionChoice,
        TransitionChoiceBuilder,
    };
    pub use crate::error::{Error, Result};
    pub use crate::parameter::{Array, ParamId, Parameter};
    pub use crate::types::{ChoiceKind, Descriptors};
    pub use crate::value::{Value, ValueHash};
}
