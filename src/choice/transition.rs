//! Ordered categorical parameter with local transitions.

use crate::choice::{BaseChoice, Candidate, Candidates};
use crate::discretization::{self, softmax};
use crate::error::{Error, Result};
use crate::parameter::{Array, ParamId, Parameter};
use crate::rng_util;
use crate::types::{ChoiceKind, Descriptors};
use crate::value::{Value, ValueHash};

/// Ordered categorical parameter, moving between neighbouring candidates.
///
/// The selected index is encoded as a continuous `position`: the real line
/// is cut into `arity` bins of equal standard-normal mass, so a position
/// drawn from `N(0, 1)` selects a uniformly distributed index.
///
/// On mutation, a step size is drawn from the softmax of the `transitions`
/// weights (the first weight is the probability of staying, the second of
/// moving one step, and so on) and a direction is drawn with equal
/// probabilities. Steps stop at the first and last candidates. Only the
/// candidate selected after the step is mutated.
///
/// # Examples
///
/// ```
/// use parametrize::choice::TransitionChoice;
/// use parametrize::parameter::Parameter;
/// use parametrize::Value;
///
/// let mut rng = fastrand::Rng::with_seed(0);
/// let mut size = TransitionChoice::new([8, 16, 32, 64]).unwrap();
/// size.set_value(&Value::Int(32)).unwrap();
/// assert_eq!(size.index(), 2);
///
/// size.mutate(&mut rng).unwrap();
/// assert!(size.index() < 4);
/// ```
#[derive(Debug)]
pub struct TransitionChoice {
    id: ParamId,
    choices: Candidates,
    position: Array,
    transitions: Array,
    frozen: bool,
}

/// Builder for [`TransitionChoice`].
#[derive(Debug)]
#[must_use]
pub struct TransitionChoiceBuilder {
    choices: Vec<Candidate>,
    transitions: Array,
}

impl TransitionChoiceBuilder {
    /// Sets the transition weights (default `[1.0, 1.0]`).
    pub fn transitions(mut self, transitions: impl Into<Array>) -> Self {
        self.transitions = transitions.into();
        self
    }

    /// Builds the choice, starting at the middle bin.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyChoices` if there is no candidate and
    /// `Error::InvalidTransitions` if the transitions are not a non-empty vector.
    pub fn build(self) -> Result<TransitionChoice> {
        if self.transitions.is_empty() || self.transitions.shape().len() != 1 {
            return Err(Error::InvalidTransitions);
        }
        Ok(TransitionChoice {
            id: ParamId::new(),
            choices: Candidates::new(self.choices)?,
            position: Array::scalar(0.0),
            transitions: self.transitions,
            frozen: false,
        })
    }
}

impl TransitionChoice {
    /// Creates an ordered choice with the default transitions.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyChoices` if `choices` is empty.
    pub fn new<I, C>(choices: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        Self::builder(choices).build()
    }

    /// Starts configuring an ordered choice over `choices`.
    pub fn builder<I, C>(choices: I) -> TransitionChoiceBuilder
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        TransitionChoiceBuilder {
            choices: choices.into_iter().map(Into::into).collect(),
            transitions: Array::from_values(vec![1.0, 1.0]),
        }
    }

    /// The candidate set.
    #[must_use]
    pub fn choices(&self) -> &Candidates {
        &self.choices
    }

    /// The nested parameter at `index`, mutably. `None` for constants.
    pub fn parameter_mut(&mut self, index: usize) -> Option<&mut dyn Parameter> {
        self.choices.parameter_mut(index)
    }

    /// Number of candidates.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.choices.len()
    }

    /// The continuous encoding of the index.
    #[must_use]
    pub fn position(&self) -> &Array {
        &self.position
    }

    /// The weights used to draw the step size.
    #[must_use]
    pub fn transitions(&self) -> &Array {
        &self.transitions
    }

    /// Index of the selected candidate.
    #[must_use]
    pub fn index(&self) -> usize {
        discretization::index_of(self.position.data()[0], self.arity())
    }

    /// Returns an independent copy.
    #[must_use]
    pub fn spawn_child(&self) -> Self {
        Self {
            id: ParamId::new(),
            choices: self.choices.spawn(),
            position: self.position.spawn_child(),
            transitions: self.transitions.spawn_child(),
            frozen: false,
        }
    }

    fn set_index(&mut self, index: usize) -> Result<()> {
        let position = discretization::position_for(index, self.arity());
        self.position.assign(&[position])
    }

    fn check_frozen(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::Frozen { name: self.name() });
        }
        Ok(())
    }
}

impl Parameter for TransitionChoice {
    fn id(&self) -> ParamId {
        self.id
    }

    fn name(&self) -> String {
        "TransitionChoice".to_owned()
    }

    fn value(&mut self, rng: &mut fastrand::Rng) -> Value {
        let index = self.index();
        self.choices.value_at(index, rng)
    }

    fn set_value(&mut self, value: &Value) -> Result<()> {
        self.check_frozen()?;
        let indices = self.choices.find_indices(core::slice::from_ref(value))?;
        self.set_index(indices[0])
    }

    fn value_hash(&mut self, rng: &mut fastrand::Rng) -> ValueHash {
        let index = self.index();
        self.choices.value_hash(&[index], rng)
    }

    fn mutate(&mut self, rng: &mut fastrand::Rng) -> Result<()> {
        self.check_frozen()?;
        let mut transitions = self.transitions.clone();
        transitions.mutate(rng)?;
        let probabilities = softmax(transitions.data());
        let step = rng_util::categorical(rng, &probabilities);
        let forward = rng.bool();
        let current = self.index();
        let last = self.arity() - 1;
        let index = if forward {
            current.saturating_add(step).min(last)
        } else {
            current.saturating_sub(step)
        };
        self.choices.check_mutable(&[index])?;
        self.transitions = transitions;
        trace_debug!(id = %self.id, current, step, forward, index, "transition step");
        self.set_index(index)?;
        self.choices.mutate_at(index, rng)
    }

    fn spawn_boxed(&self) -> Box<dyn Parameter> {
        Box::new(self.spawn_child())
    }

    fn dimension(&self) -> usize {
        self.choices.dimension() + self.position.dimension() + self.transitions.dimension()
    }

    fn standardized_data(&self) -> Vec<f64> {
        let mut data = self.choices.standardized_data();
        data.extend(self.position.standardized_data());
        data.extend(self.transitions.standardized_data());
        data
    }

    fn set_standardized_data(
        &mut self,
        data: &[f64],
        rng: &mut fastrand::Rng,
        deterministic: bool,
    ) -> Result<()> {
        self.check_frozen()?;
        let expected = self.dimension();
        if data.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                got: data.len(),
            });
        }
        let (nested, rest) = data.split_at(self.choices.dimension());
        let (position, transitions) = rest.split_at(self.position.dimension());
        self.choices
            .set_standardized_data(nested, rng, deterministic)?;
        self.position
            .set_standardized_data(position, rng, deterministic)?;
        self.transitions
            .set_standardized_data(transitions, rng, deterministic)
    }

    fn descriptors(&self) -> Descriptors {
        let own = Descriptors {
            deterministic: true,
            continuous: false,
            ordered: true,
        };
        own & self.choices.descriptors()
    }

    fn freeze(&mut self) {
        self.frozen = true;
        self.position.freeze();
        self.transitions.freeze();
        self.choices.freeze();
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl BaseChoice for TransitionChoice {
    fn choices(&self) -> &Candidates {
        &self.choices
    }

    fn kind(&self) -> ChoiceKind {
        ChoiceKind::Ordered
    }

    fn selected_indices(&mut self, _rng: &mut fastrand::Rng) -> Vec<usize> {
        vec![self.index()]
    }
}
