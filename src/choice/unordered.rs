//! Unordered categorical parameter driven by softmax weights.

use crate::choice::{BaseChoice, Candidate, Candidates};
use crate::discretization::{self, Encoder};
use crate::error::{Error, Result};
use crate::parameter::{Array, ParamId, Parameter};
use crate::types::{ChoiceKind, Descriptors};
use crate::value::{Value, ValueHash};

/// Indices drawn from the weights at a given weight generation.
#[derive(Clone, Debug)]
struct Drawn {
    generation: u64,
    indices: Vec<usize>,
}

/// Unordered categorical parameter, choosing one of its candidates at random.
///
/// Each repetition owns a row of weights; the selected candidate is drawn
/// from the softmax of that row, or taken as its argmax for deterministic
/// choices. The draw is delayed until the indices are first needed and is
/// redone whenever the weights change.
///
/// Candidates can be parameters themselves, in which case their value is
/// returned instead. Mutation only touches the weights and the candidates
/// that end up selected, leaving the others untouched.
///
/// Since the chosen value is drawn randomly, a non-deterministic choice makes
/// a deterministic objective look noisy.
///
/// # Examples
///
/// ```
/// use parametrize::choice::Choice;
/// use parametrize::parameter::Parameter;
/// use parametrize::Value;
///
/// let mut rng = fastrand::Rng::with_seed(42);
/// let mut choice = Choice::new(["a", "b", "c", "e"]).unwrap();
/// choice.set_value(&Value::from("c")).unwrap();
/// assert_eq!(choice.index(&mut rng).unwrap(), 2);
///
/// let mut triple = Choice::builder(["a", "b", "c", "e"])
///     .repetitions(3)
///     .build()
///     .unwrap();
/// assert_eq!(triple.indices(&mut rng).len(), 3);
/// ```
#[derive(Debug)]
pub struct Choice {
    id: ParamId,
    choices: Candidates,
    weights: Array,
    repetitions: Option<usize>,
    deterministic: bool,
    drawn: Option<Drawn>,
    frozen: bool,
}

/// Builder for [`Choice`].
///
/// # Examples
///
/// ```
/// use parametrize::choice::Choice;
///
/// let choice = Choice::builder([1, 2, 3])
///     .repetitions(2)
///     .deterministic(true)
///     .build()
///     .unwrap();
/// assert_eq!(choice.weights().shape(), &[2, 3]);
/// ```
#[derive(Debug)]
#[must_use]
pub struct ChoiceBuilder {
    choices: Vec<Candidate>,
    repetitions: Option<usize>,
    deterministic: bool,
    sigma: f64,
}

impl ChoiceBuilder {
    /// Draws `n` independent selections; the value becomes an `n`-tuple.
    pub fn repetitions(mut self, n: usize) -> Self {
        self.repetitions = Some(n);
        self
    }

    /// Always decodes the most likely candidate instead of sampling.
    pub fn deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    /// Mutation scale of the weights.
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Builds the choice.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyChoices` if there is no candidate,
    /// `Error::InvalidRepetitions` for zero repetitions and
    /// `Error::InvalidSigma` for a non-positive sigma.
    pub fn build(self) -> Result<Choice> {
        if self.repetitions == Some(0) {
            return Err(Error::InvalidRepetitions(0));
        }
        let choices = Candidates::new(self.choices)?;
        let rows = self.repetitions.unwrap_or(1);
        let weights = Array::zeros(&[rows, choices.len()]).with_sigma(self.sigma)?;
        Ok(Choice {
            id: ParamId::new(),
            choices,
            weights,
            repetitions: self.repetitions,
            deterministic: self.deterministic,
            drawn: None,
            frozen: false,
        })
    }
}

impl Choice {
    /// Creates a stochastic choice with a single repetition.
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

    /// Starts configuring a choice over `choices`.
    pub fn builder<I, C>(choices: I) -> ChoiceBuilder
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        ChoiceBuilder {
            choices: choices.into_iter().map(Into::into).collect(),
            repetitions: None,
            deterministic: false,
            sigma: 1.0,
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

    /// The weights used to draw the indices, shaped `[repetitions, arity]`.
    #[must_use]
    pub fn weights(&self) -> &Array {
        &self.weights
    }

    /// Number of candidates.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.choices.len()
    }

    /// The explicitly requested number of repetitions.
    #[must_use]
    pub fn repetitions(&self) -> Option<usize> {
        self.repetitions
    }

    /// Whether indices are decoded by argmax.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// Softmax probabilities of each weight row.
    #[must_use]
    pub fn probabilities(&self) -> Vec<Vec<f64>> {
        Encoder::from_rows(self.weights.data(), self.choices.arity()).probabilities()
    }

    /// Indices of the selected candidates, one per repetition.
    ///
    /// Drawn on first access after construction or after the weights changed.
    pub fn indices(&mut self, rng: &mut fastrand::Rng) -> &[usize] {
        let drawn = match self.drawn.take() {
            Some(drawn) if drawn.generation == self.weights.generation() => drawn,
            _ => self.decode(&self.weights, rng, self.deterministic),
        };
        &self.drawn.insert(drawn).indices
    }

    /// Index of the selected candidate.
    ///
    /// # Errors
    ///
    /// Returns `Error::RepetitionMismatch` if more than one repetition is drawn.
    pub fn index(&mut self, rng: &mut fastrand::Rng) -> Result<usize> {
        match *self.indices(rng) {
            [index] => Ok(index),
            ref indices => Err(Error::RepetitionMismatch {
                expected: 1,
                got: indices.len(),
            }),
        }
    }

    /// Returns an independent copy whose indices are drawn anew.
    #[must_use]
    pub fn spawn_child(&self) -> Self {
        Self {
            id: ParamId::new(),
            choices: self.choices.spawn(),
            weights: self.weights.spawn_child(),
            repetitions: self.repetitions,
            deterministic: self.deterministic,
            drawn: None,
            frozen: false,
        }
    }

    /// Decodes one index per row of `weights`, argmax if either flag asks for it.
    fn decode(&self, weights: &Array, rng: &mut fastrand::Rng, deterministic: bool) -> Drawn {
        let deterministic = deterministic || self.deterministic;
        // weights keep their [rows, arity] length through every write
        let indices = Encoder::from_rows(weights.data(), self.choices.arity())
            .encode(rng, deterministic);
        trace_debug!(id = %self.id, deterministic, ?indices, "drew choice indices");
        Drawn {
            generation: weights.generation(),
            indices,
        }
    }

    fn check_frozen(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::Frozen { name: self.name() });
        }
        Ok(())
    }

    /// Puts the reset weight in each drawn column, zeroing everything else.
    fn reset_weights(&mut self, indices: &[usize]) -> Result<()> {
        let arity = self.arity();
        let confidence = discretization::weight_for_reset(arity);
        let mut out = vec![0.0; self.weights.len()];
        for (row, &index) in indices.iter().enumerate() {
            out[row * arity + index] = confidence;
        }
        self.weights.assign(&out)?;
        trace_debug!(id = %self.id, ?indices, confidence, "reset choice weights");
        Ok(())
    }
}

impl Parameter for Choice {
    fn id(&self) -> ParamId {
        self.id
    }

    fn name(&self) -> String {
        if self.deterministic {
            "Choice{det}".to_owned()
        } else {
            "Choice".to_owned()
        }
    }

    fn value(&mut self, rng: &mut fastrand::Rng) -> Value {
        let indices = self.indices(rng).to_vec();
        if self.repetitions.is_none() {
            return self.choices.value_at(indices[0], rng);
        }
        Value::Tuple(
            indices
                .into_iter()
                .map(|i| self.choices.value_at(i, rng))
                .collect(),
        )
    }

    fn set_value(&mut self, value: &Value) -> Result<()> {
        self.check_frozen()?;
        let values = match self.repetitions {
            None => core::slice::from_ref(value),
            Some(n) => match value {
                Value::Tuple(items) if items.len() == n => items.as_slice(),
                Value::Tuple(items) => {
                    return Err(Error::RepetitionMismatch {
                        expected: n,
                        got: items.len(),
                    });
                }
                other => {
                    return Err(Error::ValueMismatch {
                        expected: "a tuple with one value per repetition",
                        got: other.to_string(),
                    });
                }
            },
        };
        let indices = self.choices.find_indices(values)?;
        self.reset_weights(&indices)?;
        self.drawn = Some(Drawn {
            generation: self.weights.generation(),
            indices,
        });
        Ok(())
    }

    fn value_hash(&mut self, rng: &mut fastrand::Rng) -> ValueHash {
        let indices = self.indices(rng).to_vec();
        self.choices.value_hash(&indices, rng)
    }

    fn mutate(&mut self, rng: &mut fastrand::Rng) -> Result<()> {
        self.check_frozen()?;
        let mut weights = self.weights.clone();
        weights.mutate(rng)?;
        let drawn = self.decode(&weights, rng, self.deterministic);
        let mut selected = drawn.indices.clone();
        selected.sort_unstable();
        selected.dedup();
        // nothing is written if a selected candidate cannot be mutated
        self.choices.check_mutable(&selected)?;
        self.weights = weights;
        self.drawn = Some(drawn);
        for index in selected {
            self.choices.mutate_at(index, rng)?;
        }
        Ok(())
    }

    fn spawn_boxed(&self) -> Box<dyn Parameter> {
        Box::new(self.spawn_child())
    }

    fn dimension(&self) -> usize {
        self.choices.dimension() + self.weights.dimension()
    }

    fn standardized_data(&self) -> Vec<f64> {
        let mut data = self.choices.standardized_data();
        data.extend(self.weights.standardized_data());
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
        let (nested, weights) = data.split_at(self.choices.dimension());
        self.choices
            .set_standardized_data(nested, rng, deterministic)?;
        self.weights
            .set_standardized_data(weights, rng, deterministic)?;
        self.drawn = Some(self.decode(&self.weights, rng, deterministic));
        Ok(())
    }

    fn descriptors(&self) -> Descriptors {
        let own = Descriptors {
            deterministic: self.deterministic,
            continuous: !self.deterministic,
            ordered: false,
        };
        own & self.choices.descriptors()
    }

    fn freeze(&mut self) {
        self.frozen = true;
        self.weights.freeze();
        self.choices.freeze();
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl BaseChoice for Choice {
    fn choices(&self) -> &Candidates {
        &self.choices
    }

    fn kind(&self) -> ChoiceKind {
        ChoiceKind::Unordered {
            deterministic: self.deterministic,
            repetitions: self.repetitions,
        }
    }

    fn selected_indices(&mut self, rng: &mut fastrand::Rng) -> Vec<usize> {
        self.indices(rng).to_vec()
    }
}
