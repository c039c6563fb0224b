//! Categorical parameters over a fixed set of candidates.
//!
//! A choice owns an ordered, non-empty [`Candidates`] set whose entries are
//! either constant [`Value`]s or nested [`Parameter`]s. Two variants resolve
//! which candidate is active:
//!
//! | Type | Backing | Selection |
//! |------|---------|-----------|
//! | [`Choice`] | weight matrix, one row per repetition | argmax or softmax sampling per row |
//! | [`TransitionChoice`] | scalar position and transition weights | threshold bins, local steps on mutation |
//!
//! Both variants share the trial assignment of values (candidates are tried
//! in key order, the first one accepting the value wins), value hashing, and
//! sparse mutation: only the selected candidates are ever mutated.

mod transition;
mod unordered;

use core::num::NonZeroUsize;

pub use transition::{TransitionChoice, TransitionChoiceBuilder};
pub use unordered::{Choice, ChoiceBuilder};

use crate::error::{Error, Result};
use crate::parameter::{Array, Parameter};
use crate::types::{ChoiceKind, Descriptors};
use crate::value::{Value, ValueHash};

/// One option of a choice.
#[derive(Debug)]
pub enum Candidate {
    /// A plain value, returned as is.
    Constant(Value),
    /// A nested parameter, whose own value is returned.
    Parameter(Box<dyn Parameter>),
}

impl Candidate {
    /// Returns the nested parameter, if any.
    #[must_use]
    pub fn as_parameter(&self) -> Option<&dyn Parameter> {
        match self {
            Self::Constant(_) => None,
            Self::Parameter(p) => Some(p.as_ref()),
        }
    }

    /// Returns the nested parameter mutably, if any.
    pub fn as_parameter_mut(&mut self) -> Option<&mut dyn Parameter> {
        match self {
            Self::Constant(_) => None,
            Self::Parameter(p) => Some(p.as_mut()),
        }
    }

    /// Whether this candidate is a constant.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Standardized data of the candidate (empty for constants).
    #[must_use]
    pub fn standardized_data(&self) -> Vec<f64> {
        self.as_parameter()
            .map(Parameter::standardized_data)
            .unwrap_or_default()
    }

    fn value(&mut self, rng: &mut fastrand::Rng) -> Value {
        match self {
            Self::Constant(v) => v.clone(),
            Self::Parameter(p) => p.value(rng),
        }
    }

    /// Tries to make this candidate hold `value`.
    fn try_assign(&mut self, value: &Value) -> Result<()> {
        match self {
            Self::Constant(v) if v.matches(value) => Ok(()),
            Self::Constant(_) => Err(Error::ValueMismatch {
                expected: "the constant value",
                got: value.to_string(),
            }),
            Self::Parameter(p) => p.set_value(value),
        }
    }

    fn dimension(&self) -> usize {
        self.as_parameter().map_or(0, Parameter::dimension)
    }

    fn spawn(&self) -> Self {
        match self {
            Self::Constant(v) => Self::Constant(v.clone()),
            Self::Parameter(p) => Self::Parameter(p.spawn_boxed()),
        }
    }
}

macro_rules! constant_candidate {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Candidate {
                fn from(value: $t) -> Self {
                    Self::Constant(Value::from(value))
                }
            }
        )*
    };
}

constant_candidate!(bool, i32, i64, f64, &str, String, Vec<f64>);

impl From<Value> for Candidate {
    fn from(value: Value) -> Self {
        Self::Constant(value)
    }
}

impl From<Array> for Candidate {
    fn from(param: Array) -> Self {
        Self::param(param)
    }
}

impl From<Choice> for Candidate {
    fn from(param: Choice) -> Self {
        Self::param(param)
    }
}

impl From<TransitionChoice> for Candidate {
    fn from(param: TransitionChoice) -> Self {
        Self::param(param)
    }
}

impl From<Box<dyn Parameter>> for Candidate {
    fn from(param: Box<dyn Parameter>) -> Self {
        Self::Parameter(param)
    }
}

impl Candidate {
    /// Wraps a nested parameter.
    pub fn param<P: Parameter + 'static>(param: P) -> Self {
        Self::Parameter(Box::new(param))
    }
}

/// The ordered, non-empty set of candidates of a choice.
///
/// Keys are the positions `0..len()`. Candidates are never added, removed
/// or replaced after construction; only nested parameters can be modified,
/// through [`parameter_mut`](Self::parameter_mut).
#[derive(Debug)]
pub struct Candidates {
    items: Vec<Candidate>,
    arity: NonZeroUsize,
}

impl Candidates {
    /// Collects candidates from any iterator.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyChoices` if the iterator yields nothing.
    pub fn new<I, C>(choices: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        let items: Vec<Candidate> = choices.into_iter().map(Into::into).collect();
        let arity = NonZeroUsize::new(items.len()).ok_or(Error::EmptyChoices)?;
        Ok(Self { items, arity })
    }

    /// Number of candidates (the arity).
    #[must_use]
    pub fn len(&self) -> usize {
        self.arity.get()
    }

    /// Always `false`: a candidate set holds at least one candidate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn arity(&self) -> NonZeroUsize {
        self.arity
    }

    /// The candidate at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.items.get(index)
    }

    /// The nested parameter at `index`, mutably. `None` for constants.
    pub fn parameter_mut(&mut self, index: usize) -> Option<&mut dyn Parameter> {
        self.items.get_mut(index).and_then(Candidate::as_parameter_mut)
    }

    /// Iterates over the candidates in key order.
    pub fn iter(&self) -> core::slice::Iter<'_, Candidate> {
        self.items.iter()
    }

    /// Resolves, for each value, the first candidate (in key order) accepting it.
    ///
    /// Rejections by individual candidates are expected and skipped; any
    /// other failure aborts the search.
    pub(crate) fn find_indices(&mut self, values: &[Value]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(values.len());
        for value in values {
            let mut found = None;
            for (k, candidate) in self.items.iter_mut().enumerate() {
                match candidate.try_assign(value) {
                    Ok(()) => {
                        found = Some(k);
                        break;
                    }
                    Err(e) if e.is_rejection() => {}
                    Err(e) => return Err(e),
                }
            }
            let Some(k) = found else {
                return Err(Error::NoMatchingCandidate {
                    value: value.to_string(),
                });
            };
            indices.push(k);
        }
        Ok(indices)
    }

    pub(crate) fn value_at(&mut self, index: usize, rng: &mut fastrand::Rng) -> Value {
        self.items[index].value(rng)
    }

    pub(crate) fn value_hash(&mut self, indices: &[usize], rng: &mut fastrand::Rng) -> ValueHash {
        let mut hashes: Vec<ValueHash> = indices
            .iter()
            .map(|&i| match &mut self.items[i] {
                Candidate::Constant(_) => ValueHash::Index(i),
                Candidate::Parameter(p) => ValueHash::Nested(i, Box::new(p.value_hash(rng))),
            })
            .collect();
        if hashes.len() == 1 {
            hashes.swap_remove(0)
        } else {
            ValueHash::Tuple(hashes)
        }
    }

    pub(crate) fn mutate_at(&mut self, index: usize, rng: &mut fastrand::Rng) -> Result<()> {
        match &mut self.items[index] {
            Candidate::Constant(_) => Ok(()),
            Candidate::Parameter(p) => p.mutate(rng),
        }
    }

    /// Fails with `Error::Frozen` if a candidate at `indices` is a frozen parameter.
    pub(crate) fn check_mutable(&self, indices: &[usize]) -> Result<()> {
        for &index in indices {
            if let Some(p) = self.items[index].as_parameter()
                && p.is_frozen()
            {
                return Err(Error::Frozen { name: p.name() });
            }
        }
        Ok(())
    }

    pub(crate) fn spawn(&self) -> Self {
        Self {
            items: self.items.iter().map(Candidate::spawn).collect(),
            arity: self.arity,
        }
    }

    pub(crate) fn dimension(&self) -> usize {
        self.items.iter().map(Candidate::dimension).sum()
    }

    pub(crate) fn standardized_data(&self) -> Vec<f64> {
        self.items
            .iter()
            .flat_map(Candidate::standardized_data)
            .collect()
    }

    /// Splits `data` across the nested parameters, in key order.
    pub(crate) fn set_standardized_data(
        &mut self,
        data: &[f64],
        rng: &mut fastrand::Rng,
        deterministic: bool,
    ) -> Result<()> {
        let expected = self.dimension();
        if data.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                got: data.len(),
            });
        }
        let mut offset = 0;
        for candidate in &mut self.items {
            if let Candidate::Parameter(p) = candidate {
                let dim = p.dimension();
                p.set_standardized_data(&data[offset..offset + dim], rng, deterministic)?;
                offset += dim;
            }
        }
        Ok(())
    }

    pub(crate) fn descriptors(&self) -> Descriptors {
        self.items
            .iter()
            .filter_map(Candidate::as_parameter)
            .fold(Descriptors::default(), |acc, p| acc & p.descriptors())
    }

    pub(crate) fn freeze(&mut self) {
        for candidate in &mut self.items {
            if let Candidate::Parameter(p) = candidate {
                p.freeze();
            }
        }
    }
}

impl<'a> IntoIterator for &'a Candidates {
    type Item = &'a Candidate;
    type IntoIter = core::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Behaviour shared by the choice variants.
pub trait BaseChoice: Parameter {
    /// The candidate set.
    fn choices(&self) -> &Candidates;

    /// Which variant this is.
    fn kind(&self) -> ChoiceKind;

    /// Indices of the currently selected candidates, drawing them if needed.
    fn selected_indices(&mut self, rng: &mut fastrand::Rng) -> Vec<usize>;

    /// Number of candidates.
    fn arity(&self) -> usize {
        self.choices().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Candidates {
        Candidates::new(vec![
            Candidate::from("a"),
            Candidate::param(Array::scalar(0.5).with_bounds(0.0, 1.0).unwrap()),
            Candidate::param(Array::scalar(15.0).with_bounds(10.0, 20.0).unwrap()),
            Candidate::from(3_i64),
        ])
        .unwrap()
    }

    #[test]
    fn empty_candidates_rejected() {
        let empty: Vec<&str> = Vec::new();
        assert!(matches!(Candidates::new(empty), Err(Error::EmptyChoices)));
    }

    #[test]
    fn find_indices_first_acceptor_wins() {
        let mut candidates = mixed();
        let indices = candidates
            .find_indices(&[
                Value::from("a"),
                Value::Float(12.0),
                Value::Float(0.1),
                Value::Int(3),
            ])
            .unwrap();
        // Int(3) is out of both scalar bounds and falls through to the constant
        assert_eq!(indices, vec![0, 2, 1, 3]);
    }

    #[test]
    fn find_indices_no_match() {
        let mut candidates = mixed();
        let err = candidates.find_indices(&[Value::from("z")]).unwrap_err();
        assert!(matches!(err, Error::NoMatchingCandidate { value } if value == "\"z\""));
    }

    #[test]
    fn find_indices_writes_accepting_candidate() {
        let mut rng = fastrand::Rng::with_seed(0);
        let mut candidates = mixed();
        candidates.find_indices(&[Value::Float(0.75)]).unwrap();
        assert_eq!(candidates.value_at(1, &mut rng), Value::Float(0.75));
        assert_eq!(candidates.value_at(2, &mut rng), Value::Float(15.0));
    }

    #[test]
    fn hash_of_constants_and_parameters() {
        let mut rng = fastrand::Rng::with_seed(0);
        let mut candidates = mixed();
        assert_eq!(candidates.value_hash(&[0], &mut rng), ValueHash::Index(0));
        assert_eq!(
            candidates.value_hash(&[1], &mut rng),
            ValueHash::Nested(1, Box::new(ValueHash::from_data(&[0.5])))
        );
        assert!(matches!(
            candidates.value_hash(&[0, 3], &mut rng),
            ValueHash::Tuple(h) if h.len() == 2
        ));
    }

    #[test]
    fn standardized_layout() {
        let mut rng = fastrand::Rng::with_seed(0);
        let mut candidates = mixed();
        assert_eq!(candidates.dimension(), 2);
        assert_eq!(candidates.standardized_data(), vec![0.5, 15.0]);
        candidates
            .set_standardized_data(&[0.25, 11.0], &mut rng, false)
            .unwrap();
        assert_eq!(candidates.standardized_data(), vec![0.25, 11.0]);
        assert!(candidates.set_standardized_data(&[1.0], &mut rng, false).is_err());
    }

    #[test]
    fn spawn_copies_structure() {
        let candidates = mixed();
        let spawned = candidates.spawn();
        assert_eq!(spawned.len(), candidates.len());
        assert_eq!(spawned.standardized_data(), candidates.standardized_data());
        let original_id = candidates.get(1).and_then(Candidate::as_parameter).map(|p| p.id());
        let spawned_id = spawned.get(1).and_then(Candidate::as_parameter).map(|p| p.id());
        assert_ne!(original_id, spawned_id);
        assert!(spawned.get(0).is_some_and(Candidate::is_constant));
    }
}
