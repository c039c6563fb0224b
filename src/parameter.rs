//! Central parameter trait and the continuous leaf parameter.
//!
//! The [`Parameter`] trait is what every node of a parameter tree exposes to
//! the surrounding optimizer: reading and assigning values, mutation, spawning
//! independent copies, and the flat standardized representation that
//! continuous optimizers search over. [`Array`] is the continuous leaf; it
//! backs the weights and positions of the choice parameters and can be used as
//! a candidate on its own.
//!
//! # Example
//!
//! ```
//! use parametrize::parameter::{Array, Parameter};
//! use parametrize::Value;
//!
//! let mut rng = fastrand::Rng::with_seed(0);
//! let mut lr = Array::scalar(0.1).with_bounds(0.0, 1.0).unwrap();
//! lr.set_value(&Value::Float(0.5)).unwrap();
//! assert_eq!(lr.value(&mut rng), Value::Float(0.5));
//! assert!(lr.set_value(&Value::Float(3.0)).is_err());
//! ```

use core::fmt::Debug;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::rng_util;
use crate::types::Descriptors;
use crate::value::{Value, ValueHash};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(0);

/// A unique identifier for a parameter instance.
///
/// Each parameter is assigned a unique `ParamId` at creation time. Spawned
/// children get a fresh id, so an id always names one node of one tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamId(u64);

impl ParamId {
    /// Creates a new unique `ParamId`.
    pub fn new() -> Self {
        Self(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ParamId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ParamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "param_{}", self.0)
    }
}

/// A node of a parameter tree.
///
/// Every stochastic operation takes the random source explicitly so that a
/// run seeded once is reproducible end to end.
pub trait Parameter: Debug + Send {
    /// Returns the unique identifier for this parameter.
    fn id(&self) -> ParamId;

    /// Returns a short human-readable name for this parameter.
    fn name(&self) -> String;

    /// Returns the current value, drawing any pending random selection.
    fn value(&mut self, rng: &mut fastrand::Rng) -> Value;

    /// Assigns a value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Frozen` if the parameter is frozen, or an error
    /// describing why the value cannot be represented by this parameter.
    fn set_value(&mut self, value: &Value) -> Result<()>;

    /// Returns a hashable summary of the current value.
    fn value_hash(&mut self, rng: &mut fastrand::Rng) -> ValueHash;

    /// Randomly perturbs the parameter in place.
    ///
    /// # Errors
    ///
    /// Returns `Error::Frozen` if the parameter is frozen.
    fn mutate(&mut self, rng: &mut fastrand::Rng) -> Result<()>;

    /// Returns an independent copy with a fresh identity and no pending draw.
    fn spawn_boxed(&self) -> Box<dyn Parameter>;

    /// Length of the standardized representation.
    fn dimension(&self) -> usize;

    /// The flat standardized representation.
    fn standardized_data(&self) -> Vec<f64>;

    /// Overwrites the parameter from its standardized representation.
    ///
    /// `deterministic` asks stochastic parameters to decode without sampling.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if `data` does not have
    /// [`dimension`](Self::dimension) entries and `Error::Frozen` if the
    /// parameter is frozen.
    fn set_standardized_data(
        &mut self,
        data: &[f64],
        rng: &mut fastrand::Rng,
        deterministic: bool,
    ) -> Result<()>;

    /// Structural descriptors of the parameter.
    fn descriptors(&self) -> Descriptors {
        Descriptors::default()
    }

    /// Marks the parameter, and everything it owns, as immutable.
    fn freeze(&mut self);

    /// Whether the parameter has been frozen.
    fn is_frozen(&self) -> bool;
}

/// A continuous array parameter, optionally bounded.
///
/// Values are stored flat in row-major order. Mutation adds `sigma * N(0, 1)`
/// to every entry, and the standardized representation is `value / sigma`.
/// Bounded arrays clip on mutation and standardized writes, and reject
/// out-of-bounds values on [`set_value`](Parameter::set_value).
///
/// Every write bumps a generation counter, which lets owners cache values
/// derived from the data.
///
/// # Example
///
/// ```
/// use parametrize::parameter::{Array, Parameter};
///
/// let mut rng = fastrand::Rng::with_seed(3);
/// let mut weights = Array::zeros(&[2, 3]).with_sigma(0.5).unwrap();
/// let before = weights.generation();
/// weights.mutate(&mut rng).unwrap();
/// assert_ne!(weights.generation(), before);
/// assert_eq!(weights.dimension(), 6);
/// ```
#[derive(Clone, Debug)]
pub struct Array {
    id: ParamId,
    data: Vec<f64>,
    shape: Vec<usize>,
    sigma: f64,
    bounds: Option<(f64, f64)>,
    generation: u64,
    frozen: bool,
}

impl Array {
    /// Creates a zero-filled array of the given shape.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self::from_parts(vec![0.0; len], shape.to_vec())
    }

    /// Creates a one-dimensional array holding `values`.
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        Self::from_parts(values, shape)
    }

    /// Creates a scalar parameter, whose value surfaces as [`Value::Float`].
    #[must_use]
    pub fn scalar(init: f64) -> Self {
        Self::from_parts(vec![init], Vec::new())
    }

    fn from_parts(data: Vec<f64>, shape: Vec<usize>) -> Self {
        Self {
            id: ParamId::new(),
            data,
            shape,
            sigma: 1.0,
            bounds: None,
            generation: 0,
            frozen: false,
        }
    }

    /// Sets the mutation scale.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSigma` if `sigma` is not strictly positive and finite.
    pub fn with_sigma(mut self, sigma: f64) -> Result<Self> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(Error::InvalidSigma(sigma));
        }
        self.sigma = sigma;
        Ok(self)
    }

    /// Restricts every entry to `[low, high]`, clipping the current data.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBounds` if `low > high` or either bound is NaN.
    pub fn with_bounds(mut self, low: f64, high: f64) -> Result<Self> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(Error::InvalidBounds { low, high });
        }
        self.bounds = Some((low, high));
        self.clip();
        Ok(self)
    }

    /// Whether this array is a scalar.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// The shape of the array (empty for scalars).
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The flat data, in row-major order.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array has no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The mutation scale.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// The inclusive bounds, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    /// Counter bumped on every write to the data.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns an independent copy with a fresh id and the same data.
    #[must_use]
    pub fn spawn_child(&self) -> Self {
        Self {
            id: ParamId::new(),
            frozen: false,
            ..self.clone()
        }
    }

    /// Overwrites the raw data (same length), clipping to the bounds.
    ///
    /// # Errors
    ///
    /// Returns `Error::Frozen` if the array is frozen and
    /// `Error::DimensionMismatch` if `data` has the wrong length.
    pub fn assign(&mut self, data: &[f64]) -> Result<()> {
        self.check_frozen()?;
        self.check_len(data.len())?;
        self.data.copy_from_slice(data);
        self.clip();
        self.touch();
        Ok(())
    }

    fn check_frozen(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::Frozen { name: self.name() });
        }
        Ok(())
    }

    fn check_len(&self, got: usize) -> Result<()> {
        if got != self.data.len() {
            return Err(Error::DimensionMismatch {
                expected: self.data.len(),
                got,
            });
        }
        Ok(())
    }

    fn clip(&mut self) {
        if let Some((low, high)) = self.bounds {
            for v in &mut self.data {
                *v = v.clamp(low, high);
            }
        }
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn check_bounds(&self, values: &[f64]) -> Result<()> {
        if let Some((low, high)) = self.bounds
            && let Some(&value) = values.iter().find(|v| !(low..=high).contains(*v))
        {
            return Err(Error::OutOfBounds { value, low, high });
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Array {
    fn from(values: Vec<f64>) -> Self {
        Self::from_values(values)
    }
}

impl Parameter for Array {
    fn id(&self) -> ParamId {
        self.id
    }

    fn name(&self) -> String {
        if self.is_scalar() {
            "Scalar".to_owned()
        } else {
            format!("Array{:?}", self.shape)
        }
    }

    fn value(&mut self, _rng: &mut fastrand::Rng) -> Value {
        if self.is_scalar() {
            Value::Float(self.data[0])
        } else {
            Value::Array(self.data.clone())
        }
    }

    fn set_value(&mut self, value: &Value) -> Result<()> {
        self.check_frozen()?;
        let values = match value {
            Value::Array(items) if items.len() == self.data.len() => items.clone(),
            other if self.data.len() == 1 => match other.as_f64() {
                Some(v) => vec![v],
                None => {
                    return Err(Error::ValueMismatch {
                        expected: "a number",
                        got: other.to_string(),
                    });
                }
            },
            other => {
                return Err(Error::ValueMismatch {
                    expected: "an array of matching length",
                    got: other.to_string(),
                });
            }
        };
        self.check_bounds(&values)?;
        self.data = values;
        self.touch();
        Ok(())
    }

    fn value_hash(&mut self, _rng: &mut fastrand::Rng) -> ValueHash {
        ValueHash::from_data(&self.data)
    }

    fn mutate(&mut self, rng: &mut fastrand::Rng) -> Result<()> {
        self.check_frozen()?;
        for v in &mut self.data {
            *v += self.sigma * rng_util::standard_normal(rng);
        }
        self.clip();
        self.touch();
        Ok(())
    }

    fn spawn_boxed(&self) -> Box<dyn Parameter> {
        Box::new(self.spawn_child())
    }

    fn dimension(&self) -> usize {
        self.data.len()
    }

    fn standardized_data(&self) -> Vec<f64> {
        self.data.iter().map(|v| v / self.sigma).collect()
    }

    fn set_standardized_data(
        &mut self,
        data: &[f64],
        _rng: &mut fastrand::Rng,
        _deterministic: bool,
    ) -> Result<()> {
        self.check_frozen()?;
        self.check_len(data.len())?;
        for (v, d) in self.data.iter_mut().zip(data) {
            *v = d * self.sigma;
        }
        self.clip();
        self.touch();
        Ok(())
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }
}
