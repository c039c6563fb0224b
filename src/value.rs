//! Dynamic values carried by parameters.
//!
//! Candidates of a choice can be of any kind (strings, numbers, vectors or
//! nested parameters), so values travel as the type-erased [`Value`]. A
//! [`ValueHash`] summarizes the resolved selection of a parameter tree and is
//! used to recognize logically identical evaluations.

/// A type-erased parameter value.
///
/// # Display
///
/// `Value` implements [`Display`](core::fmt::Display): scalars print their
/// plain value, strings are quoted, arrays and tuples print their items
/// between brackets and parentheses.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A floating-point value (also the value of a scalar parameter).
    Float(f64),
    /// A string value.
    Str(String),
    /// A flat vector of floats (the value of an array parameter).
    Array(Vec<f64>),
    /// A fixed-length sequence of values, one per repetition.
    Tuple(Vec<Value>),
}

impl Value {
    /// Returns the value as a float, if it is numeric.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Equality used to match an assigned value against a constant.
    ///
    /// Integers and floats compare by numeric value, so `Int(3)` matches
    /// `Float(3.0)`; tuples compare item by item under the same rule.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
            }
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => self == other,
            },
        }
    }

    /// Returns the items of a tuple value.
    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the string slice of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Tuple(items) => {
                write!(f, "(")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Tuple(v)
    }
}

/// Hashable summary of a parameter's resolved value.
///
/// Choices contribute the drawn index for constant candidates and the pair
/// (index, nested hash) for candidates that are parameters themselves, so two
/// trees hash equal exactly when they select the same branches with the same
/// nested state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueHash {
    /// Index of a constant candidate.
    Index(usize),
    /// Index of a parameter candidate together with that parameter's hash.
    Nested(usize, Box<ValueHash>),
    /// Bit patterns of continuous data.
    Data(Vec<u64>),
    /// One hash per drawn repetition.
    Tuple(Vec<ValueHash>),
}

impl ValueHash {
    /// Builds the hash of continuous data from its bit patterns.
    pub(crate) fn from_data(data: &[f64]) -> Self {
        Self::Data(data.iter().map(|v| v.to_bits()).collect())
    }
}
