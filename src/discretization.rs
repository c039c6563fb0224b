//! Conversions between continuous data and discrete indices.
//!
//! Two mappings are provided:
//!
//! - **Softmax encoding** ([`Encoder`]): a matrix of weights with one row per
//!   draw and one column per option. Each row is decoded into an index either
//!   by argmax or by sampling from the row softmax. [`weight_for_reset`] goes
//!   the other way and gives the weight that makes a column win.
//! - **Threshold discretization** ([`index_of`], [`position_for`]): the real
//!   line is split into `arity` bins of equal standard-normal probability,
//!   so an `N(0, 1)` position lands on a uniformly distributed index and
//!   small moves of the position lead to neighbouring indices.
//!
//! # Example
//!
//! ```
//! use parametrize::discretization::{index_of, position_for, weight_for_reset, Encoder};
//!
//! let position = position_for(3, 5);
//! assert_eq!(index_of(position, 5), 3);
//!
//! let mut row = vec![0.0; 4];
//! row[2] = weight_for_reset(4);
//! let mut rng = fastrand::Rng::with_seed(0);
//! let indices = Encoder::new(&row, 4).unwrap().encode(&mut rng, true);
//! assert_eq!(indices, vec![2]);
//! ```

use core::num::NonZeroUsize;

use crate::error::{Error, Result};
use crate::rng_util;

/// Row-wise categorical decoder over a flat, row-major weight matrix.
#[derive(Clone, Copy, Debug)]
pub struct Encoder<'a> {
    weights: &'a [f64],
    arity: usize,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder over `weights` interpreted as rows of `arity` columns.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyChoices` if `arity` is zero and
    /// `Error::DimensionMismatch` if `weights` is empty or not a whole number
    /// of rows.
    pub fn new(weights: &'a [f64], arity: usize) -> Result<Self> {
        if arity == 0 {
            return Err(Error::EmptyChoices);
        }
        if weights.is_empty() || weights.len() % arity != 0 {
            return Err(Error::DimensionMismatch {
                expected: arity * (weights.len() / arity).max(1),
                got: weights.len(),
            });
        }
        Ok(Self { weights, arity })
    }

    /// Creates an encoder over a weight buffer whose length is already known
    /// to be a whole number of rows. A trailing partial row is ignored.
    pub(crate) fn from_rows(weights: &'a [f64], arity: NonZeroUsize) -> Self {
        Self {
            weights,
            arity: arity.get(),
        }
    }

    /// Number of rows, i.e. of indices produced by [`encode`](Self::encode).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.weights.len() / self.arity
    }

    /// Softmax probabilities of every row.
    #[must_use]
    pub fn probabilities(&self) -> Vec<Vec<f64>> {
        self.weights.chunks_exact(self.arity).map(softmax).collect()
    }

    /// Decodes one index per row.
    ///
    /// With `deterministic` the most likely column is taken (first one on
    /// ties); otherwise the column is sampled from the row softmax.
    #[must_use]
    pub fn encode(&self, rng: &mut fastrand::Rng, deterministic: bool) -> Vec<usize> {
        self.weights
            .chunks_exact(self.arity)
            .map(|row| {
                if deterministic {
                    argmax(row)
                } else {
                    rng_util::categorical(rng, &softmax(row))
                }
            })
            .collect()
    }
}

/// Numerically stable softmax of a row of weights.
///
/// Rows whose exponentials cannot be normalized (infinite or NaN weights)
/// put all the mass on their argmax.
#[must_use]
pub fn softmax(row: &[f64]) -> Vec<f64> {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = row.iter().map(|w| (w - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        let mut one_hot = vec![0.0; row.len()];
        if !one_hot.is_empty() {
            one_hot[argmax(row)] = 1.0;
        }
        return one_hot;
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest weight, first occurrence on ties.
fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &w) in row.iter().enumerate().skip(1) {
        if w > row[best] || row[best].is_nan() {
            best = i;
        }
    }
    best
}

/// Weight that makes its column win a row of otherwise zero weights.
///
/// Alone in a zero row of `arity` columns, the returned weight gets softmax
/// probability `1 - 1 / (2 * arity)`: 0.75 for two options, approaching 1 as
/// the arity grows. A single option always wins, so its weight is 0.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn weight_for_reset(arity: usize) -> f64 {
    if arity <= 1 {
        return 0.0;
    }
    let k = arity as f64;
    let p = 1.0 - 1.0 / (2.0 * k);
    (p * (k - 1.0) / (1.0 - p)).ln()
}

/// Index of the equal-probability normal bin that `position` falls in.
///
/// The result is clipped to `[0, arity - 1]`; NaN positions map to 0.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn index_of(position: f64, arity: usize) -> usize {
    if arity <= 1 || position.is_nan() {
        return 0;
    }
    let bin = (norm_cdf(position) * arity as f64).floor();
    if bin <= 0.0 {
        0
    } else {
        (bin as usize).min(arity - 1)
    }
}

/// Representative position of bin `index`: the normal quantile of its center.
///
/// Indices past the last bin are clamped to it.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn position_for(index: usize, arity: usize) -> f64 {
    if arity <= 1 {
        return 0.0;
    }
    let index = index.min(arity - 1);
    norm_ppf((index as f64 + 0.5) / arity as f64)
}

// ---------------------------------------------------------------------------
// Normal distribution helpers
// ---------------------------------------------------------------------------

/// Standard normal PDF.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF, accurate to double precision in both tails.
pub(crate) fn norm_cdf(x: f64) -> f64 {
    0.5 * libm::erfc(-x / core::f64::consts::SQRT_2)
}

/// Standard normal quantile function.
///
/// Acklam's rational approximation, polished by one Halley step against
/// [`norm_cdf`] so that the quantile inverts the CDF to double precision.
pub(crate) fn norm_ppf(p: f64) -> f64 {
    let x = acklam_ppf(p);
    if !x.is_finite() {
        return x;
    }
    let error = norm_cdf(x) - p;
    let u = error / norm_pdf(x);
    x - u / (1.0 + 0.5 * x * u)
}

/// Acklam's approximation of the normal quantile, relative error below 1.2e-9.
fn acklam_ppf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppf_inverts_cdf() {
        for &p in &[1e-6, 0.01, 0.024, 0.1, 0.25, 0.5, 0.75, 0.9, 0.976, 0.999_99] {
            let x = norm_ppf(p);
            assert!((norm_cdf(x) - p).abs() < 1e-14, "p = {p}, x = {x}");
        }
        for &p in &[1e-12, 1e-9, 3e-8] {
            let x = norm_ppf(p);
            assert!(((norm_cdf(x) - p) / p).abs() < 1e-12, "p = {p}, x = {x}");
        }
        assert!(norm_ppf(0.5).abs() < 1e-9);
        assert!(norm_ppf(0.0).is_infinite());
        assert!(norm_ppf(1.0).is_infinite());
    }

    #[test]
    fn cdf_symmetry() {
        for &x in &[0.0, 0.3, 1.0, 2.5, 7.9] {
            assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn threshold_round_trip() {
        for arity in 1..=40 {
            for index in 0..arity {
                assert_eq!(index_of(position_for(index, arity), arity), index);
            }
        }
    }

    #[test]
    fn index_of_clips() {
        assert_eq!(index_of(f64::INFINITY, 5), 4);
        assert_eq!(index_of(f64::NEG_INFINITY, 5), 0);
        assert_eq!(index_of(100.0, 3), 2);
        assert_eq!(index_of(-100.0, 3), 0);
        assert_eq!(index_of(f64::NAN, 3), 0);
        assert_eq!(index_of(0.0, 3), 1);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn position_for_clamps_past_last_bin() {
        assert_eq!(position_for(7, 4), position_for(3, 4));
        assert!(position_for(4, 4).is_finite());
    }

    #[test]
    fn reset_weight_wins_deterministically() {
        let mut rng = fastrand::Rng::with_seed(0);
        for arity in 1..=20 {
            for column in 0..arity {
                let mut row = vec![0.0; arity];
                row[column] = weight_for_reset(arity);
                let encoder = Encoder::new(&row, arity).unwrap();
                assert_eq!(encoder.encode(&mut rng, true), vec![column]);
            }
        }
    }

    #[test]
    fn reset_weight_probability() {
        let mut row = vec![0.0; 2];
        row[1] = weight_for_reset(2);
        let probs = softmax(&row);
        assert!((probs[1] - 0.75).abs() < 1e-12);

        let mut row = vec![0.0; 10];
        row[0] = weight_for_reset(10);
        assert!((softmax(&row)[0] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn softmax_is_stable_and_normalized() {
        let probs = softmax(&[1000.0, 1000.0, 0.0]);
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);
        assert!(probs[2] < 1e-12);
        let sum: f64 = softmax(&[0.3, -1.2, 2.0, 0.0]).iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn softmax_infinite_weight_is_one_hot() {
        assert_eq!(softmax(&[0.0, f64::INFINITY, 1.0]), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn argmax_first_occurrence() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[f64::NAN, 0.5, 0.1]), 1);
    }

    #[test]
    fn encoder_rejects_bad_shapes() {
        assert!(matches!(Encoder::new(&[0.0; 3], 0), Err(Error::EmptyChoices)));
        assert!(matches!(
            Encoder::new(&[0.0; 5], 2),
            Err(Error::DimensionMismatch { got: 5, .. })
        ));
        assert!(Encoder::new(&[], 2).is_err());
        assert_eq!(Encoder::new(&[0.0; 6], 3).unwrap().n_rows(), 2);
    }

    #[test]
    fn encoder_rows_are_independent() {
        let weights = [10.0, 0.0, 0.0, 0.0, 0.0, 10.0];
        let encoder = Encoder::new(&weights, 3).unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(encoder.encode(&mut rng, true), vec![0, 2]);
        let probs = encoder.probabilities();
        assert_eq!(probs.len(), 2);
        assert!(probs[0][0] > 0.99 && probs[1][2] > 0.99);
    }

    #[test]
    fn stochastic_encoding_follows_softmax() {
        let weights = [0.0, 2.0_f64.ln(), 0.0];
        let encoder = Encoder::new(&weights, 3).unwrap();
        let mut rng = fastrand::Rng::with_seed(42);
        let mut counts = [0_usize; 3];
        for _ in 0..20_000 {
            counts[encoder.encode(&mut rng, false)[0]] += 1;
        }
        // expected 5000 / 10000 / 5000
        assert!((9_500..10_500).contains(&counts[1]), "{counts:?}");
        assert!((4_500..5_500).contains(&counts[0]), "{counts:?}");
    }
}
