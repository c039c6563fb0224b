/// Sample a value from the standard normal distribution using the Box-Muller transform.
#[inline]
pub(crate) fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    // 1 - U keeps u1 in (0, 1] so the log stays finite
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64() * core::f64::consts::TAU;
    (-2.0 * u1.ln()).sqrt() * u2.cos()
}

/// Draw an index from a discrete distribution given by `probabilities`.
///
/// The probabilities are expected to sum to one; any residual mass left by
/// rounding falls on the last entry with a non-zero probability.
pub(crate) fn categorical(rng: &mut fastrand::Rng, probabilities: &[f64]) -> usize {
    let u = rng.f64();
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > 0.0 {
            last_positive = i;
        }
        cumulative += p;
        if u < cumulative {
            return i;
        }
    }
    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_normal_moments() {
        let mut rng = fastrand::Rng::with_seed(7);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        #[allow(clippy::cast_precision_loss)]
        let mean = samples.iter().sum::<f64>() / n as f64;
        #[allow(clippy::cast_precision_loss)]
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.05, "var = {var}");
        assert!(samples.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn categorical_respects_zero_mass() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..1000 {
            let i = categorical(&mut rng, &[0.0, 1.0, 0.0]);
            assert_eq!(i, 1);
        }
    }

    #[test]
    fn categorical_frequencies() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut counts = [0_usize; 3];
        for _ in 0..30_000 {
            counts[categorical(&mut rng, &[0.2, 0.3, 0.5])] += 1;
        }
        assert!((5_500..6_500).contains(&counts[0]), "{counts:?}");
        assert!((8_500..9_500).contains(&counts[1]), "{counts:?}");
        assert!((14_500..15_500).contains(&counts[2]), "{counts:?}");
    }

    #[test]
    fn categorical_rounding_falls_on_last_positive() {
        let mut rng = fastrand::Rng::with_seed(5);
        // sums to slightly under one
        for _ in 0..1000 {
            let i = categorical(&mut rng, &[0.5, 0.499_999, 0.0]);
            assert!(i < 2);
        }
    }
}
