//! Pure statistics over sample sequences.
//!
//! Variance uses the population denominator (`n`) everywhere: features,
//! detectors and calibration all share these functions.

/// Euclidean norm of a 3-vector
#[inline]
pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0 for an empty slice
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Sum of squares
pub fn energy(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Smallest and largest value, `None` for an empty slice
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude() {
        assert!((magnitude(3.0, 4.0, 0.0) - 5.0).abs() < 1e-12);
        assert_eq!(magnitude(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_empty_sequences() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(energy(&[]), 0.0);
        assert!(min_max(&[]).is_none());
    }

    #[test]
    fn test_population_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((variance(&values) - 4.0).abs() < 1e-12);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_idempotent() {
        let values = [1.5, -2.0, 3.25, 0.0, 9.0];
        assert_eq!(mean(&values), mean(&values));
        assert_eq!(variance(&values), variance(&values));
        assert_eq!(energy(&values), energy(&values));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
    }
}
