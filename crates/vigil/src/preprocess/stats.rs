//! Column statistics used by the normalizer.

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N).
///
/// A variance no larger than the rounding error of summing `n` values of
/// magnitude `mean` is reported as exactly 0.0, so a constant column such as
/// `[0.1, 0.1, 0.1]` has zero spread.
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let noise = n * f64::EPSILON * var + (n * mean * f64::EPSILON).powi(2);
    if var <= noise { 0.0 } else { var.sqrt() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(population_std(&values, m), 2.0);
        assert_eq!(population_std(&[7.0, 7.0], 7.0), 0.0);
    }

    #[test]
    fn test_population_std_ignores_rounding_noise() {
        let values = [0.1, 0.1, 0.1];
        let m = mean(&values);
        assert_ne!(m, 0.1);
        assert_eq!(population_std(&values, m), 0.0);

        let tiny = [1e-9, 2e-9, 3e-9];
        assert!(population_std(&tiny, mean(&tiny)) > 0.0);
    }
}
