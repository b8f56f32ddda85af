//! Helper functions

/// Arithmetic mean of `values`. Returns NaN for an empty slice.
pub fn mean_of_floats(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of `values`, taking the mean of the two middle values when the
/// length is even.
///
/// ## Panics
/// Panics if `values` is empty.
pub fn median_of_floats(mut values: Vec<f64>) -> f64 {
    assert!(!values.is_empty(), "median of an empty set");

    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Share of `part` in `whole` as a percentage, or 0 if `whole` is 0.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::{mean_of_floats, median_of_floats, percent_of};

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median_of_floats(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_of_floats(vec![4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn mean() {
        assert_eq!(mean_of_floats(&[1.0, 2.0, 6.0]), 3.0);
        assert!(mean_of_floats(&[]).is_nan());
    }

    #[test]
    fn percent() {
        assert_eq!(percent_of(1.0, 4.0), 25.0);
        assert_eq!(percent_of(1.0, 0.0), 0.0);
    }
}
