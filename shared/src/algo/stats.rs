//! Statistical functions for tracking-error analysis

/// Arithmetic mean of a slice.
///
/// Returns 0.0 for an empty slice so callers can report "no data" as zero
/// error rather than NaN.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Root-mean-square deviation of `values` about their own mean.
///
/// This is the population standard deviation (divides by `n`, not `n - 1`).
/// Returns 0.0 for an empty slice.
pub fn rms_about_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Count consecutive pairs whose product is strictly positive.
///
/// A pair containing an exact zero never counts, so a sequence sitting on the
/// setpoint is not mistaken for a one-sided drift.
pub fn same_sign_pairs(values: &[f64]) -> usize {
    values.windows(2).filter(|w| w[0] * w[1] > 0.0).count()
}

/// Calculate median of a slice of f64 values
///
/// NaN values are filtered out. For even-length data, returns the average of
/// the two middle values.
///
/// # Returns
///
/// * `Ok(median)` - The median value
/// * `Err(message)` - If no valid values remain after filtering NaN
pub fn median(values: &[f64]) -> Result<f64, String> {
    let mut valid_values: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();

    if valid_values.is_empty() {
        return Err(format!(
            "Insufficient data points to compute median: {} total values, 0 valid (all NaN)",
            values.len()
        ));
    }

    valid_values.sort_by(|a, b| a.total_cmp(b));

    let median_value = if valid_values.len() % 2 == 0 {
        let mid = valid_values.len() / 2;
        (valid_values[mid - 1] + valid_values[mid]) / 2.0
    } else {
        valid_values[valid_values.len() / 2]
    };

    Ok(median_value)
}
