//! Reductions applied to a bucket once accumulation is done, and the text
//! rendering of their results.

use crate::datum::Value;

/// Mean of the numeric values, `None` when there are none.
pub fn average(values: &[Value]) -> Option<f64> {
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
    if numbers.is_empty() {
        return None;
    }
    Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

/// `None` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Renders a fraction as a percentage. The fraction is rounded to `precision`
/// decimal places first, so 0.66666 at precision 4 becomes "66.67".
pub fn percentage(fraction: f64, precision: usize) -> String {
    let scale = 10f64.powi(precision as i32);
    let rounded = (fraction * scale).round() / scale;
    let decimals = precision.saturating_sub(2);
    format!("{:.*}", decimals, rounded * 100.0)
}

pub fn count(n: usize) -> String {
    n.to_string()
}
