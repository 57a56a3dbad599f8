//! Utility functions shared by the statistics sections.
//!
//! This module provides rounding, percentage, median and duration formatting
//! helpers used throughout the analyzer.

/// Round `value` to `decimals` decimal places.
///
/// # Arguments
///
/// * `value` - Number to round
/// * `decimals` - Number of decimal places to keep
///
/// # Returns
///
/// The rounded value. Non-finite input is returned unchanged.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage of `part` in `whole`, rounded to two decimals.
///
/// Returns 0.0 when `whole` is zero.
#[must_use]
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    round_to(part / whole * 100.0, 2)
}

/// Median of a slice of samples.
///
/// # Arguments
///
/// * `values` - Samples in any order
///
/// # Returns
///
/// `None` for an empty slice, otherwise the middle value (mean of the two
/// middle values for even lengths).
#[must_use]
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

/// Render a duration in seconds as `Ns`, `Nm Ns`, `Nh Nm` or `Nd Nh`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    if total < 60 {
        format!("{total}s")
    } else if total < 3_600 {
        format!("{}m {}s", total / 60, total % 60)
    } else if total < 86_400 {
        format!("{}h {}m", total / 3_600, (total % 3_600) / 60)
    } else {
        format!("{}d {}h", total / 86_400, (total % 86_400) / 3_600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert!((round_to(0.123_456, 4) - 0.1235).abs() < 1e-12);
        assert!((round_to(2.5, 0) - 3.0).abs() < 1e-12);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_percentage_handles_zero() {
        assert!(percentage(5.0, 0.0).abs() < f64::EPSILON);
        assert!((percentage(1.0, 3.0) - 33.33).abs() < 1e-9);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[50.0, 10.0, 30.0]), Some(30.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(7_380.0), "2h 3m");
        assert_eq!(format_duration(93_600.0), "1d 2h");
        assert_eq!(format_duration(-5.0), "0s");
    }
}
