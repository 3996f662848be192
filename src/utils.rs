//! # Utility Functions
//!
//! Formatting helpers shared by the reporter and the binary, plus run
//! identifier generation.
//!
//! ## Value Formatting
//!
//! Every number the reporter prints or persists goes through
//! [`format_value`], which fixes the precision at two decimals and spells
//! non-finite values out explicitly:
//!
//! ```rust
//! use bench_measurement::utils::format_value;
//!
//! assert_eq!(format_value(100.0), "100.00");
//! assert_eq!(format_value(f64::INFINITY), "inf");
//! ```

use std::time::Duration;
use uuid::Uuid;

/// Generate a unique identifier for a benchmark run
///
/// Creates a UUID v4 string used to tag persisted results so that several
/// runs written to the same destination can be told apart.
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a result value with two decimals
///
/// Infinite values print as `inf` / `-inf` and NaN as `NaN`, which is what
/// an undefined throughput looks like in reports and persisted rows.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else {
        format!("{:.2}", value)
    }
}

/// Format an optional statistic, printing `-` when there is no data
pub fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), format_value)
}

/// Seconds as a float, the unit used for run-wide timing
pub fn duration_secs(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

/// Left-align `value` in a column of `width` characters
///
/// Values longer than the column are kept whole, matching `%-Ns` formatting.
pub fn pad(value: &str, width: usize) -> String {
    format!("{:<width$}", value, width = width)
}
