//! Conversion between the 0-100 display scale and the logit scale.
//!
//! Question difficulty is tagged on a 0-100 scale in content metadata. The
//! estimator works in logits. Both sides must use these functions:
//!
//! ```text
//! logit   = (display - 50) / 10
//! display = logit * 10 + 50
//! ```
//!
//! So 50 is average difficulty, and ±4 logits maps to 10..90.

/// Display value that maps to 0 logits.
pub const DISPLAY_CENTER: f64 = 50.0;

/// Display points per logit.
pub const DISPLAY_PER_LOGIT: f64 = 10.0;

/// Lowest display value.
pub const DISPLAY_MIN: f64 = 0.0;

/// Highest display value.
pub const DISPLAY_MAX: f64 = 100.0;

/// Convert a 0-100 difficulty to logits. Out-of-range input is clamped first.
pub fn to_logit(display: f64) -> f64 {
    (display.clamp(DISPLAY_MIN, DISPLAY_MAX) - DISPLAY_CENTER) / DISPLAY_PER_LOGIT
}

/// Convert a logit value to the 0-100 display scale.
pub fn to_display(logit: f64) -> f64 {
    (logit * DISPLAY_PER_LOGIT + DISPLAY_CENTER).clamp(DISPLAY_MIN, DISPLAY_MAX)
}

/// Convert a logit distance (standard error, interval half-width) to display points.
pub fn logit_span_to_display(span: f64) -> f64 {
    span * DISPLAY_PER_LOGIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_maps_to_zero() {
        assert_eq!(to_logit(50.0), 0.0);
        assert_eq!(to_display(0.0), 50.0);
    }

    #[test]
    fn known_points() {
        assert_eq!(to_logit(30.0), -2.0);
        assert_eq!(to_logit(70.0), 2.0);
        assert_eq!(to_display(4.0), 90.0);
        assert_eq!(to_display(-4.0), 10.0);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(to_logit(150.0), 5.0);
        assert_eq!(to_logit(-20.0), -5.0);
        assert_eq!(to_display(9.0), 100.0);
    }

    #[test]
    fn conversion_is_consistent() {
        for d in [0.0, 12.5, 50.0, 63.0, 100.0] {
            assert!((to_display(to_logit(d)) - d).abs() < 1e-9);
        }
    }

    #[test]
    fn spans_scale_linearly() {
        assert_eq!(logit_span_to_display(0.5), 5.0);
    }
}
