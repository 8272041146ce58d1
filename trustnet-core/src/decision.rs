//! Display policy: maps a trust score to a [`Decision`].

use crate::types::Decision;

/// Scores strictly above this are shown as-is.
pub const SHOW_THRESHOLD: f64 = 0.80;

/// Scores at or above this (and not above [`SHOW_THRESHOLD`]) are shown with
/// a warning. Anything lower is flagged.
pub const WARNING_THRESHOLD: f64 = 0.50;

/// Decide how an answer with the given trust score should be displayed.
///
/// A NaN score fails both comparisons and is flagged.
pub fn decide(trust_score: f64) -> Decision {
    if trust_score > SHOW_THRESHOLD {
        Decision::Show
    } else if trust_score >= WARNING_THRESHOLD {
        Decision::ShowWithWarning
    } else {
        Decision::Flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(decide(0.80), Decision::ShowWithWarning);
        assert_eq!(decide(0.8001), Decision::Show);
        assert_eq!(decide(0.50), Decision::ShowWithWarning);
        assert_eq!(decide(0.4999), Decision::Flag);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(decide(1.0), Decision::Show);
        assert_eq!(decide(0.0), Decision::Flag);
    }

    #[test]
    fn test_nan_is_flagged() {
        assert_eq!(decide(f64::NAN), Decision::Flag);
    }
}
