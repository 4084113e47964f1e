//! Derived signal metrics: normalized percentage and qualitative rating.
//!
//! These are pure functions over the raw dB reading; presentation decides
//! how to render them.

/// dB domain the percentage scale maps onto. Readings outside it clamp.
const SIGNAL_FLOOR_DB: f64 = -110.0;
const SIGNAL_CEIL_DB: f64 = -40.0;

/// Maps a raw dB reading to `[0, 100]`. `None` (no reading yet) is 0.
pub fn normalize_signal(db: Option<f64>) -> u8 {
    let Some(db) = db.filter(|v| v.is_finite()) else {
        return 0;
    };

    let clamped = db.clamp(SIGNAL_FLOOR_DB, SIGNAL_CEIL_DB);
    let percent =
        (clamped - SIGNAL_FLOOR_DB) / (SIGNAL_CEIL_DB - SIGNAL_FLOOR_DB) * 100.0;
    percent.round() as u8
}

/// Qualitative rating of a signal reading.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignalQuality {
    Excellent,
    Good,
    Weak,
    Critical,
    NoSignal,
}

impl SignalQuality {
    pub fn label(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "Excellent",
            SignalQuality::Good => "Good",
            SignalQuality::Weak => "Weak",
            SignalQuality::Critical => "Critical",
            SignalQuality::NoSignal => "No Signal",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "#2e7d32",
            SignalQuality::Good => "#4caf50",
            SignalQuality::Weak => "#ff9800",
            SignalQuality::Critical => "#f44336",
            SignalQuality::NoSignal => "#9e9e9e",
        }
    }
}

/// Ordered threshold table, first match wins.
pub fn classify_signal(db: Option<f64>) -> SignalQuality {
    let Some(db) = db.filter(|v| v.is_finite()) else {
        return SignalQuality::NoSignal;
    };

    if db >= -50.0 {
        SignalQuality::Excellent
    } else if db >= -70.0 {
        SignalQuality::Good
    } else if db >= -85.0 {
        SignalQuality::Weak
    } else {
        SignalQuality::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_clamps_normalization_to_bounds() {
        assert_eq!(normalize_signal(Some(-110.0)), 0);
        assert_eq!(normalize_signal(Some(-150.0)), 0);
        assert_eq!(normalize_signal(Some(-40.0)), 100);
        assert_eq!(normalize_signal(Some(-10.0)), 100);
        assert_eq!(normalize_signal(Some(-75.0)), 50);
    }

    #[test]
    fn it_normalizes_missing_readings_to_zero() {
        assert_eq!(normalize_signal(None), 0);
        assert_eq!(normalize_signal(Some(f64::NAN)), 0);
    }

    #[test]
    fn normalization_is_monotonic() {
        let mut last = 0;
        for db in (-120..=-30).map(f64::from) {
            let pct = normalize_signal(Some(db));
            assert!(pct >= last, "percent dropped at {db} dB");
            last = pct;
        }
    }

    #[test]
    fn it_classifies_threshold_boundaries() {
        assert_eq!(classify_signal(Some(-42.0)), SignalQuality::Excellent);
        assert_eq!(classify_signal(Some(-50.0)), SignalQuality::Excellent);
        assert_eq!(classify_signal(Some(-50.0001)), SignalQuality::Good);
        assert_eq!(classify_signal(Some(-70.0)), SignalQuality::Good);
        assert_eq!(classify_signal(Some(-85.0)), SignalQuality::Weak);
        assert_eq!(classify_signal(Some(-85.0001)), SignalQuality::Critical);
        assert_eq!(classify_signal(Some(-120.0)), SignalQuality::Critical);
        assert_eq!(classify_signal(None), SignalQuality::NoSignal);
        assert_eq!(classify_signal(Some(f64::NAN)), SignalQuality::NoSignal);
    }

    #[test]
    fn every_rating_has_a_label_and_color() {
        for q in [
            SignalQuality::Excellent,
            SignalQuality::Good,
            SignalQuality::Weak,
            SignalQuality::Critical,
            SignalQuality::NoSignal,
        ] {
            assert!(!q.label().is_empty());
            assert!(q.color().starts_with('#'));
        }
    }
}
