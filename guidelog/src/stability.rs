//! RMS tracking error and oscillation index over the sample history.
//!
//! Both statistics use the RA error of every retained sample after the
//! oldest one. The oscillation index is `1 - same_sign_pairs / n`: a loop
//! hunting evenly around the setpoint flips sign often (index near 1), while a
//! drifting loop stays on one side (index near 0).

use std::fmt;

use shared::algo::stats::{rms_about_mean, same_sign_pairs};

use crate::sample_history::Sample;

/// Above this the loop reverses too often (over-correcting).
pub const OSCILLATION_INDEX_HIGH: f64 = 0.6;
/// Below this the loop rarely reverses (drift or under-correction).
pub const OSCILLATION_INDEX_LOW: f64 = 0.15;

/// Unscaled stability statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StabilityStats {
    /// RMS of RA error about its mean
    pub rms: f64,
    /// Fraction of consecutive RA pairs that changed sign, in `[0, 1]`
    pub oscillation_index: f64,
    /// Number of consecutive pairs the statistics were computed over
    pub pairs: usize,
}

impl StabilityStats {
    /// Compute statistics from samples in chronological order.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let ra: Vec<f64> = samples.into_iter().map(|s| s.ra).collect();
        Self::from_ra(&ra)
    }

    /// Compute statistics from RA errors in chronological order.
    pub fn from_ra(ra: &[f64]) -> Self {
        if ra.len() < 2 {
            return Self::default();
        }

        let tail = &ra[1..];
        let pairs = tail.len();
        let same = same_sign_pairs(ra);

        Self {
            rms: rms_about_mean(tail),
            oscillation_index: 1.0 - same as f64 / pairs as f64,
            pairs,
        }
    }

    /// True when the oscillation index falls outside the healthy band.
    ///
    /// An empty history is never flagged.
    pub fn is_oscillation_anomalous(&self) -> bool {
        self.pairs > 0
            && (self.oscillation_index > OSCILLATION_INDEX_HIGH
                || self.oscillation_index < OSCILLATION_INDEX_LOW)
    }

    /// Attach a display scale (e.g. arcseconds per pixel).
    pub fn report(&self, sampling: f64) -> StabilityReport {
        StabilityReport {
            stats: *self,
            sampling,
        }
    }
}

/// Statistics paired with the scale used to display them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityReport {
    pub stats: StabilityStats,
    pub sampling: f64,
}

impl StabilityReport {
    pub fn scaled_rms(&self) -> f64 {
        self.stats.rms * self.sampling
    }

    pub fn scaled_oscillation_index(&self) -> f64 {
        self.stats.oscillation_index * self.sampling
    }

    pub fn is_oscillation_anomalous(&self) -> bool {
        self.stats.is_oscillation_anomalous()
    }

    fn is_scaled(&self) -> bool {
        self.sampling != 1.0
    }

    pub fn rms_label(&self) -> String {
        if self.is_scaled() {
            format!("RMS: {:4.2} ({:.2}'')", self.stats.rms, self.scaled_rms())
        } else {
            format!("RMS: {:4.2}", self.stats.rms)
        }
    }

    pub fn oscillation_label(&self) -> String {
        if self.is_scaled() {
            format!(
                "Osc: {:4.2} ({:.2})",
                self.stats.oscillation_index,
                self.scaled_oscillation_index()
            )
        } else {
            format!("Osc: {:4.2}", self.stats.oscillation_index)
        }
    }
}

impl fmt::Display for StabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.rms_label(), self.oscillation_label())?;
        if self.is_oscillation_anomalous() {
            f.write_str("  [oscillation out of range]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_history::{GraphLimits, SampleHistory};
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn history_with_ra(values: &[f64]) -> SampleHistory {
        let mut history = SampleHistory::default();
        for &ra in values {
            history.append(Sample::new(0.0, 0.0, ra, 0.0));
        }
        history
    }

    #[test]
    fn test_alternating_signs() {
        let stats = StabilityStats::from_ra(&[1.0, -1.0, 1.0, -1.0, 1.0]);
        assert_relative_eq!(stats.oscillation_index, 1.0);
        assert_relative_eq!(stats.rms, 1.0);
        assert_eq!(stats.pairs, 4);
        assert!(stats.is_oscillation_anomalous());
    }

    #[test]
    fn test_fewer_than_two_samples() {
        assert_eq!(StabilityStats::from_ra(&[]), StabilityStats::default());
        let single = StabilityStats::from_ra(&[3.0]);
        assert_eq!(single.rms, 0.0);
        assert_eq!(single.oscillation_index, 0.0);
        assert!(!single.is_oscillation_anomalous());
    }

    #[test]
    fn test_drift_has_low_index() {
        let ra: Vec<f64> = (1..=20).map(|i| i as f64 * 0.1).collect();
        let stats = StabilityStats::from_ra(&ra);
        assert_relative_eq!(stats.oscillation_index, 0.0);
        assert!(stats.is_oscillation_anomalous());
    }

    #[test]
    fn test_healthy_band() {
        // Two sign flips over four pairs
        let stats = StabilityStats::from_ra(&[1.0, 2.0, -1.0, -2.0, 1.0]);
        assert_relative_eq!(stats.oscillation_index, 0.5);
        assert!(!stats.is_oscillation_anomalous());
    }

    #[test]
    fn test_first_sample_excluded_from_rms() {
        // The outlier at the front only participates as the first pair member.
        let stats = StabilityStats::from_ra(&[100.0, 1.0, -1.0]);
        assert_relative_eq!(stats.rms, 1.0);
    }

    #[test]
    fn test_uses_full_history_not_window() {
        let mut values = vec![5.0; 60];
        values.extend([1.0, -1.0, 1.0, -1.0]);
        let history = history_with_ra(&values);
        assert_eq!(history.window().len(), 50);

        let full = history.stability();
        let windowed = StabilityStats::from_samples(history.window());
        assert_eq!(full.pairs, 63);
        assert_eq!(windowed.pairs, 49);
        assert!(full.oscillation_index < windowed.oscillation_index);
    }

    #[test]
    fn test_sampling_scales_report_only() {
        let mut store: HashMap<String, i64> = HashMap::new();
        let mut limits = GraphLimits::default();
        limits.set_max_length(100, &mut store).unwrap();
        let mut history = SampleHistory::new(limits);
        for ra in [1.0, -1.0, 1.0, -1.0, 1.0] {
            history.append(Sample::new(0.0, 0.0, ra, 0.0));
        }

        let report = history.stability_report(1.5);
        assert_relative_eq!(report.scaled_rms(), 1.5);
        assert_relative_eq!(report.scaled_oscillation_index(), 1.5);
        assert_relative_eq!(report.stats.rms, 1.0);
        assert_relative_eq!(history.stability().rms, 1.0);
    }

    #[test]
    fn test_labels() {
        let stats = StabilityStats::from_ra(&[1.0, -1.0, 1.0, -1.0, 1.0]);
        assert_eq!(stats.report(1.0).rms_label(), "RMS: 1.00");
        assert_eq!(stats.report(2.0).rms_label(), "RMS: 1.00 (2.00'')");
        assert_eq!(stats.report(1.0).oscillation_label(), "Osc: 1.00");
        assert_eq!(stats.report(0.5).oscillation_label(), "Osc: 1.00 (0.50)");
        assert!(stats.report(1.0).to_string().contains("out of range"));
    }
}
