//! Per-mode score normalisation.
//!
//! Raw scores of the different scoring modes live on very different scales.
//! Dividing by the mode's average per-basis maximum brings them onto a
//! comparable range.

/// Names of the writer's scoring modes, indexed by `scoring_mode`.
pub const MODE_NAMES: [&str; 6] = [
    "RICHNESS",
    "FREQ",
    "SUM",
    "HYBRID (LEGACY)",
    "HYBRID",
    "HYBRID_SQRT",
];

/// Display name of `mode`, `None` for codes the writer does not define.
pub fn mode_name(mode: i32) -> Option<&'static str> {
    usize::try_from(mode).ok().and_then(|m| MODE_NAMES.get(m).copied())
}

/// Divisors turning raw scores into normalised ones, one per mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreScales {
    scales: [f64; MODE_NAMES.len()],
}

impl ScoreScales {
    /// Computes the scales for a writer built with `basis_max_range`.
    pub fn new(basis_max_range: u32) -> Self {
        let (mut freq, mut sum, mut hybrid, mut sqrt) = (0.0, 0.0, 0.0, 0.0);

        for i in 1..basis_max_range {
            let inv = 1_000_000.0 / f64::from(i);
            freq += 1.0;
            sum += inv;
            hybrid += inv + 803.0;
            sqrt += 10_000.0 / f64::from(i.isqrt().max(1)) + 185.0;
        }

        let norm = f64::from(basis_max_range.saturating_sub(1).max(1));
        Self {
            scales: [
                1.0,
                freq / norm,
                sum / norm,
                hybrid / norm,
                hybrid / norm,
                sqrt / norm,
            ],
        }
    }

    /// Scale of `mode`; 1 for unknown modes.
    pub fn scale(&self, mode: i32) -> f64 {
        usize::try_from(mode)
            .ok()
            .and_then(|m| self.scales.get(m).copied())
            .unwrap_or(1.0)
    }

    /// `raw` divided by the scale of `mode`, or `raw` itself if the scale is zero.
    pub fn normalize(&self, mode: i32, raw: i64) -> f64 {
        let scale = self.scale(mode);
        if scale == 0.0 {
            raw as f64
        } else {
            raw as f64 / scale
        }
    }
}

impl Default for ScoreScales {
    fn default() -> Self {
        Self::new(13_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_two_has_a_single_term() {
        let scales = ScoreScales::new(2);
        let expected = [1.0, 1.0, 1e6, 1_000_803.0, 1_000_803.0, 10_185.0];
        for (mode, want) in expected.iter().enumerate() {
            assert_eq!(scales.scale(mode as i32), *want, "mode {mode}");
        }
    }

    #[test]
    fn unknown_mode_is_unscaled() {
        let scales = ScoreScales::default();
        assert_eq!(scales.scale(-1), 1.0);
        assert_eq!(scales.scale(6), 1.0);
        assert_eq!(scales.normalize(9, 1234), 1234.0);
    }

    #[test]
    fn richness_is_raw_and_freq_is_one() {
        let scales = ScoreScales::default();
        assert_eq!(scales.normalize(0, 5000), 5000.0);
        assert_eq!(scales.scale(1), 1.0);
        assert!(scales.scale(2) > scales.scale(5));
    }

    #[test]
    fn mode_names_by_code() {
        assert_eq!(mode_name(3), Some("HYBRID (LEGACY)"));
        assert_eq!(mode_name(5), Some("HYBRID_SQRT"));
        assert_eq!(mode_name(6), None);
        assert_eq!(mode_name(-2), None);
    }
}
