// src/analysis/sanity.rs
//
// Frame-level plausibility gate. A detection passes when
//   1. the mean lane width over all rows is a believable road lane width, and
//   2. for two clearly curved boundaries (both radii under the gate), their
//      radii agree within a factor of two.
// Large radii are near-straight and their ratio is noise, so rule 2 is
// skipped when either radius reaches the gate.

use crate::types::SanityConfig;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanityReport {
    /// Mean of `(right_x − left_x) · x_m_per_px` over all rows; NaN for empty traces.
    pub mean_width_m: f64,
    /// `right / left` radius ratio, None when the symmetry check was skipped.
    pub curvature_ratio: Option<f64>,
    pub width_ok: bool,
    pub symmetry_ok: bool,
}

impl SanityReport {
    pub fn passed(&self) -> bool {
        self.width_ok && self.symmetry_ok
    }
}

#[derive(Debug, Clone)]
pub struct SanityChecker {
    config: SanityConfig,
    x_m_per_px: f64,
}

impl SanityChecker {
    pub fn new(config: SanityConfig, x_m_per_px: f64) -> Self {
        Self { config, x_m_per_px }
    }

    pub fn evaluate(
        &self,
        left_xs: &[f64],
        right_xs: &[f64],
        left_radius_m: f64,
        right_radius_m: f64,
    ) -> SanityReport {
        let rows = left_xs.len().min(right_xs.len());
        let mean_width_m = if rows == 0 {
            f64::NAN
        } else {
            left_xs
                .iter()
                .zip(right_xs)
                .map(|(l, r)| (r - l) * self.x_m_per_px)
                .sum::<f64>()
                / rows as f64
        };
        let width_ok = mean_width_m >= self.config.min_lane_width_m
            && mean_width_m <= self.config.max_lane_width_m;

        let gate = self.config.curvature_gate_m;
        let (curvature_ratio, symmetry_ok) = if left_radius_m < gate && right_radius_m < gate {
            let ratio = right_radius_m / left_radius_m;
            let ok = ratio.is_finite()
                && ratio >= self.config.min_curvature_ratio
                && ratio <= self.config.max_curvature_ratio;
            (Some(ratio), ok)
        } else {
            (None, true)
        };

        let report = SanityReport {
            mean_width_m,
            curvature_ratio,
            width_ok,
            symmetry_ok,
        };

        debug!(
            "Sanity: width={:.2}m ({}) ratio={} ({}) → {}",
            mean_width_m,
            if width_ok { "ok" } else { "out of range" },
            curvature_ratio.map_or_else(|| "skipped".to_string(), |r| format!("{:.2}", r)),
            if symmetry_ok { "ok" } else { "asymmetric" },
            if report.passed() { "PASS" } else { "FAIL" }
        );

        report
    }
}
