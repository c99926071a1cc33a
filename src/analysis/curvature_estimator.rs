// src/analysis/curvature_estimator.rs
//
// Radius of curvature in meters, nearest the vehicle.
//
// The lane's pixels are rescaled into road-plane meters with fixed
// meters-per-pixel factors and refit, then the osculating-circle radius
//
//     R = (1 + (2·a·y + b)²)^1.5 / |2·a|
//
// is evaluated at the bottom image row. A straight lane (a = 0) has no finite
// radius; it reports MAX_RADIUS_M instead.

use super::polynomial::{fit_quadratic, FitOutcome, Metric, PolynomialCurve};
use super::sliding_window::PixelCoordinateSet;
use crate::types::ScaleConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Radius reported for straight or near-straight lanes; all radii are clamped to it.
pub const MAX_RADIUS_M: f64 = 1.0e6;

/// Fixed meters-per-pixel factors of the rectified view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScale {
    pub x_m_per_px: f64,
    pub y_m_per_px: f64,
}

impl MetricScale {
    /// `view_depth_m` spans the full image height; `lane_width_m` spans
    /// `reference_width_px` columns.
    pub fn new(config: &ScaleConfig, image_height: usize) -> Self {
        Self {
            x_m_per_px: config.lane_width_m / config.reference_width_px,
            y_m_per_px: config.view_depth_m / image_height.max(1) as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneCurvature {
    pub radius_m: f64,
    pub curve: PolynomialCurve<Metric>,
}

#[derive(Debug, Clone)]
pub struct CurvatureEstimator {
    scale: MetricScale,
    image_height: usize,
}

impl CurvatureEstimator {
    pub fn new(scale: MetricScale, image_height: usize) -> Self {
        Self {
            scale,
            image_height,
        }
    }

    /// Road-plane distance of the bottom image row.
    pub fn vehicle_y_m(&self) -> f64 {
        self.image_height.saturating_sub(1) as f64 * self.scale.y_m_per_px
    }

    /// Refit `pixels` in meters and measure the radius at the vehicle row.
    ///
    /// Returns None when the metric fit is degenerate.
    pub fn estimate(&self, pixels: &PixelCoordinateSet) -> Option<LaneCurvature> {
        let ys: Vec<f64> = pixels
            .ys
            .iter()
            .map(|&y| y as f64 * self.scale.y_m_per_px)
            .collect();
        let xs: Vec<f64> = pixels
            .xs
            .iter()
            .map(|&x| x as f64 * self.scale.x_m_per_px)
            .collect();

        let curve = match fit_quadratic::<Metric>(&ys, &xs) {
            FitOutcome::Fit(fit) => fit.curve,
            FitOutcome::Degenerate {
                points,
                distinct_rows,
            } => {
                debug!(
                    "Metric refit degenerate: {} points over {} rows",
                    points, distinct_rows
                );
                return None;
            }
        };

        let radius_m = radius_at(&curve, self.vehicle_y_m());
        debug!("📐 Metric fit {} → R={:.0}m", curve, radius_m);
        Some(LaneCurvature { radius_m, curve })
    }
}

/// Radius of curvature of `curve` at `y_m`, clamped to [`MAX_RADIUS_M`].
pub fn radius_at(curve: &PolynomialCurve<Metric>, y_m: f64) -> f64 {
    let two_a = (2.0 * curve.a).abs();
    if two_a == 0.0 || !two_a.is_finite() {
        return MAX_RADIUS_M;
    }
    let slope = curve.slope_at(y_m);
    let radius = (1.0 + slope * slope).powf(1.5) / two_a;
    if radius.is_finite() {
        radius.min(MAX_RADIUS_M)
    } else {
        MAX_RADIUS_M
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> CurvatureEstimator {
        let scale = MetricScale::new(&ScaleConfig::default(), 720);
        CurvatureEstimator::new(scale, 720)
    }

    #[test]
    fn test_scale_factors() {
        let scale = MetricScale::new(&ScaleConfig::default(), 700);
        assert!((scale.x_m_per_px - 3.7 / 640.0).abs() < 1e-15);
        assert!((scale.y_m_per_px - 0.05).abs() < 1e-15);
    }

    #[test]
    fn test_zero_leading_coefficient_is_sentinel() {
        let curve = PolynomialCurve::<Metric>::new(0.0, 0.2, 1.0);
        assert_eq!(radius_at(&curve, 30.0), MAX_RADIUS_M);
    }

    #[test]
    fn test_known_radius() {
        // x = y²/(2R) has curvature 1/R at its vertex
        let curve = PolynomialCurve::<Metric>::new(1.0 / 1000.0, 0.0, 0.0);
        assert!((radius_at(&curve, 0.0) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_lane_pixels() {
        let mut pixels = PixelCoordinateSet::default();
        for y in 0..720u32 {
            for x in 295..305u32 {
                pixels.xs.push(x);
                pixels.ys.push(y);
            }
        }
        let lane = estimator().estimate(&pixels).unwrap();
        assert!(lane.radius_m.is_finite());
        assert!(lane.radius_m > 1.0e5);
    }

    #[test]
    fn test_curved_lane_pixels() {
        // Circle of radius 200 m sampled in metric space, mapped back to pixels
        let est = estimator();
        let scale = MetricScale::new(&ScaleConfig::default(), 720);
        let r = 200.0;
        let mut pixels = PixelCoordinateSet::default();
        for y in 0..720u32 {
            let y_m = y as f64 * scale.y_m_per_px;
            let dy = est.vehicle_y_m() - y_m;
            let x_m = 2.0 + r - (r * r - dy * dy).sqrt();
            pixels.xs.push((x_m / scale.x_m_per_px).round() as u32);
            pixels.ys.push(y);
        }
        let lane = est.estimate(&pixels).unwrap();
        assert!(
            (lane.radius_m - r).abs() / r < 0.1,
            "expected ≈{}m, got {}",
            r,
            lane.radius_m
        );
    }

    #[test]
    fn test_degenerate_refit() {
        let pixels = PixelCoordinateSet {
            xs: vec![10, 11],
            ys: vec![5, 6],
        };
        assert!(estimator().estimate(&pixels).is_none());
    }
}
