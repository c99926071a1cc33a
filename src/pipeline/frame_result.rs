// src/pipeline/frame_result.rs
//
// What one frame publishes: both lanes' pixel-space curves and their
// row-sampled traces, metric curvature, and the vehicle's lateral offset.

use crate::analysis::{sample_rows, Pixel, PolynomialCurve};
use serde::Serialize;

/// A lane sampled at every image row: `xs[y]` is the lane's x at row `y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneTrace {
    xs: Vec<f64>,
}

impl LaneTrace {
    pub fn from_curve(curve: &PolynomialCurve<Pixel>, height: usize) -> Self {
        Self {
            xs: sample_rows(curve, height),
        }
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// `(x, y)` pairs, top row first.
    pub fn points(&self) -> impl DoubleEndedIterator<Item = (f64, f64)> + '_ {
        self.xs.iter().enumerate().map(|(y, &x)| (x, y as f64))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneGeometry {
    pub left_curve: PolynomialCurve<Pixel>,
    pub right_curve: PolynomialCurve<Pixel>,
    pub left: LaneTrace,
    pub right: LaneTrace,
}

impl LaneGeometry {
    pub fn from_curves(
        left_curve: PolynomialCurve<Pixel>,
        right_curve: PolynomialCurve<Pixel>,
        height: usize,
    ) -> Self {
        Self {
            left: LaneTrace::from_curve(&left_curve, height),
            right: LaneTrace::from_curve(&right_curve, height),
            left_curve,
            right_curve,
        }
    }

    /// Closed outline of the lane region: left lane top→bottom, then right
    /// lane bottom→top.
    pub fn polygon(&self) -> Vec<(f64, f64)> {
        self.left
            .points()
            .chain(self.right.points().rev())
            .collect()
    }
}

/// Radii of curvature at the vehicle row, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvatureMetrics {
    pub left_radius_m: f64,
    pub right_radius_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    /// Index of the frame this geometry was measured on.
    pub source_frame: u64,
    pub geometry: LaneGeometry,
    pub curvature: CurvatureMetrics,
    /// Positive when the vehicle is right of lane center.
    pub offset_m: f64,
    /// Whether the measurement passed the sanity checks.
    pub valid: bool,
}

impl FrameResult {
    pub fn curvature_text(&self) -> String {
        format!(
            "Left curvature: {:.0} meters, right curvature: {:.0} meters",
            self.curvature.left_radius_m, self.curvature.right_radius_m
        )
    }

    pub fn offset_text(&self) -> String {
        format!("Horizontal car offset: {:.2} meters", self.offset_m)
    }
}
