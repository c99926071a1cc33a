// src/analysis/mod.rs
//
// Per-frame lane geometry estimators.
//
// Signal flow:
//   BinaryMask → histogram (seeds) → sliding_window (left, right pixels)
//              → polynomial (pixel-space fits + plotted traces)
//              → curvature_estimator (metric refit, radius) + lateral_offset
//              → sanity (accept / reject)
//
// Orchestrated per frame by pipeline::LaneProcessor.

pub mod curvature_estimator;
pub mod histogram;
pub mod lateral_offset;
pub mod polynomial;
pub mod sanity;
pub mod sliding_window;

pub use curvature_estimator::{CurvatureEstimator, LaneCurvature, MetricScale, MAX_RADIUS_M};
pub use histogram::{seed_lanes, LaneSeeds};
pub use lateral_offset::{lateral_offset_m, offset_from_traces};
pub use polynomial::{
    fit_pixels, fit_quadratic, sample_rows, CoordinateSpace, CurveFit, FitOutcome, Metric, Pixel,
    PolynomialCurve,
};
pub use sanity::{SanityChecker, SanityReport};
pub use sliding_window::{LanePixels, PixelCoordinateSet, SearchWindow, SlidingWindowSearch};
