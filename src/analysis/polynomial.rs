// src/analysis/polynomial.rs
//
// Least-squares quadratic fit x = a·y² + b·y + c, with y as the independent
// variable (lanes are near-vertical in the top-down view).
//
// Curves carry their coordinate space as a type parameter so a pixel-space
// fit can't be fed where a metric one is expected.
//
// y is centered and scaled to [-1, 1] before building the normal equations,
// then the coefficients are mapped back to the caller's units.

use super::sliding_window::PixelCoordinateSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A quadratic needs three distinct rows to be determined.
pub const MIN_DISTINCT_ROWS: usize = 3;

pub trait CoordinateSpace: Copy + Default + fmt::Debug + PartialEq {
    const UNIT: &'static str;
}

/// Image pixels of the rectified mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pixel;

/// Road-plane meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metric;

impl CoordinateSpace for Pixel {
    const UNIT: &'static str = "px";
}

impl CoordinateSpace for Metric {
    const UNIT: &'static str = "m";
}

/// `x = a·y² + b·y + c` in coordinate space `S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PolynomialCurve<S: CoordinateSpace> {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S: CoordinateSpace> PolynomialCurve<S> {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self {
            a,
            b,
            c,
            space: PhantomData,
        }
    }

    #[inline]
    pub fn x_at(&self, y: f64) -> f64 {
        (self.a * y + self.b) * y + self.c
    }

    /// dx/dy at `y`.
    #[inline]
    pub fn slope_at(&self, y: f64) -> f64 {
        2.0 * self.a * y + self.b
    }
}

impl<S: CoordinateSpace> fmt::Display for PolynomialCurve<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x = {:.6e}·y² + {:.4}·y + {:.2} [{}]",
            self.a,
            self.b,
            self.c,
            S::UNIT
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFit<S: CoordinateSpace> {
    pub curve: PolynomialCurve<S>,
    /// RMS residual in x, in units of `S`.
    pub rmse: f64,
    pub num_points: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome<S: CoordinateSpace> {
    Fit(CurveFit<S>),
    /// Too few points or rows, or a singular system.
    Degenerate { points: usize, distinct_rows: usize },
}

/// Fit a quadratic through `(ys[i], xs[i])`.
pub fn fit_quadratic<S: CoordinateSpace>(ys: &[f64], xs: &[f64]) -> FitOutcome<S> {
    let points = ys.len().min(xs.len());
    let ys = &ys[..points];
    let xs = &xs[..points];

    let distinct_rows = count_distinct(ys);
    let degenerate = FitOutcome::Degenerate {
        points,
        distinct_rows,
    };
    if points < MIN_DISTINCT_ROWS || distinct_rows < MIN_DISTINCT_ROWS {
        return degenerate;
    }

    let n = points as f64;
    let y_mean = ys.iter().sum::<f64>() / n;
    let y_scale = ys
        .iter()
        .map(|y| (y - y_mean).abs())
        .fold(0.0f64, f64::max);
    if !(y_scale > 0.0) || !y_scale.is_finite() {
        return degenerate;
    }

    let s0 = n;
    let mut s1 = 0.0f64;
    let mut s2 = 0.0f64;
    let mut s3 = 0.0f64;
    let mut s4 = 0.0f64;
    let mut sx0 = 0.0f64;
    let mut sx1 = 0.0f64;
    let mut sx2 = 0.0f64;

    for (&y, &x) in ys.iter().zip(xs) {
        let u = (y - y_mean) / y_scale;
        let u2 = u * u;
        s1 += u;
        s2 += u2;
        s3 += u2 * u;
        s4 += u2 * u2;
        sx0 += x;
        sx1 += x * u;
        sx2 += x * u2;
    }

    //   | s4 s3 s2 | | α |   | sx2 |
    //   | s3 s2 s1 | | β | = | sx1 |
    //   | s2 s1 s0 | | γ |   | sx0 |
    let Some((alpha, beta, gamma)) =
        solve_3x3([s4, s3, s2, s3, s2, s1, s2, s1, s0], [sx2, sx1, sx0])
    else {
        return degenerate;
    };

    // x = α·u² + β·u + γ with u = (y − m) / s
    let m = y_mean;
    let s = y_scale;
    let a = alpha / (s * s);
    let b = beta / s - 2.0 * alpha * m / (s * s);
    let c = alpha * m * m / (s * s) - beta * m / s + gamma;

    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return degenerate;
    }

    let curve = PolynomialCurve::new(a, b, c);
    let sse: f64 = ys
        .iter()
        .zip(xs)
        .map(|(&y, &x)| {
            let u = (y - m) / s;
            let residual = x - ((alpha * u + beta) * u + gamma);
            residual * residual
        })
        .sum();

    FitOutcome::Fit(CurveFit {
        curve,
        rmse: (sse / n).sqrt(),
        num_points: points,
    })
}

/// Fit a lane's collected pixels in image space.
pub fn fit_pixels(pixels: &PixelCoordinateSet) -> FitOutcome<Pixel> {
    let ys: Vec<f64> = pixels.ys.iter().map(|&y| y as f64).collect();
    let xs: Vec<f64> = pixels.xs.iter().map(|&x| x as f64).collect();
    fit_quadratic(&ys, &xs)
}

/// Evaluate `curve` at every row `0..height`, one x per row.
pub fn sample_rows(curve: &PolynomialCurve<Pixel>, height: usize) -> Vec<f64> {
    (0..height).map(|y| curve.x_at(y as f64)).collect()
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

/// Solve a 3×3 linear system Ax = b using Gaussian elimination with partial pivoting.
/// Matrix is row-major. Returns None if the system is singular.
fn solve_3x3(mat: [f64; 9], rhs: [f64; 3]) -> Option<(f64, f64, f64)> {
    let mut m = [
        [mat[0], mat[1], mat[2], rhs[0]],
        [mat[3], mat[4], mat[5], rhs[1]],
        [mat[6], mat[7], mat[8], rhs[2]],
    ];

    for col in 0..3 {
        let mut max_val = m[col][col].abs();
        let mut max_row = col;
        for (row, r) in m.iter().enumerate().skip(col + 1) {
            if r[col].abs() > max_val {
                max_val = r[col].abs();
                max_row = row;
            }
        }

        if max_val < 1e-12 {
            return None;
        }

        if max_row != col {
            m.swap(col, max_row);
        }

        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for j in col..4 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let c = m[2][3] / m[2][2];
    let b = (m[1][3] - m[1][2] * c) / m[1][1];
    let a = (m[0][3] - m[0][2] * c - m[0][1] * b) / m[0][0];

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Some((a, b, c))
    } else {
        None
    }
}
