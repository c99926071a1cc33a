// src/analysis/sliding_window.rs
//
// Sliding-window pixel clustering for one lane boundary.
//
// The image height is split into `n_windows` bands of `height / n_windows`
// rows, walked bottom to top. Each band keeps the pixels within `margin` of
// the cursor; a band holding more than `min_recenter_pixels` pixels moves the
// cursor to their mean x for the next band up.

use crate::mask::NonZeroPixels;
use crate::types::SearchConfig;
use tracing::debug;

/// Pixel coordinates collected for one lane, split into parallel x/y sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelCoordinateSet {
    pub xs: Vec<u32>,
    pub ys: Vec<u32>,
}

impl PixelCoordinateSet {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    fn push(&mut self, x: u32, y: u32) {
        self.xs.push(x);
        self.ys.push(y);
    }
}

/// Outcome of searching for one lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanePixels {
    Found(PixelCoordinateSet),
    Empty,
}

/// One band of the search, kept for diagnostics and overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub y_low: usize,
    pub y_high: usize,
    pub x_low: i64,
    pub x_high: i64,
    pub pixel_count: usize,
}

#[derive(Debug, Clone)]
pub struct SlidingWindowSearch {
    n_windows: usize,
    margin: i64,
    min_recenter_pixels: usize,
}

impl SlidingWindowSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            n_windows: config.n_windows.max(1),
            margin: config.margin,
            min_recenter_pixels: config.min_recenter_pixels,
        }
    }

    /// Collect the pixels of the lane starting at `seed_x`.
    pub fn search(&self, pixels: &NonZeroPixels, seed_x: usize) -> LanePixels {
        self.search_with_windows(pixels, seed_x).0
    }

    /// Same as [`search`](Self::search), also returning every window visited.
    pub fn search_with_windows(
        &self,
        pixels: &NonZeroPixels,
        seed_x: usize,
    ) -> (LanePixels, Vec<SearchWindow>) {
        let height = pixels.height();
        let window_height = height / self.n_windows;
        let mut cursor = seed_x as i64;
        let mut collected = PixelCoordinateSet::default();
        let mut windows = Vec::with_capacity(self.n_windows);

        for w in 0..self.n_windows {
            let y_low = height - (w + 1) * window_height;
            let y_high = height - w * window_height;
            let x_low = cursor - self.margin;
            let x_high = cursor + self.margin;

            let mut count = 0usize;
            let mut sum_x = 0u64;
            for y in y_low..y_high {
                for &x in pixels.in_row(y, x_low, x_high) {
                    collected.push(x, y as u32);
                    sum_x += x as u64;
                    count += 1;
                }
            }

            windows.push(SearchWindow {
                y_low,
                y_high,
                x_low,
                x_high,
                pixel_count: count,
            });

            if count > self.min_recenter_pixels {
                cursor = (sum_x as f64 / count as f64).round() as i64;
            }

            debug!(
                "  window {}: rows [{}, {}) cols [{}, {}) → {} px, cursor={}",
                w, y_low, y_high, x_low, x_high, count, cursor
            );
        }

        let result = if collected.is_empty() {
            LanePixels::Empty
        } else {
            LanePixels::Found(collected)
        };
        (result, windows)
    }
}
