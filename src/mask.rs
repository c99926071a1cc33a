// src/mask.rs
//
// Top-down binary mask of candidate lane-marking pixels, as handed over by
// the external threshold + warp stages. Any non-zero byte counts as "on".

use crate::error::{LaneError, LaneResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BinaryMask {
    /// Wrap a row-major single-channel buffer.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> LaneResult<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(LaneError::MaskSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Build a mask by evaluating `on(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut on: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(if on(x, y) { 255 } else { 0 });
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_on(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x] != 0
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Index every "on" pixel by row, for window queries.
    pub fn nonzero(&self) -> NonZeroPixels {
        let rows = (0..self.height)
            .map(|y| {
                self.row(y)
                    .iter()
                    .enumerate()
                    .filter(|(_, &v)| v != 0)
                    .map(|(x, _)| x as u32)
                    .collect()
            })
            .collect();
        NonZeroPixels { rows }
    }
}

/// All "on" pixel columns of a mask, grouped by row. Columns are ascending
/// within a row, so a window's horizontal band is a contiguous slice.
#[derive(Debug, Clone)]
pub struct NonZeroPixels {
    rows: Vec<Vec<u32>>,
}

impl NonZeroPixels {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Columns in row `y` with `x_lo <= x < x_hi`. Bounds may lie outside the image.
    pub fn in_row(&self, y: usize, x_lo: i64, x_hi: i64) -> &[u32] {
        let Some(row) = self.rows.get(y) else {
            return &[];
        };
        if x_hi <= x_lo || x_hi <= 0 {
            return &[];
        }
        let lo = x_lo.max(0);
        let start = row.partition_point(|&x| (x as i64) < lo);
        let end = row.partition_point(|&x| (x as i64) < x_hi);
        &row[start..end.max(start)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_size_mismatch() {
        let err = BinaryMask::from_raw(4, 4, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            LaneError::MaskSize {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_nonzero_rows_sorted() {
        let mask = BinaryMask::from_fn(10, 3, |x, y| x == 2 || x == 7 || (y == 1 && x == 5));
        let nz = mask.nonzero();
        assert_eq!(nz.height(), 3);
        assert_eq!(nz.in_row(0, 0, 10), &[2, 7]);
        assert_eq!(nz.in_row(1, 0, 10), &[2, 5, 7]);
        assert_eq!(nz.in_row(1, 3, 7), &[5]);
        assert_eq!(nz.in_row(0, -20, 3), &[2]);
        assert!(nz.in_row(0, 8, 100).is_empty());
        assert!(nz.in_row(5, 0, 10).is_empty());
    }

    #[test]
    fn test_is_on_out_of_bounds() {
        let mask = BinaryMask::from_fn(4, 4, |_, _| true);
        assert!(mask.is_on(3, 3));
        assert!(!mask.is_on(4, 0));
        assert_eq!(mask.count_on(), 16);
    }
}
