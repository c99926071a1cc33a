// src/analysis/histogram.rs
//
// Seeds the sliding-window search: the columns with the most "on" pixels in
// the lower half of the mask are where each lane most likely starts.

use crate::mask::BinaryMask;
use tracing::debug;

/// Starting x-position of each lane at the bottom of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneSeeds {
    pub left_x: usize,
    pub right_x: usize,
}

/// Per-column count of "on" pixels over rows `height/2 .. height`.
pub fn lower_half_histogram(mask: &BinaryMask) -> Vec<u32> {
    let mut histogram = vec![0u32; mask.width()];
    for y in mask.height() / 2..mask.height() {
        for (count, &v) in histogram.iter_mut().zip(mask.row(y)) {
            if v != 0 {
                *count += 1;
            }
        }
    }
    histogram
}

/// Peak of the left half `[0, w/2)` and of the right half `[w/2, w)`.
///
/// An all-zero half seeds at its first column.
pub fn seed_lanes(mask: &BinaryMask) -> LaneSeeds {
    let histogram = lower_half_histogram(mask);
    let midpoint = mask.width() / 2;

    let left_x = argmax(&histogram[..midpoint]);
    let right_x = argmax(&histogram[midpoint..]) + midpoint;

    debug!(
        "Histogram seeds: left={} ({} px), right={} ({} px)",
        left_x,
        histogram.get(left_x).copied().unwrap_or(0),
        right_x,
        histogram.get(right_x).copied().unwrap_or(0)
    );

    LaneSeeds { left_x, right_x }
}

/// Index of the first maximum, 0 for an empty slice.
fn argmax(values: &[u32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_two_stripes() {
        let mask = BinaryMask::from_fn(1280, 720, |x, _| (295..305).contains(&x) || x == 900);
        let seeds = seed_lanes(&mask);
        assert_eq!(seeds.left_x, 295);
        assert_eq!(seeds.right_x, 900);
    }

    #[test]
    fn test_upper_half_ignored() {
        // Strong column only in the upper half, weak one in the lower half
        let mask = BinaryMask::from_fn(100, 100, |x, y| (x == 10 && y < 50) || (x == 30 && y == 80));
        let seeds = seed_lanes(&mask);
        assert_eq!(seeds.left_x, 30);
    }

    #[test]
    fn test_all_zero_mask() {
        let mask = BinaryMask::empty(200, 100);
        let seeds = seed_lanes(&mask);
        assert_eq!(seeds.left_x, 0);
        assert_eq!(seeds.right_x, 100);
    }

    #[test]
    fn test_first_max_wins() {
        assert_eq!(argmax(&[1, 5, 5, 2]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
