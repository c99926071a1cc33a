use crate::types::Side;
use thiserror::Error;

pub type LaneResult<T> = std::result::Result<T, LaneError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaneError {
    /// No sliding window collected a single pixel for this lane.
    #[error("no lane pixels found for the {side} lane")]
    EmptyCluster { side: Side },

    /// Too few points, or too few distinct rows, to determine a quadratic.
    #[error("degenerate {side} lane fit: {points} points over {distinct_rows} distinct rows")]
    DegenerateFit {
        side: Side,
        points: usize,
        distinct_rows: usize,
    },

    /// A fallback was needed before any frame was accepted.
    #[error("no accepted frame in history to fall back to")]
    EmptyHistory,

    #[error("mask buffer size mismatch: expected {expected}, got {actual}")]
    MaskSize { expected: usize, actual: usize },
}
