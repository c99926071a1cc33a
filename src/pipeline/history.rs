// src/pipeline/history.rs
//
// Single-slot cache of the last accepted frame. Only the most recent entry
// is ever read back, so nothing older is retained.

use super::frame_result::FrameResult;
use crate::error::{LaneError, LaneResult};

#[derive(Debug, Clone, Default)]
pub struct TemporalHistory {
    last_accepted: Option<FrameResult>,
    commits: u64,
}

impl TemporalHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored entry.
    pub fn commit(&mut self, result: FrameResult) {
        self.last_accepted = Some(result);
        self.commits += 1;
    }

    pub fn current(&self) -> LaneResult<&FrameResult> {
        self.last_accepted.as_ref().ok_or(LaneError::EmptyHistory)
    }

    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_none()
    }

    /// Number of commits over the session.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}
