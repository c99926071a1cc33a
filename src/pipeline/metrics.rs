// src/pipeline/metrics.rs
//
// Session counters: how many frames were accepted, bootstrapped, or fell
// back, and why.

use super::lane_processor::{FrameDecision, RejectReason};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: u64,
    pub accepted: u64,
    pub bootstrapped: u64,
    pub rejected_implausible: u64,
    pub rejected_empty_cluster: u64,
    pub rejected_degenerate_fit: u64,
    pub unavailable: u64,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: 0,
            accepted: 0,
            bootstrapped: 0,
            rejected_implausible: 0,
            rejected_empty_cluster: 0,
            rejected_degenerate_fit: 0,
            unavailable: 0,
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, decision: &FrameDecision) {
        self.total_frames += 1;
        match decision {
            FrameDecision::Accepted => self.accepted += 1,
            FrameDecision::Bootstrapped => self.bootstrapped += 1,
            FrameDecision::Rejected(RejectReason::Implausible) => self.rejected_implausible += 1,
            FrameDecision::Rejected(RejectReason::EmptyCluster(_)) => {
                self.rejected_empty_cluster += 1
            }
            FrameDecision::Rejected(RejectReason::DegenerateFit(_)) => {
                self.rejected_degenerate_fit += 1
            }
        }
    }

    /// A frame that needed a fallback before anything was accepted.
    pub fn record_unavailable(&mut self) {
        self.total_frames += 1;
        self.unavailable += 1;
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_implausible + self.rejected_empty_cluster + self.rejected_degenerate_fit
    }

    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self, history_commits: u64) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            accepted: self.accepted,
            bootstrapped: self.bootstrapped,
            rejected: self.rejected(),
            rejected_implausible: self.rejected_implausible,
            rejected_empty_cluster: self.rejected_empty_cluster,
            rejected_degenerate_fit: self.rejected_degenerate_fit,
            unavailable: self.unavailable,
            history_commits,
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub accepted: u64,
    pub bootstrapped: u64,
    pub rejected: u64,
    pub rejected_implausible: u64,
    pub rejected_empty_cluster: u64,
    pub rejected_degenerate_fit: u64,
    pub unavailable: u64,
    pub history_commits: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
