// src/pipeline/mod.rs

pub mod frame_result;
pub mod history;
pub mod lane_processor;
pub mod metrics;

pub use frame_result::{CurvatureMetrics, FrameResult, LaneGeometry, LaneTrace};
pub use history::TemporalHistory;
pub use lane_processor::{Candidate, FrameDecision, LaneProcessor, PublishedFrame, RejectReason};
pub use metrics::{MetricsSummary, PipelineMetrics};
