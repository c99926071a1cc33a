// src/lib.rs
//
// Lane geometry from rectified binary lane masks: lane-pixel search,
// polynomial fits, curvature and lateral offset, plausibility checking and
// a last-good fallback across a video session.

pub mod analysis;
pub mod config;
pub mod error;
pub mod frame_io;
pub mod mask;
pub mod pipeline;
pub mod render;
pub mod types;

pub use error::{LaneError, LaneResult};
pub use mask::BinaryMask;
pub use pipeline::{FrameDecision, FrameResult, LaneProcessor, PublishedFrame};
pub use types::{BootstrapPolicy, Config, Side};
