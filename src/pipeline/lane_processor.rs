// src/pipeline/lane_processor.rs
//
// Per-frame orchestration and the processing session.
//
// Each frame starts out Evaluating: seeds → sliding windows → fits →
// curvature + offset → sanity check. It then ends in one of
//   Accepted      candidate passed, committed to history and published
//   Bootstrapped  history was empty and the policy force-accepts the first
//                 computable candidate; committed and published
//   Rejected      candidate failed (implausible, no pixels, degenerate fit);
//                 the last accepted frame is published instead, geometry and
//                 metrics alike, and history is left untouched
//
// A rejection with nothing in history yields LaneError::EmptyHistory. Under
// BootstrapPolicy::RequireSeed every frame before the first seed() yields it
// too, without being evaluated. The session keeps going; the caller decides
// what to show for that frame.
//
// Frames must be fed in video order: each frame reads the history written by
// the previous accepted one.

use super::frame_result::{CurvatureMetrics, FrameResult, LaneGeometry};
use super::history::TemporalHistory;
use super::metrics::{MetricsSummary, PipelineMetrics};
use crate::analysis::{
    fit_pixels, offset_from_traces, seed_lanes, CurvatureEstimator, FitOutcome, LanePixels,
    MetricScale, Pixel, PixelCoordinateSet, PolynomialCurve, SanityChecker, SanityReport,
    SlidingWindowSearch,
};
use crate::error::{LaneError, LaneResult};
use crate::mask::BinaryMask;
use crate::types::{BootstrapPolicy, Config, Side};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "side", rename_all = "snake_case")]
pub enum RejectReason {
    EmptyCluster(Side),
    DegenerateFit(Side),
    /// Both lanes were fitted but failed the sanity checks.
    Implausible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDecision {
    Accepted,
    Bootstrapped,
    Rejected(RejectReason),
}

impl FrameDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Bootstrapped => "BOOTSTRAPPED",
            Self::Rejected(_) => "REJECTED",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// A fully evaluated, not yet decided frame.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub result: FrameResult,
    pub sanity: SanityReport,
}

/// What a frame publishes for rendering and reporting.
#[derive(Debug, Clone)]
pub struct PublishedFrame {
    pub frame_index: u64,
    pub decision: FrameDecision,
    /// The candidate on accept, the last accepted entry on reject.
    pub result: FrameResult,
    /// Sanity report of this frame's candidate, if one was computable.
    pub sanity: Option<SanityReport>,
}

/// One processing session. Construct at session start, call
/// [`finish`](Self::finish) at session end.
pub struct LaneProcessor {
    config: Config,
    search: SlidingWindowSearch,
    history: TemporalHistory,
    metrics: PipelineMetrics,
    next_frame: u64,
}

impl LaneProcessor {
    pub fn new(config: Config) -> Self {
        info!(
            "Lane session: windows={} margin={} min_recenter={} bootstrap={:?}",
            config.search.n_windows,
            config.search.margin,
            config.search.min_recenter_pixels,
            config.session.bootstrap
        );
        Self {
            search: SlidingWindowSearch::new(&config.search),
            config,
            history: TemporalHistory::new(),
            metrics: PipelineMetrics::new(),
            next_frame: 0,
        }
    }

    pub fn history(&self) -> &TemporalHistory {
        &self.history
    }

    /// Frames fed so far, including ones that published nothing.
    pub fn frames_processed(&self) -> u64 {
        self.next_frame
    }

    /// Prime the history with a known-good frame. Required before any frame
    /// is processed under [`BootstrapPolicy::RequireSeed`].
    pub fn seed(&mut self, result: FrameResult) {
        info!("History seeded from frame {}", result.source_frame);
        self.history.commit(result);
    }

    /// Evaluate, decide and publish one frame.
    pub fn process_frame(&mut self, mask: &BinaryMask) -> LaneResult<PublishedFrame> {
        let frame_index = self.next_frame;
        self.next_frame += 1;

        if self.history.is_empty() && self.config.session.bootstrap == BootstrapPolicy::RequireSeed
        {
            self.metrics.record_unavailable();
            warn!("Frame {}: no seed frame yet, skipping", frame_index);
            return Err(LaneError::EmptyHistory);
        }

        match self.evaluate(mask, frame_index) {
            Ok(candidate) => {
                if candidate.sanity.passed() {
                    return Ok(self.accept(frame_index, candidate, FrameDecision::Accepted));
                }
                if self.history.is_empty() {
                    info!(
                        "Frame {}: bootstrapping history with unchecked candidate (width={:.2}m)",
                        frame_index, candidate.sanity.mean_width_m
                    );
                    return Ok(self.accept(frame_index, candidate, FrameDecision::Bootstrapped));
                }
                self.fall_back(frame_index, RejectReason::Implausible, Some(candidate.sanity))
            }
            Err(LaneError::EmptyCluster { side }) => {
                self.fall_back(frame_index, RejectReason::EmptyCluster(side), None)
            }
            Err(LaneError::DegenerateFit { side, .. }) => {
                self.fall_back(frame_index, RejectReason::DegenerateFit(side), None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run the estimators on `mask` without touching session state.
    pub fn evaluate(&self, mask: &BinaryMask, frame_index: u64) -> LaneResult<Candidate> {
        let height = mask.height();
        let scale = MetricScale::new(&self.config.scale, height);

        let seeds = seed_lanes(mask);
        let pixels = mask.nonzero();
        let left_pixels = collect(self.search.search(&pixels, seeds.left_x), Side::Left)?;
        let right_pixels = collect(self.search.search(&pixels, seeds.right_x), Side::Right)?;

        let left_curve = fit(&left_pixels, Side::Left)?;
        let right_curve = fit(&right_pixels, Side::Right)?;
        let geometry = LaneGeometry::from_curves(left_curve, right_curve, height);

        let estimator = CurvatureEstimator::new(scale, height);
        let left_radius_m = radius(&estimator, &left_pixels, Side::Left)?;
        let right_radius_m = radius(&estimator, &right_pixels, Side::Right)?;

        let offset_m = offset_from_traces(
            geometry.left.xs(),
            geometry.right.xs(),
            mask.width(),
            scale.x_m_per_px,
        )
        .ok_or(LaneError::EmptyCluster {
            side: if geometry.left.is_empty() {
                Side::Left
            } else {
                Side::Right
            },
        })?;

        let checker = SanityChecker::new(self.config.sanity.clone(), scale.x_m_per_px);
        let sanity = checker.evaluate(
            geometry.left.xs(),
            geometry.right.xs(),
            left_radius_m,
            right_radius_m,
        );

        debug!(
            "Frame {} candidate: left {} px, right {} px, R=({:.0}, {:.0})m, offset={:.2}m",
            frame_index,
            left_pixels.len(),
            right_pixels.len(),
            left_radius_m,
            right_radius_m,
            offset_m
        );

        Ok(Candidate {
            result: FrameResult {
                source_frame: frame_index,
                geometry,
                curvature: CurvatureMetrics {
                    left_radius_m,
                    right_radius_m,
                },
                offset_m,
                valid: sanity.passed(),
            },
            sanity,
        })
    }

    fn accept(
        &mut self,
        frame_index: u64,
        candidate: Candidate,
        decision: FrameDecision,
    ) -> PublishedFrame {
        self.history.commit(candidate.result.clone());
        self.metrics.record(&decision);
        debug!("Frame {}: {}", frame_index, decision.as_str());
        PublishedFrame {
            frame_index,
            decision,
            result: candidate.result,
            sanity: Some(candidate.sanity),
        }
    }

    fn fall_back(
        &mut self,
        frame_index: u64,
        reason: RejectReason,
        sanity: Option<SanityReport>,
    ) -> LaneResult<PublishedFrame> {
        let previous = match self.history.current() {
            Ok(previous) => previous.clone(),
            Err(e) => {
                self.metrics.record_unavailable();
                warn!(
                    "Frame {}: rejected ({:?}) with empty history, nothing to publish",
                    frame_index, reason
                );
                return Err(e);
            }
        };

        let decision = FrameDecision::Rejected(reason);
        self.metrics.record(&decision);
        warn!(
            "Frame {}: rejected ({:?}), falling back to frame {}",
            frame_index, reason, previous.source_frame
        );
        Ok(PublishedFrame {
            frame_index,
            decision,
            result: previous,
            sanity,
        })
    }

    /// End the session and report what happened.
    pub fn finish(self) -> MetricsSummary {
        let summary = self.metrics.summary(self.history.commits());
        info!(
            "Lane session finished: {} frames, {} accepted, {} bootstrapped, {} rejected, {} unavailable",
            summary.total_frames,
            summary.accepted,
            summary.bootstrapped,
            summary.rejected,
            summary.unavailable
        );
        summary
    }
}

fn collect(found: LanePixels, side: Side) -> LaneResult<PixelCoordinateSet> {
    match found {
        LanePixels::Found(pixels) => Ok(pixels),
        LanePixels::Empty => Err(LaneError::EmptyCluster { side }),
    }
}

fn fit(pixels: &PixelCoordinateSet, side: Side) -> LaneResult<PolynomialCurve<Pixel>> {
    match fit_pixels(pixels) {
        FitOutcome::Fit(fit) => {
            debug!("📐 {} fit {} (rmse={:.2})", side, fit.curve, fit.rmse);
            Ok(fit.curve)
        }
        FitOutcome::Degenerate {
            points,
            distinct_rows,
        } => Err(LaneError::DegenerateFit {
            side,
            points,
            distinct_rows,
        }),
    }
}

fn radius(
    estimator: &CurvatureEstimator,
    pixels: &PixelCoordinateSet,
    side: Side,
) -> LaneResult<f64> {
    estimator
        .estimate(pixels)
        .map(|lane| lane.radius_m)
        .ok_or_else(|| LaneError::DegenerateFit {
            side,
            points: pixels.len(),
            distinct_rows: pixels.ys.iter().collect::<BTreeSet<_>>().len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MAX_RADIUS_M;

    const W: usize = 1280;
    const H: usize = 720;

    /// Full-height vertical stripes, 11 px wide, centered on each x.
    fn stripes(centers: &[usize]) -> BinaryMask {
        BinaryMask::from_fn(W, H, |x, _| centers.iter().any(|&c| x + 5 >= c && x <= c + 5))
    }

    fn processor() -> LaneProcessor {
        LaneProcessor::new(Config::default())
    }

    #[test]
    fn test_straight_parallel_lanes_accepted() {
        let mut lp = processor();
        let frame = lp.process_frame(&stripes(&[300, 900])).unwrap();

        assert_eq!(frame.decision, FrameDecision::Accepted);
        let result = &frame.result;
        assert!(result.valid);
        assert!(result.geometry.left.xs().iter().all(|x| (x - 300.0).abs() < 1e-6));
        assert!(result.geometry.right.xs().iter().all(|x| (x - 900.0).abs() < 1e-6));
        assert_eq!(result.geometry.left.len(), H);
        assert!(result.curvature.left_radius_m > 1.0e5);
        assert!(result.curvature.right_radius_m > 1.0e5);
        assert!(result.curvature.left_radius_m <= MAX_RADIUS_M);
        assert!((result.offset_m - 40.0 * 3.7 / 640.0).abs() < 1e-6);
        assert_eq!(result.offset_text(), "Horizontal car offset: 0.23 meters");
        assert_eq!(lp.history().commits(), 1);
        assert_eq!(lp.history().current().unwrap().source_frame, 0);
    }

    #[test]
    fn test_implausible_width_falls_back() {
        let mut lp = processor();
        let first = lp.process_frame(&stripes(&[300, 900])).unwrap();

        // 865 px apart ≈ 5.0 m
        let second = lp.process_frame(&stripes(&[200, 1065])).unwrap();
        assert_eq!(
            second.decision,
            FrameDecision::Rejected(RejectReason::Implausible)
        );
        let sanity = second.sanity.unwrap();
        assert!((sanity.mean_width_m - 5.0).abs() < 0.01);
        assert!(!sanity.width_ok);

        // Geometry and metrics both come from frame 0
        assert_eq!(second.result, first.result);
        assert_eq!(second.result.source_frame, 0);
        assert_eq!(lp.history().commits(), 1);
        assert_eq!(lp.history().current().unwrap(), &first.result);
    }

    #[test]
    fn test_empty_lane_falls_back() {
        let mut lp = processor();
        lp.process_frame(&stripes(&[300, 900])).unwrap();

        let frame = lp.process_frame(&stripes(&[300])).unwrap();
        assert_eq!(
            frame.decision,
            FrameDecision::Rejected(RejectReason::EmptyCluster(Side::Right))
        );
        assert!(frame.sanity.is_none());
        assert_eq!(frame.result.source_frame, 0);
    }

    #[test]
    fn test_degenerate_fit_falls_back() {
        let mut lp = processor();
        lp.process_frame(&stripes(&[300, 900])).unwrap();

        // Left lane only has pixels on two rows
        let mask = BinaryMask::from_fn(W, H, |x, y| {
            (x + 5 >= 900 && x <= 905) || ((295..=305).contains(&x) && (y == 700 || y == 710))
        });
        let frame = lp.process_frame(&mask).unwrap();
        assert_eq!(
            frame.decision,
            FrameDecision::Rejected(RejectReason::DegenerateFit(Side::Left))
        );
    }

    #[test]
    fn test_first_frame_bootstraps() {
        let mut lp = processor();
        let frame = lp.process_frame(&stripes(&[200, 1065])).unwrap();
        assert_eq!(frame.decision, FrameDecision::Bootstrapped);
        assert!(!frame.result.valid);
        assert_eq!(lp.history().commits(), 1);

        // Once history exists, implausible frames are rejected
        let frame = lp.process_frame(&stripes(&[200, 1065])).unwrap();
        assert!(frame.decision.is_fallback());
        assert_eq!(frame.result.source_frame, 0);
    }

    #[test]
    fn test_empty_history_is_reported() {
        let mut lp = processor();
        let err = lp.process_frame(&BinaryMask::empty(W, H)).unwrap_err();
        assert_eq!(err, LaneError::EmptyHistory);

        // The session continues
        let frame = lp.process_frame(&stripes(&[300, 900])).unwrap();
        assert_eq!(frame.decision, FrameDecision::Accepted);
        assert_eq!(frame.frame_index, 1);
        assert_eq!(lp.frames_processed(), 2);

        let summary = lp.finish();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.unavailable, 1);
        assert_eq!(summary.accepted, 1);
    }

    #[test]
    fn test_require_seed_policy() {
        let mut config = Config::default();
        config.session.bootstrap = BootstrapPolicy::RequireSeed;
        let mut lp = LaneProcessor::new(config);

        // Even a plausible frame is not committed before a seed
        let err = lp.process_frame(&stripes(&[300, 900])).unwrap_err();
        assert_eq!(err, LaneError::EmptyHistory);
        assert!(lp.history().is_empty());
        assert_eq!(lp.history().commits(), 0);

        let seed = lp.evaluate(&stripes(&[300, 900]), 99).unwrap().result;
        lp.seed(seed);

        // Sanity checks apply from the first frame after the seed
        let frame = lp.process_frame(&stripes(&[200, 1065])).unwrap();
        assert_eq!(frame.result.source_frame, 99);
        assert!(frame.decision.is_fallback());

        let frame = lp.process_frame(&stripes(&[300, 900])).unwrap();
        assert_eq!(frame.decision, FrameDecision::Accepted);
        assert_eq!(frame.result.source_frame, 2);

        let summary = lp.finish();
        assert_eq!(summary.unavailable, 1);
        assert_eq!(summary.history_commits, 2);
    }

    #[test]
    fn test_curved_lanes_accepted() {
        // Two parallel parabolas bending right towards the top of the image
        let mask = BinaryMask::from_fn(W, H, |x, y| {
            let dy = (H - 1 - y) as f64;
            let shift = 2.5e-4 * dy * dy;
            [300.0, 940.0]
                .iter()
                .any(|&c| ((x as f64) - (c + shift)).abs() <= 5.0)
        });
        let mut lp = processor();
        let frame = lp.process_frame(&mask).unwrap();
        assert_eq!(frame.decision, FrameDecision::Accepted);
        let curvature = frame.result.curvature;
        assert!(curvature.left_radius_m < 10_000.0);
        let ratio = curvature.right_radius_m / curvature.left_radius_m;
        assert!((ratio - 1.0).abs() < 0.1);
    }
}
