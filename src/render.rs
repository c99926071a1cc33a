// src/render.rs
//
// Draws the published lane region in the top-down view. Inverse warping and
// compositing onto the camera frame happen downstream.

use crate::mask::BinaryMask;
use crate::pipeline::{FrameDecision, LaneGeometry, PublishedFrame};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::map::map_colors2;
use imageproc::point::Point;

/// Region color for frames whose own detection was published.
pub const ACCEPTED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Region color for frames showing a fallback from history.
pub const FALLBACK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Weight of the lane layer when combined with the base image.
pub const OVERLAY_ALPHA: f32 = 0.3;

pub fn region_color(decision: &FrameDecision) -> Rgb<u8> {
    if decision.is_fallback() {
        FALLBACK_COLOR
    } else {
        ACCEPTED_COLOR
    }
}

/// Lane polygon in integer pixels.
///
/// x is clamped to one column past either image edge, which leaves every
/// in-image span unchanged. Returns None when the outline has a non-finite
/// vertex or collapses below three distinct points.
fn outline(geometry: &LaneGeometry, width: u32) -> Option<Vec<Point<i32>>> {
    let max_x = width as f64;
    let mut points = Vec::with_capacity(geometry.left.len() + geometry.right.len());
    for (x, y) in geometry.polygon() {
        if !x.is_finite() {
            return None;
        }
        points.push(Point::new(x.round().clamp(-1.0, max_x) as i32, y as i32));
    }

    points.dedup();
    // draw_polygon_mut closes the ring itself and rejects an explicit closure
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() >= 3).then_some(points)
}

/// The lane region filled with `color` on a black layer.
pub fn lane_layer(geometry: &LaneGeometry, width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    let mut layer = RgbImage::new(width, height);
    if let Some(points) = outline(geometry, width) {
        draw_polygon_mut(&mut layer, &points, color);
    }
    layer
}

/// `base + alpha · layer` per channel, saturating.
pub fn add_weighted(base: &RgbImage, layer: &RgbImage, alpha: f32) -> RgbImage {
    map_colors2(base, layer, |b: Rgb<u8>, l: Rgb<u8>| {
        Rgb(std::array::from_fn(|i| {
            (b[i] as f32 + alpha * l[i] as f32).round().min(255.0) as u8
        }))
    })
}

/// The mask in white on black, as a base for the overlay.
pub fn mask_to_rgb(mask: &BinaryMask) -> RgbImage {
    let gray = GrayImage::from_fn(mask.width() as u32, mask.height() as u32, |x, y| {
        if mask.is_on(x as usize, y as usize) {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    DynamicImage::ImageLuma8(gray).into_rgb8()
}

/// The published lane region over its mask, colored by decision.
pub fn overlay(mask: &BinaryMask, frame: &PublishedFrame) -> RgbImage {
    let base = mask_to_rgb(mask);
    let layer = lane_layer(
        &frame.result.geometry,
        base.width(),
        base.height(),
        region_color(&frame.decision),
    );
    add_weighted(&base, &layer, OVERLAY_ALPHA)
}
