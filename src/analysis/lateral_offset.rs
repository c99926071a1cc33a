// src/analysis/lateral_offset.rs
//
// Vehicle offset from lane center, measured at the bottom image row.
//
// Sign convention: the camera sits at the image's horizontal center.
//   offset > 0 → vehicle is RIGHT of lane center
//   offset < 0 → vehicle is LEFT of lane center

/// `(image_width/2 − lane_midpoint) · x_m_per_px`, where the lane midpoint is
/// the mean of both lanes' plotted x at the bottom row.
pub fn lateral_offset_m(
    left_bottom_x: f64,
    right_bottom_x: f64,
    image_width: usize,
    x_m_per_px: f64,
) -> f64 {
    let lane_midpoint = (left_bottom_x + right_bottom_x) / 2.0;
    let vehicle_x = image_width as f64 / 2.0;
    (vehicle_x - lane_midpoint) * x_m_per_px
}

/// Offset from two plotted traces; None if either trace is empty.
pub fn offset_from_traces(
    left_xs: &[f64],
    right_xs: &[f64],
    image_width: usize,
    x_m_per_px: f64,
) -> Option<f64> {
    let left = *left_xs.last()?;
    let right = *right_xs.last()?;
    Some(lateral_offset_m(left, right, image_width, x_m_per_px))
}
