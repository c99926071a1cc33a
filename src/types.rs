use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub scale: ScaleConfig,
    pub sanity: SanityConfig,
    pub session: SessionConfig,
    pub io: IoConfig,
    pub logging: LoggingConfig,
}

/// Sliding-window search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of vertical bands the image height is split into.
    pub n_windows: usize,
    /// Half-width of each window in pixels.
    pub margin: i64,
    /// A window must collect MORE than this many pixels to recenter the cursor.
    pub min_recenter_pixels: usize,
}

/// Fixed physical scale assumptions for the rectified view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Road length covered by the full image height.
    pub view_depth_m: f64,
    /// Real lane width spanning `reference_width_px`.
    pub lane_width_m: f64,
    pub reference_width_px: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityConfig {
    pub min_lane_width_m: f64,
    pub max_lane_width_m: f64,
    pub min_curvature_ratio: f64,
    pub max_curvature_ratio: f64,
    /// The symmetry check only runs when both radii are below this.
    pub curvature_gate_m: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub bootstrap: BootstrapPolicy,
}

/// What to do before any frame has been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapPolicy {
    /// Accept the first computable candidate even if it fails sanity checks.
    #[default]
    ForceAcceptFirst,
    /// Publish nothing until history is seeded explicitly; sanity-check every
    /// frame after that.
    RequireSeed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub write_overlays: bool,
    pub write_jsonl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_windows: 9,
            margin: 75,
            min_recenter_pixels: 50,
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            view_depth_m: 35.0,
            lane_width_m: 3.7,
            reference_width_px: 640.0,
        }
    }
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            min_lane_width_m: 3.4,
            max_lane_width_m: 4.0,
            min_curvature_ratio: 0.5,
            max_curvature_ratio: 2.0,
            curvature_gate_m: 1000.0,
        }
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input_dir: "masks".to_string(),
            output_dir: "output".to_string(),
            write_overlays: true,
            write_jsonl: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "lane_geometry=info".to_string(),
        }
    }
}

/// Which lane boundary a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
