use crate::types::Config;
use anyhow::{ensure, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        ensure!(search.n_windows > 0, "search.n_windows must be positive");
        ensure!(search.margin > 0, "search.margin must be positive");

        let scale = &self.scale;
        ensure!(
            scale.view_depth_m > 0.0 && scale.lane_width_m > 0.0 && scale.reference_width_px > 0.0,
            "scale values must be positive (got depth={}, width={}, ref_px={})",
            scale.view_depth_m,
            scale.lane_width_m,
            scale.reference_width_px
        );

        let sanity = &self.sanity;
        ensure!(
            sanity.min_lane_width_m <= sanity.max_lane_width_m,
            "sanity lane width bounds are inverted: [{}, {}]",
            sanity.min_lane_width_m,
            sanity.max_lane_width_m
        );
        ensure!(
            sanity.min_curvature_ratio > 0.0
                && sanity.min_curvature_ratio <= sanity.max_curvature_ratio,
            "sanity curvature ratio bounds are invalid: [{}, {}]",
            sanity.min_curvature_ratio,
            sanity.max_curvature_ratio
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BootstrapPolicy;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = Config::default();
        assert_eq!(config.search.n_windows, 9);
        assert_eq!(config.search.margin, 75);
        assert_eq!(config.search.min_recenter_pixels, 50);
        assert_eq!(config.scale.view_depth_m, 35.0);
        assert_eq!(config.sanity.curvature_gate_m, 1000.0);
        assert_eq!(config.session.bootstrap, BootstrapPolicy::ForceAcceptFirst);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "search:\n  margin: 100\nsession:\n  bootstrap: require_seed\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.search.margin, 100);
        assert_eq!(config.search.n_windows, 9);
        assert_eq!(config.session.bootstrap, BootstrapPolicy::RequireSeed);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut config = Config::default();
        config.sanity.min_lane_width_m = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load("/nonexistent/lane.yaml").is_err());
    }
}
