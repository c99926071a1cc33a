// src/main.rs

use anyhow::Result;
use lane_geometry::frame_io::{load_mask, FrameRecord, MaskSource, OutputWriter};
use lane_geometry::{Config, FrameDecision, LaneError, LaneProcessor};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.yaml";

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = if Path::new(&config_path).exists() {
        Some(Config::load(&config_path)?)
    } else {
        None
    };
    let logging_level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|| Config::default().logging.level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging_level)),
        )
        .init();

    info!("🚗 Lane Geometry Starting");
    let config = match config {
        Some(config) => {
            info!("✓ Configuration loaded from {}", config_path);
            config
        }
        None => {
            warn!("{} not found, using default configuration", config_path);
            Config::default()
        }
    };

    let source = MaskSource::new(config.io.clone());
    let mask_files = source.find_mask_files()?;
    if mask_files.is_empty() {
        error!("No mask frames found in {}", config.io.input_dir);
        return Ok(());
    }

    let session_name = Path::new(&config.io.input_dir)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "session".to_string());
    let mut writer = OutputWriter::new(&config.io, &session_name)?;
    let mut processor = LaneProcessor::new(config);

    for (idx, path) in mask_files.iter().enumerate() {
        let file = path.to_string_lossy();
        let mask = match load_mask(path) {
            Ok(mask) => mask,
            Err(e) => {
                error!(
                    "Skipping input {} ({}) before frame {}: {:#}",
                    idx,
                    file,
                    processor.frames_processed(),
                    e
                );
                continue;
            }
        };

        match processor.process_frame(&mask) {
            Ok(frame) => {
                if frame.decision != FrameDecision::Accepted {
                    debug!(
                        "Frame {} ({}) → {}",
                        frame.frame_index,
                        file,
                        frame.decision.as_str()
                    );
                }
                if idx % 50 == 0 {
                    info!(
                        "Frame {}/{}: {} | {}",
                        idx + 1,
                        mask_files.len(),
                        frame.result.curvature_text(),
                        frame.result.offset_text()
                    );
                }
                writer.write_record(&FrameRecord::published(&file, &frame))?;
                writer.write_overlay(path, &mask, &frame)?;
            }
            Err(LaneError::EmptyHistory) => {
                writer.write_record(&FrameRecord::unavailable(
                    &file,
                    processor.frames_processed() - 1,
                ))?;
            }
            Err(e) => {
                error!(
                    "Frame {} ({}) failed: {}",
                    processor.frames_processed() - 1,
                    file,
                    e
                );
            }
        }
    }

    writer.finish()?;
    let summary = processor.finish();
    info!("📊 Session summary: {}", serde_json::to_string(&summary)?);

    Ok(())
}
