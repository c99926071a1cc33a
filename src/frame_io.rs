// src/frame_io.rs
//
// Reads a sequence of rectified mask images from disk and writes per-frame
// results: one JSON line per frame and, optionally, the lane-region overlay.

use crate::mask::BinaryMask;
use crate::pipeline::{FrameDecision, PublishedFrame};
use crate::render;
use crate::types::IoConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

const MASK_EXTENSIONS: [&str; 6] = ["png", "pgm", "pbm", "bmp", "jpg", "jpeg"];

pub struct MaskSource {
    config: IoConfig,
}

impl MaskSource {
    pub fn new(config: IoConfig) -> Self {
        Self { config }
    }

    /// Mask images under the input directory, in file-name order.
    pub fn find_mask_files(&self) -> Result<Vec<PathBuf>> {
        let mut masks: Vec<PathBuf> = WalkDir::new(&self.config.input_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| has_mask_extension(p))
            .collect();
        masks.sort();

        info!(
            "Found {} mask frames in {}",
            masks.len(),
            self.config.input_dir
        );
        Ok(masks)
    }
}

fn has_mask_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MASK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an image file into a mask; any non-zero luma is "on".
pub fn load_mask(path: &Path) -> Result<BinaryMask> {
    let luma = image::open(path)
        .with_context(|| format!("failed to decode mask {}", path.display()))?
        .to_luma8();
    let (width, height) = luma.dimensions();
    let mask = BinaryMask::from_raw(width as usize, height as usize, luma.into_raw())?;
    Ok(mask)
}

#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    pub frame: u64,
    pub file: &'a str,
    pub decision: Option<FrameDecision>,
    pub source_frame: Option<u64>,
    pub left_radius_m: Option<f64>,
    pub right_radius_m: Option<f64>,
    pub offset_m: Option<f64>,
    pub mean_width_m: Option<f64>,
    pub curvature_text: Option<String>,
    pub offset_text: Option<String>,
}

impl<'a> FrameRecord<'a> {
    pub fn published(file: &'a str, frame: &PublishedFrame) -> Self {
        let result = &frame.result;
        Self {
            frame: frame.frame_index,
            file,
            decision: Some(frame.decision),
            source_frame: Some(result.source_frame),
            left_radius_m: Some(result.curvature.left_radius_m),
            right_radius_m: Some(result.curvature.right_radius_m),
            offset_m: Some(result.offset_m),
            // Fallback records carry history only
            mean_width_m: frame
                .sanity
                .filter(|_| !frame.decision.is_fallback())
                .map(|s| s.mean_width_m)
                .filter(|w| w.is_finite()),
            curvature_text: Some(result.curvature_text()),
            offset_text: Some(result.offset_text()),
        }
    }

    /// A frame with nothing to publish.
    pub fn unavailable(file: &'a str, frame: u64) -> Self {
        Self {
            frame,
            file,
            decision: None,
            source_frame: None,
            left_radius_m: None,
            right_radius_m: None,
            offset_m: None,
            mean_width_m: None,
            curvature_text: None,
            offset_text: None,
        }
    }
}

pub struct OutputWriter {
    output_dir: PathBuf,
    jsonl: Option<BufWriter<File>>,
    write_overlays: bool,
}

impl OutputWriter {
    pub fn new(config: &IoConfig, session_name: &str) -> Result<Self> {
        let output_dir = PathBuf::from(&config.output_dir);
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        let jsonl = if config.write_jsonl {
            let path = output_dir.join(format!("{}_lanes.jsonl", session_name));
            info!("💾 Frame results will be written to: {}", path.display());
            Some(BufWriter::new(File::create(&path).with_context(|| {
                format!("failed to create {}", path.display())
            })?))
        } else {
            None
        };

        Ok(Self {
            output_dir,
            jsonl,
            write_overlays: config.write_overlays,
        })
    }

    pub fn write_record(&mut self, record: &FrameRecord) -> Result<()> {
        if let Some(out) = self.jsonl.as_mut() {
            serde_json::to_writer(&mut *out, record)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Save the lane-region overlay as `<input stem>_lanes.png`.
    pub fn write_overlay(
        &self,
        source: &Path,
        mask: &BinaryMask,
        frame: &PublishedFrame,
    ) -> Result<Option<PathBuf>> {
        if !self.write_overlays {
            return Ok(None);
        }
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("frame_{:06}", frame.frame_index));
        let path = self.output_dir.join(format!("{}_lanes.png", stem));
        render::overlay(mask, frame)
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(Some(path))
    }

    pub fn finish(mut self) -> Result<()> {
        if let Some(out) = self.jsonl.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::LaneProcessor;
    use crate::types::Config;
    use image::{GrayImage, Luma};

    fn io_config(input: &Path, output: &Path) -> IoConfig {
        IoConfig {
            input_dir: input.to_string_lossy().to_string(),
            output_dir: output.to_string_lossy().to_string(),
            write_overlays: true,
            write_jsonl: true,
        }
    }

    #[test]
    fn test_find_mask_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_002.png", "frame_001.PNG", "notes.txt", "frame_003.pgm"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let source = MaskSource::new(io_config(dir.path(), dir.path()));
        let files = source.find_mask_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["frame_001.PNG", "frame_002.png", "frame_003.pgm"]);
    }

    #[test]
    fn test_load_mask_thresholds_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let img = GrayImage::from_fn(4, 3, |x, _| if x == 1 { Luma([1]) } else { Luma([0]) });
        img.save(&path).unwrap();

        let mask = load_mask(&path).unwrap();
        assert_eq!((mask.width(), mask.height()), (4, 3));
        assert_eq!(mask.count_on(), 3);
        assert!(mask.is_on(1, 2));
    }

    #[test]
    fn test_writes_jsonl_and_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let config = io_config(dir.path(), dir.path());
        let mut writer = OutputWriter::new(&config, "session").unwrap();

        let mask = BinaryMask::from_fn(1280, 720, |x, _| {
            (295..=305).contains(&x) || (895..=905).contains(&x)
        });
        let mut processor = LaneProcessor::new(Config::default());
        let frame = processor.process_frame(&mask).unwrap();

        writer
            .write_record(&FrameRecord::published("a.png", &frame))
            .unwrap();
        writer
            .write_record(&FrameRecord::unavailable("b.png", 1))
            .unwrap();
        let overlay = writer
            .write_overlay(Path::new("masks/clip_0007.png"), &mask, &frame)
            .unwrap()
            .unwrap();
        writer.finish().unwrap();

        assert_eq!(overlay, dir.path().join("clip_0007_lanes.png"));
        assert!(overlay.exists());
        let text = std::fs::read_to_string(dir.path().join("session_lanes.jsonl")).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["decision"], "accepted");
        assert_eq!(
            lines[0]["offset_text"],
            "Horizontal car offset: 0.23 meters"
        );
        assert!(lines[1]["decision"].is_null());
    }

    #[test]
    fn test_fallback_record_omits_candidate_width() {
        let mut processor = LaneProcessor::new(Config::default());
        let good = BinaryMask::from_fn(1280, 720, |x, _| {
            (295..=305).contains(&x) || (895..=905).contains(&x)
        });
        // 865 px apart, about 5 m
        let wide = BinaryMask::from_fn(1280, 720, |x, _| {
            (195..=205).contains(&x) || (1060..=1070).contains(&x)
        });
        let accepted = processor.process_frame(&good).unwrap();
        let rejected = processor.process_frame(&wide).unwrap();
        assert!(rejected.decision.is_fallback());
        assert!(rejected.sanity.is_some());

        let record = FrameRecord::published("b.png", &rejected);
        assert_eq!(record.mean_width_m, None);
        assert_eq!(record.offset_m, Some(accepted.result.offset_m));
        assert_eq!(record.source_frame, Some(0));

        let record = FrameRecord::published("a.png", &accepted);
        assert!((record.mean_width_m.unwrap() - 600.0 * 3.7 / 640.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlays_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = io_config(dir.path(), dir.path());
        config.write_overlays = false;
        let writer = OutputWriter::new(&config, "session").unwrap();

        let mask = BinaryMask::from_fn(1280, 720, |x, _| {
            (295..=305).contains(&x) || (895..=905).contains(&x)
        });
        let frame = LaneProcessor::new(Config::default())
            .process_frame(&mask)
            .unwrap();
        let written = writer
            .write_overlay(Path::new("a.png"), &mask, &frame)
            .unwrap();
        assert!(written.is_none());
    }
}
