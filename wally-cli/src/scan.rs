//! `wally scan`: highlight likely matches in one or more scenes.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{Level, info, warn};
use wally_core::{Classifier, OnnxClassifier, ScanConfig, scan};
use wally_utils::{AppSettings, load_image, normalize_path, timing_guard};

use crate::input::{collect_images, highlighted_path};
use crate::types::{SceneDetections, WindowRecord};

/// Scan every image under `input` and write highlighted copies into `output_dir`.
pub fn run(
    settings: &AppSettings,
    input: &Path,
    output_dir: &Path,
) -> Result<Vec<SceneDetections>> {
    let input_path = normalize_path(input)?;
    let model_path = normalize_path(&settings.classifier.model_path)?;
    let config = ScanConfig::from(settings.scan);
    config.validate().context("invalid scan settings")?;

    info!(
        "Loading classifier from {} at {}x{}",
        model_path.display(),
        settings.classifier.input_size,
        settings.classifier.input_size
    );
    let classifier = OnnxClassifier::load(&model_path, settings.classifier.input_size)?;

    let images = collect_images(&input_path)?;
    if images.is_empty() {
        anyhow::bail!(
            "no images found at {} (supported extensions: jpg, jpeg, png, bmp, webp)",
            input_path.display()
        );
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    info!("Scanning {} scene(s)...", images.len());
    let mut results = Vec::with_capacity(images.len());
    for image_path in images {
        match scan_one(&image_path, output_dir, &config, &classifier) {
            Ok(record) => {
                info!(
                    "{} -> {} window(s) accepted",
                    image_path.display(),
                    record.windows.len()
                );
                results.push(record);
            }
            Err(err) => warn!("Failed to scan {}: {err:#}", image_path.display()),
        }
    }

    if results.is_empty() {
        anyhow::bail!("all scans failed; cannot produce output");
    }
    Ok(results)
}

pub(crate) fn scan_one(
    image_path: &Path,
    output_dir: &Path,
    config: &ScanConfig,
    classifier: &dyn Classifier,
) -> Result<SceneDetections> {
    let _guard = timing_guard(
        format!("wally_cli::scan {}", image_path.display()),
        Level::Debug,
    );
    let scene = load_image(image_path)?.to_rgb8();
    let visualization = scan(&scene, config, classifier)
        .with_context(|| format!("scan of {} failed", image_path.display()))?;

    let out_path = highlighted_path(output_dir, image_path);
    visualization
        .image
        .save(&out_path)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    Ok(SceneDetections {
        image: image_path.display().to_string(),
        highlighted: out_path.display().to_string(),
        windows: visualization
            .detections
            .iter()
            .map(WindowRecord::from)
            .collect(),
    })
}
