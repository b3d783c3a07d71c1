//! Sliding-window detection over a full scene.
//!
//! Every window is cropped from the scene (pixels beyond the right or bottom edge read as black),
//! resized to the classifier input and scored. Windows at or above the threshold are pasted in
//! original color onto a greyscale copy of the scene, in row-major order, so later windows
//! overwrite earlier ones where they overlap.

use image::{RgbImage, imageops, imageops::FilterType};
use log::{Level, debug};
use rayon::prelude::*;
use serde::Serialize;
use wally_utils::{ScanSettings, greyscale_rgb, resize_rgb, timing_guard};

use crate::classifier::Classifier;
use crate::error::{Result, WallyError};
use crate::geometry::{WindowRect, sliding_windows};

/// Window layout and acceptance threshold for one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    pub window_size: u32,
    pub overlap: u32,
    pub threshold: f32,
    /// Score windows on the rayon pool. Output is identical either way.
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanSettings::default().into()
    }
}

impl From<ScanSettings> for ScanConfig {
    fn from(settings: ScanSettings) -> Self {
        Self {
            window_size: settings.window_size,
            overlap: settings.overlap,
            threshold: settings.threshold,
            parallel: settings.parallel,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(WallyError::geometry(format!(
                "threshold {} must lie in [0, 1]",
                self.threshold
            )));
        }
        if self.window_size == 0 {
            return Err(WallyError::geometry("window size must be greater than zero"));
        }
        if self.overlap >= self.window_size {
            return Err(WallyError::geometry(format!(
                "overlap {} must be smaller than window size {}",
                self.overlap, self.window_size
            )));
        }
        Ok(())
    }
}

/// An accepted window and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionWindow {
    pub rect: WindowRect,
    pub score: f32,
}

/// Greyscale scene with accepted windows restored to color.
#[derive(Debug, Clone)]
pub struct Visualization {
    pub image: RgbImage,
    /// Accepted windows in paste order.
    pub detections: Vec<DetectionWindow>,
}

/// Scan `scene` and build its visualization.
///
/// The first classifier error aborts the scan.
pub fn scan<C: Classifier + ?Sized>(
    scene: &RgbImage,
    config: &ScanConfig,
    classifier: &C,
) -> Result<Visualization> {
    let _guard = timing_guard("wally_core::scan", Level::Info);
    config.validate()?;
    let input_size = classifier.input_size();
    if input_size == 0 {
        return Err(WallyError::geometry("classifier input size must be positive"));
    }

    let (width, height) = scene.dimensions();
    let windows = sliding_windows(width, height, config.window_size, config.overlap)?;
    debug!(
        "Scanning {width}x{height} with {} windows of {}px",
        windows.len(),
        config.window_size
    );

    let score = |rect: &WindowRect| -> Result<f32> {
        let crop = padded_crop(scene, rect);
        let input = resize_rgb(&crop, input_size, input_size, FilterType::CatmullRom);
        classifier.predict(&input).map_err(WallyError::classifier)
    };
    let scores: Vec<f32> = if config.parallel {
        windows.par_iter().map(score).collect::<Result<_>>()?
    } else {
        windows.iter().map(score).collect::<Result<_>>()?
    };

    let mut image = greyscale_rgb(scene);
    let mut detections = Vec::new();
    for (rect, score) in windows.into_iter().zip(scores) {
        if score < config.threshold {
            continue;
        }
        if let Some((x, y, w, h)) = rect.clipped(width, height) {
            let original = imageops::crop_imm(scene, x, y, w, h).to_image();
            imageops::replace(&mut image, &original, x as i64, y as i64);
        }
        detections.push(DetectionWindow { rect, score });
    }

    debug!("{} window(s) accepted", detections.len());
    Ok(Visualization { image, detections })
}

/// Crop a full `rect`-sized window; whatever lies outside the scene stays black.
fn padded_crop(scene: &RgbImage, rect: &WindowRect) -> RgbImage {
    let mut window = RgbImage::new(rect.width(), rect.height());
    if let Some((x, y, w, h)) = rect.clipped(scene.width(), scene.height()) {
        let inside = imageops::crop_imm(scene, x, y, w, h).to_image();
        imageops::replace(&mut window, &inside, 0, 0);
    }
    window
}
