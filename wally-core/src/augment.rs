//! Random cutout compositing used to synthesize positive samples.
//!
//! A composite picks one cutout, one rotation and one scale uniformly from discrete sets, rotates
//! the cutout with an expanded canvas, resizes it relative to the background tile and overlays it
//! at a uniformly random offset that keeps it fully inside the tile.

use image::{
    Rgb, RgbImage, Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use rand::Rng;
use wally_utils::{RotationRange, ScaleRange};

use crate::assets::CutoutAsset;
use crate::error::{Result, WallyError};

/// The discrete rotation and scale choices drawn from during augmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentationRanges {
    rotations: Vec<i32>,
    scales: Vec<f32>,
}

impl AugmentationRanges {
    /// Build from explicit choice sets. Both must be non-empty and scales must be positive.
    pub fn new(rotations: Vec<i32>, scales: Vec<f32>) -> Result<Self> {
        if rotations.is_empty() {
            return Err(WallyError::geometry("rotation set is empty"));
        }
        if scales.is_empty() {
            return Err(WallyError::geometry("scale set is empty"));
        }
        if let Some(bad) = scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(WallyError::geometry(format!(
                "scale {bad} must be a positive fraction"
            )));
        }
        Ok(Self { rotations, scales })
    }

    /// Expand `(min, max, step)` specs into their discrete sets (both ends inclusive).
    pub fn from_settings(rotation: &RotationRange, scale: &ScaleRange) -> Result<Self> {
        Self::new(rotation_values(rotation)?, scale_values(scale)?)
    }

    pub fn rotations(&self) -> &[i32] {
        &self.rotations
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }
}

impl Default for AugmentationRanges {
    fn default() -> Self {
        Self {
            rotations: (-20..=20).step_by(4).collect(),
            scales: (90..100).map(|pct| pct as f32 / 100.0).collect(),
        }
    }
}

fn rotation_values(range: &RotationRange) -> Result<Vec<i32>> {
    if range.step <= 0 || range.max < range.min {
        return Err(WallyError::geometry(format!(
            "rotation range {}..={} step {} is empty",
            range.min, range.max, range.step
        )));
    }
    Ok((range.min..=range.max)
        .step_by(range.step as usize)
        .collect())
}

fn scale_values(range: &ScaleRange) -> Result<Vec<f32>> {
    let ScaleRange { min, max, step } = *range;
    if !(step > 0.0) || !(max >= min) {
        return Err(WallyError::geometry(format!(
            "scale range {min}..={max} step {step} is empty"
        )));
    }
    // Tolerance keeps `max` in the set despite float accumulation (0.90 + 9 * 0.01).
    let count = ((max - min) / step + 1e-4).floor() as usize + 1;
    Ok((0..count).map(|i| min + i as f32 * step).collect())
}

/// Composite a randomly transformed cutout onto `background`.
///
/// The scaled cutout measures `floor(scale * bg_w) x floor(scale * bg_h)`. The background is
/// never modified; a new raster is returned.
pub fn composite<R: Rng + ?Sized>(
    background: &RgbImage,
    cutouts: &[CutoutAsset],
    ranges: &AugmentationRanges,
    rng: &mut R,
) -> Result<RgbImage> {
    if cutouts.is_empty() {
        return Err(WallyError::EmptySource("cutouts"));
    }

    let cutout = &cutouts[rng.gen_range(0..cutouts.len())];
    let rotation = ranges.rotations[rng.gen_range(0..ranges.rotations.len())];
    let scale = ranges.scales[rng.gen_range(0..ranges.scales.len())];

    let (bg_w, bg_h) = background.dimensions();
    let rotated = rotate_expanded(cutout.image(), rotation);
    let target_w = (scale * bg_w as f32) as u32;
    let target_h = (scale * bg_h as f32) as u32;
    if target_w == 0 || target_h == 0 {
        return Err(WallyError::geometry(format!(
            "scale {scale} collapses the cutout on a {bg_w}x{bg_h} background"
        )));
    }
    if target_w > bg_w || target_h > bg_h {
        return Err(WallyError::OversizeAsset {
            asset: (target_w, target_h),
            background: (bg_w, bg_h),
        });
    }
    let scaled = imageops::resize(&rotated, target_w, target_h, FilterType::Triangle);

    let offset_x = rng.gen_range(0..=bg_w - target_w);
    let offset_y = rng.gen_range(0..=bg_h - target_h);

    let mut combined = background.clone();
    overlay_alpha(&mut combined, &scaled, offset_x, offset_y);
    Ok(combined)
}

/// Rotate counter-clockwise by `degrees`, growing the canvas so no corner is clipped.
pub fn rotate_expanded(image: &RgbaImage, degrees: i32) -> RgbaImage {
    if degrees % 360 == 0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let theta = (degrees as f32).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let expanded_w = (w as f32 * cos + h as f32 * sin).ceil().max(1.0) as u32;
    let expanded_h = (w as f32 * sin + h as f32 * cos).ceil().max(1.0) as u32;

    // Every side of the working canvas spans at least the diagonal, with the cutout centred.
    let diagonal = ((w as f32).hypot(h as f32)).ceil() as u32;
    let pad = (diagonal.saturating_sub(w.min(h)) + 1) / 2 + 1;
    let (canvas_w, canvas_h) = (w + 2 * pad, h + 2 * pad);
    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut canvas, image, pad as i64, pad as i64);

    // imageproc rotates clockwise for positive angles.
    let rotated = rotate_about_center(
        &canvas,
        -theta,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    );

    // One pixel of slack per side absorbs the half-pixel offset of the rotation pivot.
    let crop_w = (expanded_w + 2).min(canvas_w);
    let crop_h = (expanded_h + 2).min(canvas_h);
    imageops::crop_imm(
        &rotated,
        (canvas_w - crop_w) / 2,
        (canvas_h - crop_h) / 2,
        crop_w,
        crop_h,
    )
    .to_image()
}

/// Alpha-blend `foreground` onto `background` with its top-left corner at `(x, y)`.
///
/// Fully transparent pixels leave the background untouched, fully opaque ones replace it.
pub fn overlay_alpha(background: &mut RgbImage, foreground: &RgbaImage, x: u32, y: u32) {
    let (bg_w, bg_h) = background.dimensions();
    for (fx, fy, src) in foreground.enumerate_pixels() {
        let (dx, dy) = (x + fx, y + fy);
        if dx >= bg_w || dy >= bg_h {
            continue;
        }
        let alpha = src[3];
        if alpha == 0 {
            continue;
        }
        let dst = background.get_pixel_mut(dx, dy);
        if alpha == u8::MAX {
            *dst = Rgb([src[0], src[1], src[2]]);
            continue;
        }
        let a = alpha as f32 / 255.0;
        let inv = 1.0 - a;
        let blend = |fg: u8, bg: u8| (fg as f32 * a + bg as f32 * inv).round() as u8;
        *dst = Rgb([
            blend(src[0], dst[0]),
            blend(src[1], dst[1]),
            blend(src[2], dst[2]),
        ]);
    }
}
