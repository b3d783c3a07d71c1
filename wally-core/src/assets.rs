//! Source scenes and foreground cutouts.
//!
//! Both asset types are immutable once built. Masking and augmentation always work on private
//! copies, so one catalog can feed repeated or parallel synthesis runs.

use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use wally_utils::{ExclusionSettings, load_image, load_rgba};

use crate::error::{Result, WallyError};

/// Inclusive rectangle `(x1, y1)..=(x2, y2)` around the real target in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl ExclusionRect {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self> {
        if x2 <= x1 || y2 <= y1 {
            return Err(WallyError::geometry(format!(
                "exclusion rectangle ({x1}, {y1}, {x2}, {y2}) must satisfy x2 > x1 and y2 > y1"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }
}

impl TryFrom<ExclusionSettings> for ExclusionRect {
    type Error = WallyError;

    fn try_from(settings: ExclusionSettings) -> Result<Self> {
        ExclusionRect::new(settings.x1, settings.y1, settings.x2, settings.y2)
    }
}

/// A catalog scene with the region hiding the real target.
#[derive(Debug, Clone)]
pub struct SourceScene {
    image: RgbImage,
    exclusion: ExclusionRect,
}

impl SourceScene {
    /// Build a scene, checking that the exclusion rectangle lies within the image.
    pub fn new(image: RgbImage, exclusion: ExclusionRect) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(WallyError::geometry("scene image has zero size"));
        }
        if exclusion.x2 >= width || exclusion.y2 >= height {
            return Err(WallyError::geometry(format!(
                "exclusion rectangle ({}, {}, {}, {}) exceeds scene bounds {width}x{height}",
                exclusion.x1, exclusion.y1, exclusion.x2, exclusion.y2
            )));
        }
        Ok(Self { image, exclusion })
    }

    /// Load a scene from disk.
    pub fn open(path: &Path, exclusion: ExclusionRect) -> anyhow::Result<Self> {
        let image = load_image(path)?.to_rgb8();
        SourceScene::new(image, exclusion)
            .with_context(|| format!("invalid scene {}", path.display()))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn exclusion(&self) -> ExclusionRect {
        self.exclusion
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Private working copy with the exclusion rectangle blacked out.
    pub fn masked_copy(&self) -> RgbImage {
        let mut working = self.image.clone();
        let ExclusionRect { x1, y1, x2, y2 } = self.exclusion;
        let rect = Rect::at(x1 as i32, y1 as i32).of_size(x2 - x1 + 1, y2 - y1 + 1);
        draw_filled_rect_mut(&mut working, rect, Rgb([0, 0, 0]));
        working
    }
}

/// An isolated foreground icon with transparency.
#[derive(Debug, Clone)]
pub struct CutoutAsset {
    image: RgbaImage,
}

impl CutoutAsset {
    pub fn new(image: RgbaImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(WallyError::geometry("cutout image has zero size"));
        }
        Ok(Self { image })
    }

    /// Load a cutout from disk, keeping its alpha channel.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let image = load_rgba(path)?;
        CutoutAsset::new(image).with_context(|| format!("invalid cutout {}", path.display()))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl TryFrom<DynamicImage> for CutoutAsset {
    type Error = WallyError;

    fn try_from(image: DynamicImage) -> Result<Self> {
        CutoutAsset::new(image.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> SourceScene {
        let image = RgbImage::from_pixel(20, 10, Rgb([90, 120, 150]));
        SourceScene::new(image, ExclusionRect::new(2, 3, 5, 6).unwrap()).unwrap()
    }

    #[test]
    fn masking_is_inclusive_and_leaves_source_untouched() {
        let scene = scene();
        let masked = scene.masked_copy();

        for y in 0..10 {
            for x in 0..20 {
                let inside = (2..=5).contains(&x) && (3..=6).contains(&y);
                let expected = if inside {
                    Rgb([0, 0, 0])
                } else {
                    Rgb([90, 120, 150])
                };
                assert_eq!(*masked.get_pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
        assert!(scene.image().pixels().all(|p| *p == Rgb([90, 120, 150])));
    }

    #[test]
    fn exclusion_must_be_ordered_and_in_bounds() {
        assert!(ExclusionRect::new(5, 5, 5, 9).is_err());
        assert!(ExclusionRect::new(5, 9, 8, 2).is_err());

        let image = RgbImage::new(10, 10);
        let rect = ExclusionRect::new(2, 2, 10, 5).unwrap();
        assert!(matches!(
            SourceScene::new(image, rect),
            Err(WallyError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn empty_cutout_is_rejected() {
        assert!(CutoutAsset::new(RgbaImage::new(0, 4)).is_err());
        let cutout = CutoutAsset::try_from(DynamicImage::new_rgb8(3, 2)).unwrap();
        assert_eq!(cutout.image().dimensions(), (3, 2));
        assert_eq!(cutout.image().get_pixel(0, 0)[3], 255);
    }
}
