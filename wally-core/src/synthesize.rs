//! Dataset synthesis: cut every scene into grid tiles and pair each negative with a composite.

use image::imageops;
use log::{Level, debug, info};
use rand::Rng;
use wally_utils::timing_guard;

use crate::assets::{CutoutAsset, SourceScene};
use crate::augment::{AugmentationRanges, composite};
use crate::corpus::{Label, LabeledCorpus, Tile, TileId};
use crate::error::{Result, WallyError};
use crate::geometry::grid_tiles;

/// Build a shuffled corpus with one negative and one positive sample per grid tile.
///
/// Any geometry or augmentation failure aborts the whole run.
pub fn synthesize<R: Rng + ?Sized>(
    scenes: &[SourceScene],
    cutouts: &[CutoutAsset],
    tile_sizes: &[u32],
    ranges: &AugmentationRanges,
    rng: &mut R,
) -> Result<LabeledCorpus> {
    let _guard = timing_guard("wally_core::synthesize", Level::Info);
    if scenes.is_empty() {
        return Err(WallyError::EmptySource("scenes"));
    }

    let mut corpus = LabeledCorpus::default();
    for (index, scene) in scenes.iter().enumerate() {
        corpus.extend(synthesize_scene(index, scene, cutouts, tile_sizes, ranges, rng)?);
    }
    corpus.shuffle(rng);

    info!(
        "Synthesized {} tiles ({} positive) from {} scene(s)",
        corpus.len(),
        corpus.count(Label::Positive),
        scenes.len()
    );
    Ok(corpus)
}

/// Tile one scene in insertion order (negative then positive per tile), without shuffling.
///
/// `tile_sizes` is treated as a set: sizes run in ascending order and repeats are ignored, so
/// every tile identity appears once.
pub fn synthesize_scene<R: Rng + ?Sized>(
    scene_index: usize,
    scene: &SourceScene,
    cutouts: &[CutoutAsset],
    tile_sizes: &[u32],
    ranges: &AugmentationRanges,
    rng: &mut R,
) -> Result<LabeledCorpus> {
    let _guard = timing_guard("wally_core::synthesize_scene", Level::Debug);
    if cutouts.is_empty() {
        return Err(WallyError::EmptySource("cutouts"));
    }

    let working = scene.masked_copy();
    let (width, height) = working.dimensions();
    let mut sizes = tile_sizes.to_vec();
    sizes.sort_unstable();
    sizes.dedup();

    let mut tiles = Vec::new();
    for size in sizes {
        let grid = grid_tiles(width, height, size)?;
        debug!(
            "Scene {scene_index}: {} tiles of {size}px from {width}x{height}",
            grid.len()
        );
        for cell in grid {
            let negative = imageops::crop_imm(&working, cell.x, cell.y, size, size).to_image();
            let positive = composite(&negative, cutouts, ranges, rng)?;
            let id = TileId::new(scene_index, &cell);
            tiles.push(Tile {
                id,
                rect: cell,
                image: negative,
                label: Label::Negative,
            });
            tiles.push(Tile {
                id,
                rect: cell,
                image: positive,
                label: Label::Positive,
            });
        }
    }
    Ok(LabeledCorpus::new(tiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ExclusionRect;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use rand::{SeedableRng, rngs::StdRng};

    fn scene(width: u32, height: u32) -> SourceScene {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 200) as u8 + 30, (y % 200) as u8 + 30, 77])
        });
        SourceScene::new(image, ExclusionRect::new(100, 100, 140, 140).unwrap()).unwrap()
    }

    fn red_square() -> Vec<CutoutAsset> {
        vec![CutoutAsset::new(RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255]))).unwrap()]
    }

    #[test]
    fn scene_yields_negative_and_positive_per_tile() {
        let ranges = AugmentationRanges::new(vec![0], vec![0.5]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let corpus =
            synthesize_scene(3, &scene(250, 160), &red_square(), &[50, 100], &ranges, &mut rng)
                .unwrap();

        // 5x3 tiles of 50px plus 2x1 of 100px.
        assert_eq!(corpus.len(), 2 * (15 + 2));
        let tiles = corpus.tiles();
        assert_eq!(tiles[0].label, Label::Negative);
        assert_eq!(tiles[1].label, Label::Positive);
        assert_eq!(tiles[0].id, tiles[1].id);
        assert_eq!(tiles[0].id.scene, 3);
        assert!(tiles.iter().all(|t| t.image.width() == t.id.tile_size));
    }

    #[test]
    fn repeated_tile_sizes_yield_unique_tiles() {
        let ranges = AugmentationRanges::new(vec![0], vec![0.5]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let scene = SourceScene::new(
            RgbImage::from_pixel(200, 100, Rgb([40, 90, 140])),
            ExclusionRect::new(10, 10, 20, 20).unwrap(),
        )
        .unwrap();
        let corpus = synthesize(&[scene], &red_square(), &[50, 50], &ranges, &mut rng).unwrap();
        assert_eq!(corpus.count(Label::Positive), 8);
        assert_eq!(corpus.count(Label::Negative), 8);

        let dir = tempfile::tempdir().unwrap();
        corpus.save_to_dir(dir.path()).unwrap();
        for label in [Label::Positive, Label::Negative] {
            let on_disk = std::fs::read_dir(dir.path().join(label.dir_name()))
                .unwrap()
                .count();
            assert_eq!(on_disk, corpus.count(label));
        }
    }

    #[test]
    fn empty_sources_fail() {
        let ranges = AugmentationRanges::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            synthesize(&[], &red_square(), &[50], &ranges, &mut rng),
            Err(WallyError::EmptySource("scenes"))
        ));
        assert!(matches!(
            synthesize(&[scene(200, 200)], &[], &[50], &ranges, &mut rng),
            Err(WallyError::EmptySource("cutouts"))
        ));
    }

    #[test]
    fn invalid_tile_size_aborts_the_run() {
        let ranges = AugmentationRanges::default();
        let mut rng = StdRng::seed_from_u64(0);
        let result = synthesize(&[scene(200, 200)], &red_square(), &[0], &ranges, &mut rng);
        assert!(matches!(result, Err(WallyError::InvalidGeometry(_))));
    }

    #[test]
    fn oversize_scale_propagates() {
        let ranges = AugmentationRanges::new(vec![0], vec![1.2]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let result = synthesize(&[scene(200, 200)], &red_square(), &[100], &ranges, &mut rng);
        assert!(matches!(result, Err(WallyError::OversizeAsset { .. })));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let ranges = AugmentationRanges::default();
        let scenes = [scene(300, 200)];
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            synthesize(&scenes, &red_square(), &[100], &ranges, &mut rng).unwrap()
        };
        let a = run(11);
        let b = run(11);
        let ids = |c: &LabeledCorpus| c.tiles().iter().map(|t| (t.id, t.label)).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        for (x, y) in a.tiles().iter().zip(b.tiles()) {
            assert_eq!(x.image.as_raw(), y.image.as_raw());
        }
    }
}
