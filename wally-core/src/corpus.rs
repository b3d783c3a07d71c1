//! Labeled tile corpus produced by synthesis and its conversions for training.

use std::{fmt, fs, path::Path};

use anyhow::{Context, Result};
use image::{RgbImage, imageops::FilterType};
use log::info;
use ndarray::{Array2, Array4, Axis, s};
use rand::{Rng, seq::SliceRandom};
use serde::Serialize;
use wally_utils::{resize_rgb, rgb_to_bgr_hwc};

use crate::geometry::GridTile;

/// Directory holding positive samples under a corpus root.
pub const POSITIVE_DIR: &str = "wally";
/// Directory holding negative samples under a corpus root.
pub const NEGATIVE_DIR: &str = "not";

/// Whether a tile contains a composited target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    /// Two-class one-hot target: `[absent, present]`.
    pub fn one_hot(self) -> [f32; 2] {
        match self {
            Label::Positive => [0.0, 1.0],
            Label::Negative => [1.0, 0.0],
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Label::Positive => POSITIVE_DIR,
            Label::Negative => NEGATIVE_DIR,
        }
    }
}

/// Provenance of a tile: source scene index, tile size and grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileId {
    pub scene: usize,
    pub tile_size: u32,
    pub column: u32,
    pub row: u32,
}

impl TileId {
    pub fn new(scene: usize, tile: &GridTile) -> Self {
        Self {
            scene,
            tile_size: tile.size,
            column: tile.column,
            row: tile.row,
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.scene, self.tile_size, self.column, self.row
        )
    }
}

/// One square training sample.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    /// Location of the tile in its source scene.
    pub rect: GridTile,
    pub image: RgbImage,
    pub label: Label,
}

/// Unordered collection of labeled tiles.
#[derive(Debug, Clone, Default)]
pub struct LabeledCorpus {
    tiles: Vec<Tile>,
}

impl LabeledCorpus {
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn count(&self, label: Label) -> usize {
        self.tiles.iter().filter(|tile| tile.label == label).count()
    }

    pub fn extend(&mut self, other: LabeledCorpus) {
        self.tiles.extend(other.tiles);
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tiles.shuffle(rng);
    }

    /// Write every tile as PNG into `wally/` or `not/` under `root`.
    ///
    /// Both label directories are recreated, so stale samples from an earlier run never mix in.
    pub fn save_to_dir(&self, root: &Path) -> Result<()> {
        for label in [Label::Positive, Label::Negative] {
            let dir = root.join(label.dir_name());
            if dir.exists() {
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("failed to clear {}", dir.display()))?;
            }
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        for tile in &self.tiles {
            let path = root
                .join(tile.label.dir_name())
                .join(format!("{}.png", tile.id));
            tile.image
                .save(&path)
                .with_context(|| format!("failed to write tile {}", path.display()))?;
        }
        info!(
            "Wrote {} positive and {} negative tiles to {}",
            self.count(Label::Positive),
            self.count(Label::Negative),
            root.display()
        );
        Ok(())
    }
}

/// Tensor view of a corpus: NHWC BGR images and one-hot labels.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// Shape `[n, input_size, input_size, 3]`, raw `0..=255` intensities.
    pub images: Array4<f32>,
    /// Shape `[n, 2]`.
    pub labels: Array2<f32>,
}

impl TrainingSet {
    /// Resize every tile to `input_size` and stack the results in corpus order.
    pub fn from_corpus(corpus: &LabeledCorpus, input_size: u32) -> Self {
        let side = input_size as usize;
        let mut images = Array4::<f32>::zeros((corpus.len(), side, side, 3));
        let mut labels = Array2::<f32>::zeros((corpus.len(), 2));

        for (index, tile) in corpus.tiles().iter().enumerate() {
            let resized = resize_rgb(&tile.image, input_size, input_size, FilterType::CatmullRom);
            images
                .index_axis_mut(Axis(0), index)
                .assign(&rgb_to_bgr_hwc(&resized));
            let [absent, present] = tile.label.one_hot();
            labels[(index, 0)] = absent;
            labels[(index, 1)] = present;
        }
        Self { images, labels }
    }

    pub fn len(&self) -> usize {
        self.labels.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hold out the last `validation_len` samples. Returns `(train, validation)`.
    pub fn split(&self, validation_len: usize) -> (TrainingSet, TrainingSet) {
        let cut = self.len().saturating_sub(validation_len);
        let train = TrainingSet {
            images: self.images.slice(s![..cut, .., .., ..]).to_owned(),
            labels: self.labels.slice(s![..cut, ..]).to_owned(),
        };
        let validation = TrainingSet {
            images: self.images.slice(s![cut.., .., .., ..]).to_owned(),
            labels: self.labels.slice(s![cut.., ..]).to_owned(),
        };
        (train, validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::{SeedableRng, rngs::StdRng};
    use tempfile::TempDir;

    fn tile(scene: usize, column: u32, label: Label, color: [u8; 3]) -> Tile {
        let rect = GridTile {
            column,
            row: 0,
            x: column * 10,
            y: 0,
            size: 10,
        };
        Tile {
            id: TileId::new(scene, &rect),
            rect,
            image: RgbImage::from_pixel(10, 10, Rgb(color)),
            label,
        }
    }

    fn sample_corpus() -> LabeledCorpus {
        LabeledCorpus::new(vec![
            tile(0, 0, Label::Negative, [10, 20, 30]),
            tile(0, 0, Label::Positive, [200, 0, 0]),
            tile(1, 3, Label::Negative, [0, 0, 0]),
        ])
    }

    #[test]
    fn tile_id_formats_as_file_stem() {
        let id = TileId {
            scene: 2,
            tile_size: 150,
            column: 4,
            row: 7,
        };
        assert_eq!(id.to_string(), "2-150-4-7");
    }

    #[test]
    fn save_writes_label_directories_and_clears_stale_files() {
        let dir = TempDir::new().expect("tempdir");
        let stale = dir.path().join(NEGATIVE_DIR).join("stale.png");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();

        sample_corpus().save_to_dir(dir.path()).expect("save");

        assert!(!stale.exists());
        assert!(dir.path().join(POSITIVE_DIR).join("0-10-0-0.png").exists());
        assert!(dir.path().join(NEGATIVE_DIR).join("0-10-0-0.png").exists());
        assert!(dir.path().join(NEGATIVE_DIR).join("1-10-3-0.png").exists());
        let written = image::open(dir.path().join(POSITIVE_DIR).join("0-10-0-0.png"))
            .unwrap()
            .to_rgb8();
        assert_eq!(*written.get_pixel(5, 5), Rgb([200, 0, 0]));
    }

    #[test]
    fn training_set_is_bgr_with_one_hot_labels() {
        let set = TrainingSet::from_corpus(&sample_corpus(), 4);
        assert_eq!(set.images.shape(), &[3, 4, 4, 3]);
        assert_eq!(set.labels.shape(), &[3, 2]);

        assert_eq!(set.images[(0, 1, 1, 0)], 30.0);
        assert_eq!(set.images[(0, 1, 1, 2)], 10.0);
        assert_eq!(set.labels.row(0).to_vec(), vec![1.0, 0.0]);
        assert_eq!(set.labels.row(1).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn split_holds_out_the_tail() {
        let set = TrainingSet::from_corpus(&sample_corpus(), 2);
        let (train, validation) = set.split(1);
        assert_eq!(train.len(), 2);
        assert_eq!(validation.len(), 1);
        assert_eq!(validation.labels.row(0).to_vec(), vec![1.0, 0.0]);

        let (train, validation) = set.split(10);
        assert!(train.is_empty());
        assert_eq!(validation.len(), 3);
    }

    #[test]
    fn shuffle_keeps_every_tile() {
        let mut corpus = sample_corpus();
        corpus.shuffle(&mut StdRng::seed_from_u64(9));
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.count(Label::Positive), 1);
        assert_eq!(corpus.count(Label::Negative), 2);
    }
}
