//! Core Wally finder pipeline.
//!
//! This crate cuts source scenes into labeled training tiles (compositing randomly transformed
//! cutouts for the positive class), packages them for an external trainer, and scans new scenes
//! with a pluggable [`Classifier`] to highlight likely matches.

/// Source scenes and foreground cutouts.
pub mod assets;
/// Random cutout compositing.
pub mod augment;
/// Trait for tile scorers and the ONNX implementation.
pub mod classifier;
/// Labeled tiles, persistence and training tensors.
pub mod corpus;
/// Error taxonomy shared by every pipeline stage.
pub mod error;
/// Grid tiles and sliding windows.
pub mod geometry;
/// Reference network topology.
pub mod layers;
/// Sliding-window detection.
pub mod scan;
/// Training-set synthesis.
pub mod synthesize;

pub use assets::{CutoutAsset, ExclusionRect, SourceScene};
pub use augment::{AugmentationRanges, composite};
pub use classifier::{Classifier, OnnxClassifier};
pub use corpus::{Label, LabeledCorpus, Tile, TileId, TrainingSet};
pub use error::{Result, WallyError};
pub use geometry::{GridTile, WindowRect, grid_tiles, sliding_windows};
pub use layers::{LayerSpec, NetworkSpec, reference_network};
pub use scan::{DetectionWindow, ScanConfig, Visualization, scan};
pub use synthesize::{synthesize, synthesize_scene};
