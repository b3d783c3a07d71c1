//! Serializable summaries printed or written by the CLI.

use serde::Serialize;
use wally_core::DetectionWindow;

/// Outcome of a `synthesize` run.
#[derive(Debug, Serialize)]
pub struct SynthesisSummary {
    pub output: String,
    pub seed: u64,
    pub scenes: usize,
    pub skipped_scenes: Vec<String>,
    pub tile_sizes: Vec<u32>,
    pub positives: usize,
    pub negatives: usize,
}

/// A serializable accepted window.
#[derive(Debug, Serialize)]
pub struct WindowRecord {
    pub score: f32,
    /// `[x1, y1, x2, y2]`; the far corner may lie beyond the scene edge.
    pub rect: [u32; 4],
}

/// Scan result for a single scene.
#[derive(Debug, Serialize)]
pub struct SceneDetections {
    pub image: String,
    pub highlighted: String,
    pub windows: Vec<WindowRecord>,
}

impl From<&DetectionWindow> for WindowRecord {
    fn from(window: &DetectionWindow) -> Self {
        let rect = window.rect;
        Self {
            score: window.score,
            rect: [rect.x1, rect.y1, rect.x2, rect.y2],
        }
    }
}
