//! Shared configuration types consumed across the Wally workspace.
//!
//! Settings are plain serde structures so a single JSON file can drive both dataset synthesis and
//! scene scanning. Every section uses `#[serde(default)]`, so partial files are accepted and
//! missing values fall back to the reference parameters.

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Discrete rotation set in whole degrees: `min, min + step, ..., <= max`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RotationRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

impl Default for RotationRange {
    fn default() -> Self {
        Self {
            min: -20,
            max: 20,
            step: 4,
        }
    }
}

/// Discrete scale set expressed as fractions of the background tile size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaleRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min: 0.90,
            max: 0.99,
            step: 0.01,
        }
    }
}

/// Parameters for building the labeled training corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisSettings {
    /// Square tile edge lengths, in pixels, used to cut each scene.
    pub tile_sizes: Vec<u32>,
    /// Rotations applied to cutouts before compositing.
    pub rotation: RotationRange,
    /// Cutout scale relative to the background tile.
    pub scale: ScaleRange,
    /// Optional seed for reproducible corpora. A random seed is drawn when unset.
    pub seed: Option<u64>,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            tile_sizes: vec![50, 100, 150],
            rotation: RotationRange::default(),
            scale: ScaleRange::default(),
            seed: None,
        }
    }
}

/// Sliding-window scan parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    /// Edge length of each square window in scene pixels.
    pub window_size: u32,
    /// Overlap between neighbouring windows; must be smaller than `window_size`.
    pub overlap: u32,
    /// Minimum "present" confidence for a window to be highlighted.
    pub threshold: f32,
    /// Score windows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            window_size: 75,
            overlap: 50,
            threshold: 0.999,
            parallel: true,
        }
    }
}

/// Location and input geometry of the trained classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierSettings {
    pub model_path: PathBuf,
    /// Square input edge expected by the network.
    pub input_size: u32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/wally.onnx"),
            input_size: 50,
        }
    }
}

/// Inclusive pixel rectangle `(x1, y1)..=(x2, y2)` covering the real target in a scene.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExclusionSettings {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

/// A source scene and the region that must be masked before tiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneEntry {
    pub path: PathBuf,
    pub exclusion: ExclusionSettings,
}

/// Source scenes and foreground cutouts used for synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogSettings {
    pub scenes: Vec<SceneEntry>,
    /// RGBA cutouts of the target.
    pub cutouts: Vec<PathBuf>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        let scene = |name: &str, x1, y1, x2, y2| SceneEntry {
            path: PathBuf::from(format!("assets/scene/{name}.jpg")),
            exclusion: ExclusionSettings { x1, y1, x2, y2 },
        };
        Self {
            scenes: vec![
                scene("waldo10", 1476, 274, 1513, 310),
                scene("waldo9", 1319, 1365, 1356, 1403),
                scene("waldo8", 1151, 286, 1196, 332),
                scene("waldo4", 1383, 459, 1429, 504),
            ],
            cutouts: ["waldo10", "waldo9", "waldo8", "waldo4"]
                .iter()
                .map(|name| PathBuf::from(format!("assets/head/{name}.png")))
                .collect(),
        }
    }
}

impl CatalogSettings {
    /// Return a copy with every relative path joined onto `base`.
    pub fn resolved(&self, base: &Path) -> Self {
        let resolve = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                base.join(path)
            }
        };
        Self {
            scenes: self
                .scenes
                .iter()
                .map(|entry| SceneEntry {
                    path: resolve(&entry.path),
                    exclusion: entry.exclusion,
                })
                .collect(),
            cutouts: self.cutouts.iter().map(resolve).collect(),
        }
    }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether timing logs are enabled.
    pub enabled: bool,
    /// Logging level for timing output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }
}

/// Persistent settings consumed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub synthesis: SynthesisSettings,
    pub scan: ScanSettings,
    pub classifier: ClassifierSettings,
    pub catalog: CatalogSettings,
    pub telemetry: TelemetrySettings,
}

impl AppSettings {
    /// Load settings from a JSON file.
    ///
    /// Relative catalog paths are resolved against the directory containing the file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let mut settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;

        if let Some(base) = path.parent() {
            settings.catalog = settings.catalog.resolved(base);
        }
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON, overwriting any existing file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

/// Returns the default settings location (`config/wally.json` under the working directory).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/wally.json"))
        .unwrap_or_else(|_| PathBuf::from("config/wally.json"))
}
