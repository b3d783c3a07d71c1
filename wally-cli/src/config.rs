//! Configuration loading and CLI override logic.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::info;
use wally_utils::{
    AppSettings, ExclusionSettings, SceneEntry, config::default_settings_path, normalize_path,
};

use crate::args::{Cli, ScanArgs, SynthesizeArgs};

/// Load application settings from a file or use defaults.
pub fn load_settings(config_path: Option<&PathBuf>) -> Result<AppSettings> {
    if let Some(path) = config_path {
        let resolved = normalize_path(path)?;
        let settings = AppSettings::load_from_path(&resolved)?;
        info!("Loaded settings from {}", resolved.display());
        Ok(settings)
    } else {
        let default_path = default_settings_path();
        if default_path.exists() {
            let settings = AppSettings::load_from_path(&default_path).with_context(|| {
                format!(
                    "failed to load default settings from {}",
                    default_path.display()
                )
            })?;
            info!("Loaded settings from {}", default_path.display());
            Ok(settings)
        } else {
            Ok(AppSettings::default())
        }
    }
}

/// Apply the flags shared by every subcommand.
pub fn apply_global_overrides(settings: &mut AppSettings, cli: &Cli) {
    if cli.telemetry {
        settings.telemetry.enabled = true;
    }
    if let Some(level) = cli.telemetry_level.as_ref() {
        let normalized = level.trim();
        if !normalized.is_empty() {
            let lower = normalized.to_ascii_lowercase();
            settings.telemetry.level = lower.clone();
            if lower == "off" {
                settings.telemetry.enabled = false;
            }
        }
    }
}

pub fn apply_synthesize_overrides(
    settings: &mut AppSettings,
    args: &SynthesizeArgs,
) -> Result<()> {
    if let Some(seed) = args.seed {
        settings.synthesis.seed = Some(seed);
    }
    if !args.tile_sizes.is_empty() {
        let mut sizes = args.tile_sizes.clone();
        sizes.sort_unstable();
        sizes.dedup();
        settings.synthesis.tile_sizes = sizes;
    }
    if !args.scenes.is_empty() {
        settings.catalog.scenes = args
            .scenes
            .iter()
            .map(|spec| parse_scene_spec(spec))
            .collect::<Result<_>>()?;
    }
    if !args.cutouts.is_empty() {
        settings.catalog.cutouts = args.cutouts.clone();
    }
    Ok(())
}

pub fn apply_scan_overrides(settings: &mut AppSettings, args: &ScanArgs) {
    if let Some(model) = args.model.as_ref() {
        settings.classifier.model_path = model.clone();
    }
    if let Some(size) = args.input_size {
        settings.classifier.input_size = size;
    }
    if let Some(window) = args.window_size {
        settings.scan.window_size = window;
    }
    if let Some(overlap) = args.overlap {
        settings.scan.overlap = overlap;
    }
    if let Some(threshold) = args.threshold {
        settings.scan.threshold = threshold;
    }
    if args.sequential {
        settings.scan.parallel = false;
    }
}

/// Parse `PATH:X1,Y1,X2,Y2`. The path may itself contain colons; the last one separates the box.
pub fn parse_scene_spec(spec: &str) -> Result<SceneEntry> {
    let (path, rect) = spec
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("scene '{spec}' must look like PATH:X1,Y1,X2,Y2"))?;
    let coords = rect
        .split(',')
        .map(|value| {
            value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid coordinate '{value}' in scene '{spec}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    let [x1, y1, x2, y2] = coords[..] else {
        anyhow::bail!("scene '{spec}' needs exactly four coordinates");
    };
    anyhow::ensure!(!path.is_empty(), "scene '{spec}' has an empty path");
    Ok(SceneEntry {
        path: Path::new(path).to_path_buf(),
        exclusion: ExclusionSettings { x1, y1, x2, y2 },
    })
}
