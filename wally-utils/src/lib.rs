//! Common helpers shared across the Wally crates.

/// Settings file schema and persistence.
pub mod config;
/// Image loading, resizing, color and tensor conversion.
pub mod image_utils;
/// Scoped timing logs for pipeline stages.
pub mod telemetry;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use config::{
    AppSettings, CatalogSettings, ClassifierSettings, ExclusionSettings, RotationRange,
    ScaleRange, ScanSettings, SceneEntry, SynthesisSettings, TelemetrySettings,
};
pub use image_utils::{greyscale_rgb, load_image, load_rgba, resize_rgb, rgb_to_bgr_hwc};
pub use telemetry::{TimingGuard, configure as configure_telemetry, timing_guard};

/// Initialize logging once for CLI use.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module("wally::telemetry", LevelFilter::Trace);

    // A second call (e.g. from tests) keeps the existing logger.
    let _ = builder.try_init();
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
