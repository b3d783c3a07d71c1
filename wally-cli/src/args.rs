//! Command-line argument definitions for the `wally` binary.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Build Wally training tiles and scan scenes for him.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional settings JSON. Defaults to `config/wally.json` when present, otherwise built-in parameters.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, global = true, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cut catalog scenes into labeled tiles and write them under `<output>/wally` and `<output>/not`.
    Synthesize(SynthesizeArgs),
    /// Slide a window over scenes and highlight the windows the classifier accepts.
    Scan(ScanArgs),
    /// Print the reference network layer table as JSON.
    Layers(LayersArgs),
}

#[derive(Debug, Args)]
pub struct SynthesizeArgs {
    /// Directory receiving the `wally/` and `not/` sample folders.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Seed for reproducible corpora.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tile edge length in pixels; repeat to use several sizes.
    #[arg(long = "tile-size", value_name = "PIXELS")]
    pub tile_sizes: Vec<u32>,

    /// Add a scene as `PATH:X1,Y1,X2,Y2`; replaces the catalog scenes when given.
    #[arg(long = "scene", value_name = "SPEC")]
    pub scenes: Vec<String>,

    /// Add a cutout PNG; replaces the catalog cutouts when given.
    #[arg(long = "cutout", value_name = "PATH")]
    pub cutouts: Vec<PathBuf>,

    /// Write the synthesis summary to a JSON file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Path to a scene image or a directory of scenes.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to the trained ONNX classifier (defaults to settings file).
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Directory receiving the highlighted scenes.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Override window edge length (pixels).
    #[arg(long)]
    pub window_size: Option<u32>,

    /// Override overlap between neighbouring windows (pixels).
    #[arg(long)]
    pub overlap: Option<u32>,

    /// Override acceptance threshold.
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Override classifier input edge length (pixels).
    #[arg(long)]
    pub input_size: Option<u32>,

    /// Score windows on a single thread.
    #[arg(long, action = ArgAction::SetTrue)]
    pub sequential: bool,

    /// Write accepted windows to a JSON file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LayersArgs {
    /// Write the layer table to a JSON file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,
}
