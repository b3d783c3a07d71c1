mod args;
mod config;
mod input;
mod scan;
mod synthesize;
mod types;

use std::{
    fs::{self, File},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};
use serde::Serialize;
use wally_core::reference_network;
use wally_utils::{configure_telemetry, init_logging};

use crate::args::{Cli, Command};
use crate::config::{
    apply_global_overrides, apply_scan_overrides, apply_synthesize_overrides, load_settings,
};

fn main() -> Result<()> {
    init_logging(LevelFilter::Info)?;
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_ref())?;
    apply_global_overrides(&mut settings, &cli);
    configure_telemetry(
        settings.telemetry.enabled,
        settings.telemetry.level_filter(),
    );

    match &cli.command {
        Command::Synthesize(args) => {
            apply_synthesize_overrides(&mut settings, args)?;
            let summary = synthesize::run(&settings, &args.output)?;
            info!(
                "Wrote {} positive and {} negative tiles (seed {})",
                summary.positives, summary.negatives, summary.seed
            );
            emit_json(&summary, args.json.as_ref())
        }
        Command::Scan(args) => {
            apply_scan_overrides(&mut settings, args);
            let results = scan::run(&settings, &args.input, &args.output)?;
            emit_json(&results, args.json.as_ref())
        }
        Command::Layers(args) => {
            let network = reference_network(settings.classifier.input_size);
            emit_json(&network, args.json.as_ref())
        }
    }
}

/// Write `value` as pretty JSON to `path`, or to stdout when no path is given.
fn emit_json<T: Serialize>(value: &T, path: Option<&PathBuf>) -> Result<()> {
    if let Some(json_path) = path {
        if let Some(dir) = json_path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let file = File::create(json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, value)
            .with_context(|| format!("failed to write JSON to {}", json_path.display()))?;
        info!("Wrote {}", json_path.display());
    } else {
        let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
        println!("{json}");
    }
    Ok(())
}
