//! `wally synthesize`: build the labeled tile corpus from the catalog.

use std::path::Path;

use anyhow::{Context, Result};
use log::{Level, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use wally_core::{
    AugmentationRanges, CutoutAsset, ExclusionRect, Label, LabeledCorpus, SourceScene,
    WallyError, synthesize_scene,
};
use wally_utils::{AppSettings, SceneEntry, timing_guard};

use crate::types::SynthesisSummary;

/// Run synthesis and persist the corpus under `output`.
///
/// A scene that cannot be loaded or tiled is logged and skipped; everything else is fatal.
pub fn run(settings: &AppSettings, output: &Path) -> Result<SynthesisSummary> {
    let _guard = timing_guard("wally_cli::synthesize", Level::Info);
    let catalog = &settings.catalog;

    let cutouts = catalog
        .cutouts
        .iter()
        .map(|path| CutoutAsset::open(path))
        .collect::<Result<Vec<_>>>()?;
    if cutouts.is_empty() {
        return Err(WallyError::EmptySource("cutouts").into());
    }

    let ranges =
        AugmentationRanges::from_settings(&settings.synthesis.rotation, &settings.synthesis.scale)
            .context("invalid augmentation ranges")?;
    let seed = settings.synthesis.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    info!(
        "Synthesizing from {} scene(s) and {} cutout(s) with seed {seed}",
        catalog.scenes.len(),
        cutouts.len()
    );

    let mut corpus = LabeledCorpus::default();
    let mut used = 0usize;
    let mut skipped = Vec::new();
    for (index, entry) in catalog.scenes.iter().enumerate() {
        let result = load_scene(entry).and_then(|scene| {
            synthesize_scene(
                index,
                &scene,
                &cutouts,
                &settings.synthesis.tile_sizes,
                &ranges,
                &mut rng,
            )
            .with_context(|| format!("failed to synthesize {}", entry.path.display()))
        });
        match result {
            Ok(tiles) => {
                info!("{} -> {} tile(s)", entry.path.display(), tiles.len());
                corpus.extend(tiles);
                used += 1;
            }
            Err(err) => {
                warn!("Skipping scene {}: {err:#}", entry.path.display());
                skipped.push(entry.path.display().to_string());
            }
        }
    }
    if used == 0 {
        return Err(WallyError::EmptySource("scenes").into());
    }

    corpus.shuffle(&mut rng);
    corpus.save_to_dir(output)?;

    Ok(SynthesisSummary {
        output: output.display().to_string(),
        seed,
        scenes: used,
        skipped_scenes: skipped,
        tile_sizes: settings.synthesis.tile_sizes.clone(),
        positives: corpus.count(Label::Positive),
        negatives: corpus.count(Label::Negative),
    })
}

fn load_scene(entry: &SceneEntry) -> Result<SourceScene> {
    let exclusion = ExclusionRect::try_from(entry.exclusion)
        .with_context(|| format!("invalid exclusion for {}", entry.path.display()))?;
    SourceScene::open(&entry.path, exclusion)
}
