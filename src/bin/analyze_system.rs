/*
cargo run --bin analyze_system -- \
    --system  systems/show_attend_tell/val_output_tagged.json \
    --train   data/coco/captions_train2014_tagged.json \
    --val     data/coco/captions_val2014_tagged.json \
    --out-dir output/systems/show_attend_tell
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use capdiv::annotation::{captions, sentences};
use capdiv::compounds::compound_stats;
use capdiv::global_recall::{score_system, Learnability};
use capdiv::index::mapping_from_annotations;
use capdiv::local_recall::local_recall;
use capdiv::{io, logging, novelty, stats};
use capdiv::{AlignmentPolicy, CorpusIndex, StatsConfig};
use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Diversity, novelty and recall of one system's generated descriptions.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Generated output: a plain list of annotations, one per image
    #[arg(long, value_name = "PATH")]
    system: PathBuf,

    /// Training annotations
    #[arg(long, value_name = "PATH")]
    train: PathBuf,

    /// POS-tagged validation annotations
    #[arg(long, value_name = "PATH")]
    val: PathBuf,

    #[arg(long = "out-dir", value_name = "PATH")]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 1234)]
    seed: u64,

    #[arg(long, default_value_t = 10)]
    curve_repeats: usize,

    /// Keep only the smallest per-image reference count instead of failing
    #[arg(long, default_value_t = false)]
    truncate: bool,

    #[arg(long, default_value_t = false)]
    case_sensitive: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(&cli.log_dir, "analyze_system", cli.verbose)?;
    info!("Started - system: {:?}, out_dir: {:?}", cli.system, cli.out_dir);

    let config = StatsConfig {
        seed: cli.seed,
        curve_repeats: cli.curve_repeats,
        ..StatsConfig::default()
    };
    config.validate()?;
    let policy = if cli.truncate {
        AlignmentPolicy::Truncate
    } else {
        AlignmentPolicy::Strict
    };
    let lower = !cli.case_sensitive;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let output = io::load_system_output(&cli.system)?;
    let train = io::load_annotations(&cli.train)?;
    let val = io::load_annotations(&cli.val)?;

    // ----- diversity -------------------------------------------------------
    let generated = sentences(&output, lower);
    let system = stats::system_stats(&generated, &config, &mut rng)
        .context("computing system statistics")?;
    info!(
        "{} types, {} tokens, ASL {:.2}",
        system.counts.num_types, system.counts.num_tokens, system.average_sentence_length
    );
    io::write_json(&cli.out_dir.join("stats.json"), &system)?;

    let novel = novelty::sentence_stats(&captions(&train), &captions(&output))?;
    info!("Novel descriptions: {:.2}%", novel.percentage_novel);
    io::write_json(&cli.out_dir.join("novelty.json"), &novel)?;

    // ----- global recall ---------------------------------------------------
    let train_counts = stats::types_tokens(&sentences(&train, lower));
    let val_counts = stats::types_tokens(&sentences(&val, lower));
    let learnability = Learnability::new(&train_counts.types, &val_counts.types)?;
    let global = score_system(&system.counts.types, &learnability.learnable, &val_counts.counts)
        .context("scoring global recall")?;
    info!(
        "Global recall {:.4} of {} learnable words (ceiling {:.4})",
        global.coverage.score,
        learnability.learnable.len(),
        learnability.limit
    );
    io::write_json(&cli.out_dir.join("global_recall.json"), &global)?;

    // ----- local recall ----------------------------------------------------
    let references = CorpusIndex::tagged_from_annotations(&val, lower)?;
    let by_image = mapping_from_annotations(&output, lower);
    if by_image.len() != output.len() {
        warn!(
            "{} duplicate descriptions, keeping the last one per image",
            output.len() - by_image.len()
        );
    }
    let local = local_recall(&by_image, &references, policy).context("scoring local recall")?;
    info!("Local recall per importance class: {:?}", local.scores);
    io::write_json(&cli.out_dir.join("local_recall.json"), &local)?;

    // ----- compounds -------------------------------------------------------
    let compounds = compound_stats(&output)?;
    info!(
        "{} compounds, {:.3} per description",
        compounds.total_compounds, compounds.compound_ratio
    );
    io::write_json(&cli.out_dir.join("compounds.json"), &compounds)?;

    println!("Results in {:?}", cli.out_dir);
    Ok(())
}
