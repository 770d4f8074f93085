/*
cargo run --bin corpus_stats -- \
    --train data/coco/captions_train2014_tagged.json \
    --val   data/coco/captions_val2014_tagged.json \
    --out-dir output/corpus

cargo run --bin corpus_stats -- \
    --train data/coco/captions_train2014_tagged.json \
    --val   data/coco/captions_val2014_tagged.json \
    --out-dir output/corpus_truncated \
    --truncate --seed 42
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use capdiv::annotation::captions;
use capdiv::compounds::parallel_compound_stats;
use capdiv::global_recall::Learnability;
use capdiv::{io, logging, novelty, stats};
use capdiv::{AlignmentPolicy, CorpusIndex, StatsConfig};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Type/token statistics of the training and validation reference corpora.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Training annotations ({"annotations": [...]})
    #[arg(long, value_name = "PATH")]
    train: PathBuf,

    /// Validation annotations
    #[arg(long, value_name = "PATH")]
    val: PathBuf,

    /// Where train_stats.json, val_stats.json, val_compounds.json, ... are written
    #[arg(long = "out-dir", value_name = "PATH", default_value = "output/corpus")]
    out_dir: PathBuf,

    /// Seed for the shuffled type-token curves
    #[arg(long, default_value_t = 1234)]
    seed: u64,

    /// Shuffled passes averaged into each curve
    #[arg(long, default_value_t = 10)]
    curve_repeats: usize,

    /// Keep only the smallest per-image reference count instead of failing
    #[arg(long, default_value_t = false)]
    truncate: bool,

    /// Keep the original casing of tokens
    #[arg(long, default_value_t = false)]
    case_sensitive: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = logging::init_logger(&cli.log_dir, "corpus_stats", cli.verbose)?;
    info!("Started - train: {:?}, val: {:?}", cli.train, cli.val);

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

    let train = io::load_annotations(&cli.train)?;
    let val = io::load_annotations(&cli.val)?;

    let mut summaries = Vec::with_capacity(2);
    for (name, annotations) in [("train", &train), ("val", &val)] {
        let index = CorpusIndex::from_annotations(annotations, lower);
        let parallel = index
            .parallel(policy)
            .with_context(|| format!("aligning {name} references"))?;
        info!(
            "{name}: {} images, {} references per image",
            index.len(),
            parallel.len()
        );
        let result = stats::parallel_stats(&parallel, &config, &mut rng)
            .with_context(|| format!("computing {name} statistics"))?;
        io::write_json(&cli.out_dir.join(format!("{name}_stats.json")), &result)?;
        summaries.push(result);
    }

    let learnability = Learnability::new(&summaries[0].counts.types, &summaries[1].counts.types)?;
    info!(
        "Learnable vocabulary: {} words, ceiling {:.4}, {} val words unseen in training",
        learnability.learnable.len(),
        learnability.limit,
        learnability.size_limit
    );
    io::write_json(&cli.out_dir.join("learnability.json"), &learnability)?;

    let val_novelty = novelty::sentence_stats(&captions(&train), &captions(&val))?;
    info!(
        "Novel val descriptions: {:.2}%",
        val_novelty.percentage_novel
    );
    io::write_json(&cli.out_dir.join("val_novelty.json"), &val_novelty)?;

    let val_compounds = CorpusIndex::grouped(&val)
        .parallel(policy)
        .and_then(|parallel| parallel_compound_stats(&parallel))
        .context("computing val compound statistics")?;
    info!(
        "Val compounds: {:.3} per description, averaged over {} slots",
        val_compounds.avg_compound_ratio,
        val_compounds.per_slot.len()
    );
    io::write_json(&cli.out_dir.join("val_compounds.json"), &val_compounds)?;

    println!("Results in {:?}, log in {:?}", cli.out_dir, log_path);
    Ok(())
}
