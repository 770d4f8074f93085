/*
cargo run --bin rank_systems -- \
    --corpus-dir output/corpus \
    --systems output/systems/show_attend_tell output/systems/neuraltalk \
    --out-dir output/ranking

cargo run --bin rank_systems -- \
    --corpus-dir output/corpus \
    --systems output/systems/show_attend_tell output/systems/neuraltalk output/systems/nic \
    --out-dir output/ranking --top-n 50 --min-occurrences 5
*/

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use capdiv::global_recall::{GlobalRecall, Learnability};
use capdiv::local_recall::LocalRecall;
use capdiv::novelty::NoveltyStats;
use capdiv::ranking::{missed_ratios, not_learned, top_omitted, MissedRatio, SummaryRow};
use capdiv::stats::{ParallelStats, SystemStats};
use capdiv::{io, logging, FrequencyTable};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;

/// Rank omitted words across systems and write the summary table.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding train_stats.json, val_stats.json and val_novelty.json
    #[arg(long = "corpus-dir", value_name = "PATH")]
    corpus_dir: PathBuf,

    /// One analyze_system output directory per system
    #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
    systems: Vec<PathBuf>,

    #[arg(long = "out-dir", value_name = "PATH", default_value = "output/ranking")]
    out_dir: PathBuf,

    /// Length of every ranking
    #[arg(long, default_value_t = 20)]
    top_n: usize,

    /// Per-system occurrence threshold of the filtered missed-ratio ranking
    #[arg(long, default_value_t = 10)]
    min_occurrences: u64,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    verbose: bool,
}

struct SystemResults {
    name: String,
    stats: SystemStats,
    global: GlobalRecall,
    local: LocalRecall,
    novelty: NoveltyStats,
}

fn load_system(dir: &Path) -> Result<SystemResults> {
    let name = dir
        .file_name()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no system name in {}", dir.display()))?
        .to_owned();
    Ok(SystemResults {
        stats: io::read_json(&dir.join("stats.json"))?,
        global: io::read_json(&dir.join("global_recall.json"))?,
        local: io::read_json(&dir.join("local_recall.json"))?,
        novelty: io::read_json(&dir.join("novelty.json"))?,
        name,
    })
}

#[derive(Debug, Serialize)]
struct Rankings {
    systems: Vec<String>,
    train_total_types: usize,
    train_total_tokens: u64,
    val_total_types: usize,
    val_total_tokens: u64,
    num_not_learned: usize,
    top_omitted_train: Vec<String>,
    top_omitted_val: Vec<String>,
    importance_class: usize,
    most_missed: Vec<(String, u64)>,
    highest_missed_ratio: Vec<MissedRatio>,
    highest_missed_ratio_frequent: Vec<MissedRatio>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(&cli.log_dir, "rank_systems", cli.verbose)?;
    info!("Started - {} systems, out_dir: {:?}", cli.systems.len(), cli.out_dir);

    let train: ParallelStats = io::read_json(&cli.corpus_dir.join("train_stats.json"))?;
    let val: ParallelStats = io::read_json(&cli.corpus_dir.join("val_stats.json"))?;
    let val_novelty: NoveltyStats = io::read_json(&cli.corpus_dir.join("val_novelty.json"))?;
    let learnability = Learnability::new(&train.counts.types, &val.counts.types)?;
    info!(
        "Train: {} types, {} tokens; val: {} types, {} tokens",
        train.counts.total_types,
        train.counts.total_tokens,
        val.counts.total_types,
        val.counts.total_tokens
    );

    let bar = ProgressBar::new(cli.systems.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )?);

    let mut results = Vec::with_capacity(cli.systems.len());
    for dir in &cli.systems {
        bar.set_message(dir.display().to_string());
        let system = load_system(dir).with_context(|| format!("loading {}", dir.display()))?;
        info!(
            "{}: coverage {:.4}, {} importance classes",
            system.name,
            system.global.coverage.score,
            system.local.scores.len()
        );
        results.push(system);
        bar.inc(1);
    }
    bar.finish_and_clear();

    // ----- global: learnable words no system produced ---------------------
    let missing = not_learned(
        &learnability.learnable,
        results.iter().map(|r| &r.stats.counts.types),
    );
    info!(
        "{} of {} learnable words are produced by no system",
        missing.len(),
        learnability.learnable.len()
    );
    let top_omitted_train = top_omitted(&train.counts.total_counts, &missing, cli.top_n);
    let top_omitted_val = top_omitted(&val.counts.total_counts, &missing, cli.top_n);

    // ----- local: words missed in the highest importance class ------------
    let classes: BTreeSet<usize> = results.iter().map(|r| r.local.scores.len()).collect();
    let Some(&top_class) = classes.iter().next_back() else {
        bail!("no systems to rank");
    };
    if classes.len() > 1 {
        warn!("Systems disagree on the number of importance classes: {classes:?}");
    }
    let mut missed = FrequencyTable::new();
    let mut recalled = FrequencyTable::new();
    for r in &results {
        if let Some(table) = r.local.counts.missed.get(&top_class) {
            missed.merge(table);
        }
        if let Some(table) = r.local.counts.recalled.get(&top_class) {
            recalled.merge(table);
        }
    }
    let threshold = cli.min_occurrences * results.len() as u64;
    let mut highest_missed_ratio = missed_ratios(&missed, &recalled, None);
    highest_missed_ratio.truncate(cli.top_n);
    let mut highest_missed_ratio_frequent = missed_ratios(&missed, &recalled, Some(threshold));
    highest_missed_ratio_frequent.truncate(cli.top_n);

    let rankings = Rankings {
        systems: results.iter().map(|r| r.name.clone()).collect(),
        train_total_types: train.counts.total_types,
        train_total_tokens: train.counts.total_tokens,
        val_total_types: val.counts.total_types,
        val_total_tokens: val.counts.total_tokens,
        num_not_learned: missing.len(),
        top_omitted_train,
        top_omitted_val,
        importance_class: top_class,
        most_missed: missed.top(cli.top_n),
        highest_missed_ratio,
        highest_missed_ratio_frequent,
    };
    io::write_json(&cli.out_dir.join("rankings.json"), &rankings)?;

    let mut rows: Vec<SummaryRow> = results
        .iter()
        .map(|r| SummaryRow::new(&r.name, &r.stats, &r.novelty, &r.global, &r.local))
        .collect();
    rows.push(SummaryRow::reference("Val", &val, &val_novelty));
    io::write_csv(&cli.out_dir.join("summary.csv"), &rows)?;

    println!("Rankings and summary in {:?}", cli.out_dir);
    Ok(())
}
