//! Which words do systems fail to produce?
//!
//! Global ranking: the most frequent learnable words that no system ever
//! generates. Local ranking: the words most often missed in a given
//! importance class, by absolute count or by missed ratio.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::frequency::FrequencyTable;
use crate::global_recall::GlobalRecall;
use crate::local_recall::LocalRecall;
use crate::novelty::NoveltyStats;
use crate::stats::{ParallelStats, SystemStats};

/// Tokens never worth reporting as omissions.
fn is_noise(word: &str) -> bool {
    word == ".." || word.trim().is_empty() || word.chars().all(|c| c.is_ascii_punctuation())
}

/// Learnable words produced by none of the systems.
pub fn not_learned<'a, I>(learnable: &BTreeSet<String>, systems: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a BTreeSet<String>>,
{
    systems
        .into_iter()
        .fold(learnable.clone(), |remaining, types| {
            remaining.difference(types).cloned().collect()
        })
}

/// The `n` most frequent words of `reference` that are in `omitted`,
/// punctuation excluded.
pub fn top_omitted(reference: &FrequencyTable, omitted: &BTreeSet<String>, n: usize) -> Vec<String> {
    reference
        .most_common()
        .into_iter()
        .filter(|(word, _)| omitted.contains(word) && !is_noise(word))
        .take(n)
        .map(|(word, _)| word)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedRatio {
    pub word: String,
    /// missed / (missed + recalled)
    pub ratio: f64,
    pub occurrences: u64,
}

/// Missed ratio per word, highest first.
///
/// With `min_occurrences = Some(k)` only words seen more than `k` times are
/// kept. Ties are broken by occurrences (descending), then word.
pub fn missed_ratios(
    missed: &FrequencyTable,
    recalled: &FrequencyTable,
    min_occurrences: Option<u64>,
) -> Vec<MissedRatio> {
    let words: BTreeSet<&str> = missed.words().chain(recalled.words()).collect();
    let mut ratios: Vec<MissedRatio> = words
        .into_iter()
        .map(|word| {
            let occurrences = missed.get(word) + recalled.get(word);
            MissedRatio {
                word: word.to_owned(),
                ratio: missed.get(word) as f64 / occurrences as f64,
                occurrences,
            }
        })
        .filter(|r| min_occurrences.map_or(true, |k| r.occurrences > k))
        .collect();
    ratios.sort_by(|a, b| {
        b.ratio
            .total_cmp(&a.ratio)
            .then_with(|| b.occurrences.cmp(&a.occurrences))
            .then_with(|| a.word.cmp(&b.word))
    });
    ratios
}

/// One line of the summary table: a system, or the reference corpus with its
/// figures averaged over annotator slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "System")]
    pub system: String,
    #[serde(rename = "ASL")]
    pub average_sentence_length: f64,
    #[serde(rename = "SDSL")]
    pub std_sentence_length: f64,
    #[serde(rename = "Types")]
    pub types: f64,
    #[serde(rename = "TTR1")]
    pub ttr1: Option<f64>,
    #[serde(rename = "TTR2")]
    pub ttr2: Option<f64>,
    #[serde(rename = "%Novel")]
    pub percentage_novel: f64,
    #[serde(rename = "Cov")]
    pub coverage: Option<f64>,
    #[serde(rename = "Loc")]
    pub local_top_class: Option<f64>,
}

impl SummaryRow {
    pub fn new(
        system: &str,
        stats: &SystemStats,
        novelty: &NoveltyStats,
        global: &GlobalRecall,
        local: &LocalRecall,
    ) -> Self {
        Self {
            system: system.to_owned(),
            average_sentence_length: stats.average_sentence_length,
            std_sentence_length: stats.std_sentence_length,
            types: stats.counts.num_types as f64,
            ttr1: stats.type_token_ratio,
            ttr2: stats.bittr,
            percentage_novel: novelty.percentage_novel,
            coverage: Some(global.coverage.score),
            local_top_class: local.top_class_score(),
        }
    }

    /// Reference row; recall columns stay empty.
    pub fn reference(name: &str, stats: &ParallelStats, novelty: &NoveltyStats) -> Self {
        Self {
            system: name.to_owned(),
            average_sentence_length: stats.average_sentence_length,
            std_sentence_length: stats.std_sentence_length,
            types: stats.counts.avg_types,
            ttr1: stats.type_token_ratio,
            ttr2: stats.bittr,
            percentage_novel: novelty.percentage_novel,
            coverage: None,
            local_top_class: None,
        }
    }
}
