//! Noun compounds ("tennis racket", "fire hydrant") in descriptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, TaggedToken};
use crate::error::{DiversityError, Result};
use crate::frequency::FrequencyTable;

/// Maximal runs of two or more consecutive noun-tagged tokens.
pub fn compounds_from_tagged(sentence: &[TaggedToken]) -> Vec<Vec<String>> {
    sentence
        .split(|t| !t.tag().starts_with("NN"))
        .filter(|run| run.len() > 1)
        .map(|run| run.iter().map(|t| t.word().to_owned()).collect())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundStats {
    /// compound length → number of compounds
    pub compound_lengths: BTreeMap<usize, u64>,
    pub compound_counts: FrequencyTable,
    pub counts_by_length: BTreeMap<usize, FrequencyTable>,
    pub total_compounds: u64,
    /// compounds per description
    pub compound_ratio: f64,
}

impl CompoundStats {
    /// Number of distinct compounds of `length` words.
    pub fn types_of_length(&self, length: usize) -> usize {
        self.counts_by_length.get(&length).map_or(0, FrequencyTable::len)
    }
}

/// Compound statistics over a set of descriptions.
///
/// Uses the annotator's compound groups when present and falls back to
/// compounds derived from POS tags.
pub fn compound_stats(entries: &[Annotation]) -> Result<CompoundStats> {
    if entries.is_empty() {
        return Err(DiversityError::EmptyInput("descriptions"));
    }
    let mut stats = CompoundStats::default();
    for entry in entries {
        let compounds = match (&entry.compounds, &entry.tagged) {
            (Some(groups), _) => groups.clone(),
            (None, Some(tagged)) => compounds_from_tagged(tagged),
            (None, None) => Vec::new(),
        };
        for compound in compounds {
            let length = compound.len();
            let text = compound.join(" ");
            *stats.compound_lengths.entry(length).or_default() += 1;
            stats.compound_counts.add(&text, 1);
            stats
                .counts_by_length
                .entry(length)
                .or_default()
                .add(&text, 1);
            stats.total_compounds += 1;
        }
    }
    stats.compound_ratio = stats.total_compounds as f64 / entries.len() as f64;
    Ok(stats)
}

/// Compound statistics of parallel reference collections, one entry per
/// annotator slot, plus their means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCompoundStats {
    pub per_slot: Vec<CompoundStats>,
    /// compound length → mean number of compounds per slot
    pub avg_compound_lengths: BTreeMap<usize, f64>,
    /// compound length → mean number of distinct compounds per slot
    pub avg_types_by_length: BTreeMap<usize, f64>,
    pub avg_compound_ratio: f64,
}

pub fn parallel_compound_stats(parallel: &[Vec<Annotation>]) -> Result<ReferenceCompoundStats> {
    if parallel.is_empty() {
        return Err(DiversityError::EmptyInput("parallel collections"));
    }
    let per_slot = parallel
        .iter()
        .map(|slot| compound_stats(slot))
        .collect::<Result<Vec<_>>>()?;
    let n = per_slot.len() as f64;

    let mut avg_compound_lengths: BTreeMap<usize, f64> = BTreeMap::new();
    let mut avg_types_by_length: BTreeMap<usize, f64> = BTreeMap::new();
    for stats in &per_slot {
        for (&length, &count) in &stats.compound_lengths {
            *avg_compound_lengths.entry(length).or_default() += count as f64 / n;
        }
        for (&length, table) in &stats.counts_by_length {
            *avg_types_by_length.entry(length).or_default() += table.len() as f64 / n;
        }
    }
    Ok(ReferenceCompoundStats {
        avg_compound_ratio: per_slot.iter().map(|s| s.compound_ratio).sum::<f64>() / n,
        avg_compound_lengths,
        avg_types_by_length,
        per_slot,
    })
}
