//! Corpus-wide vocabulary recall ("coverage").
//!
//! A system recalls a word of the target vocabulary if it produces that word
//! anywhere in its output. The target is usually the *learnable* vocabulary:
//! words that occur both in the training data and in the reference data.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DiversityError, Result};
use crate::frequency::FrequencyTable;

/// Number of frequency bins reported by [`percentiles`].
pub const NUM_PERCENTILES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub recalled: BTreeSet<String>,
    pub score: f64,
    /// System words outside the target vocabulary.
    pub not_in_val: BTreeSet<String>,
}

/// |system ∩ target| / |target|.
pub fn coverage(system: &BTreeSet<String>, target: &BTreeSet<String>) -> Result<Coverage> {
    if target.is_empty() {
        return Err(DiversityError::EmptyInput("target vocabulary"));
    }
    let recalled: BTreeSet<String> = system.intersection(target).cloned().collect();
    Ok(Coverage {
        score: recalled.len() as f64 / target.len() as f64,
        not_in_val: system.difference(target).cloned().collect(),
        recalled,
    })
}

/// Words that are in principle learnable from the training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learnability {
    pub learnable: BTreeSet<String>,
    /// Best attainable coverage of the reference vocabulary.
    pub limit: f64,
    /// Reference words that never occur in training.
    pub size_limit: usize,
}

impl Learnability {
    pub fn new(train: &BTreeSet<String>, reference: &BTreeSet<String>) -> Result<Self> {
        if reference.is_empty() {
            return Err(DiversityError::EmptyInput("reference vocabulary"));
        }
        let learnable: BTreeSet<String> = train.intersection(reference).cloned().collect();
        Ok(Self {
            limit: learnable.len() as f64 / reference.len() as f64,
            size_limit: reference.len() - learnable.len(),
            learnable,
        })
    }
}

/// Pair each word with its reference frequency and rank, most frequent
/// first. Ties are broken by word. `n = None` keeps everything.
pub fn most_frequent_omissions<'a, I>(
    words: I,
    reference: &FrequencyTable,
    n: Option<usize>,
) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut ranked: Vec<(String, u64)> = words
        .into_iter()
        .map(|word| (word.clone(), reference.get(word)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.dedup();
    if let Some(n) = n {
        ranked.truncate(n);
    }
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// Percentage recalled per bin, most frequent bin first.
    pub val_scores: Vec<f64>,
    /// Words per bin, in the same order as `val_scores`.
    pub bin_sizes: Vec<usize>,
    pub num_percentiles: usize,
}

impl Percentiles {
    /// Size of each bin for a ranked vocabulary of `len` words.
    pub fn chunk_sizes(len: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        let size = len.div_ceil(NUM_PERCENTILES);
        (0..len)
            .step_by(size)
            .map(|start| size.min(len - start))
            .collect()
    }
}

fn chunk_retrieval_score(chunk: &[(String, u64)], retrieved: &BTreeSet<String>) -> f64 {
    let overlap = chunk.iter().filter(|(w, _)| retrieved.contains(w)).count();
    overlap as f64 / chunk.len() as f64 * 100.0
}

/// Recall per frequency bin of a ranked vocabulary.
///
/// `ranked` must be ordered by descending frequency (see
/// [`FrequencyTable::most_common`]). Bins hold `ceil(len / 10)` words each,
/// the last bin may be smaller; small vocabularies therefore yield fewer than
/// ten bins.
pub fn percentiles(ranked: &[(String, u64)], retrieved: &BTreeSet<String>) -> Result<Percentiles> {
    if ranked.is_empty() {
        return Err(DiversityError::EmptyInput("ranked vocabulary"));
    }
    let bin_sizes = Percentiles::chunk_sizes(ranked.len());
    let mut rest = ranked;
    let val_scores = bin_sizes
        .iter()
        .map(|&size| {
            let (chunk, tail) = rest.split_at(size);
            rest = tail;
            chunk_retrieval_score(chunk, retrieved)
        })
        .collect();
    Ok(Percentiles {
        val_scores,
        bin_sizes,
        num_percentiles: NUM_PERCENTILES,
    })
}

/// Complete global recall blob of one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRecall {
    #[serde(flatten)]
    pub coverage: Coverage,
    pub omissions: Vec<(String, u64)>,
    pub percentiles: Percentiles,
}

/// Coverage of `target`, frequency ranking of the recalled words, and
/// percentile bins over `target` ranked by `reference` frequency.
pub fn score_system(
    system: &BTreeSet<String>,
    target: &BTreeSet<String>,
    reference: &FrequencyTable,
) -> Result<GlobalRecall> {
    let coverage = coverage(system, target)?;
    let omissions = most_frequent_omissions(&coverage.recalled, reference, None);
    let ranked_target = most_frequent_omissions(target, reference, None);
    let percentiles = percentiles(&ranked_target, &coverage.recalled)?;
    Ok(GlobalRecall {
        coverage,
        omissions,
        percentiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| (*w).to_owned()).collect()
    }

    #[test]
    fn coverage_of_small_target() {
        let cov = coverage(&set(&["a", "c", "z"]), &set(&["a", "b", "c", "d"])).unwrap();
        assert_eq!(cov.recalled, set(&["a", "c"]));
        assert_eq!(cov.score, 0.5);
        assert_eq!(cov.not_in_val, set(&["z"]));
    }

    #[test]
    fn empty_target_fails() {
        assert_eq!(
            coverage(&set(&["a"]), &BTreeSet::new()),
            Err(DiversityError::EmptyInput("target vocabulary"))
        );
    }

    #[test]
    fn learnable_is_intersection() {
        let l = Learnability::new(&set(&["a", "b", "x"]), &set(&["a", "b", "c", "d"])).unwrap();
        assert_eq!(l.learnable, set(&["a", "b"]));
        assert_eq!(l.limit, 0.5);
        assert_eq!(l.size_limit, 2);
    }

    #[test]
    fn omissions_rank_by_reference_frequency() {
        let reference: FrequencyTable = ["a", "b", "b", "c", "c"].into_iter().collect();
        let ranked = most_frequent_omissions(&set(&["a", "b", "c", "q"]), &reference, None);
        assert_eq!(
            ranked,
            vec![
                ("b".to_owned(), 2),
                ("c".to_owned(), 2),
                ("a".to_owned(), 1),
                ("q".to_owned(), 0)
            ]
        );
        let top = most_frequent_omissions(&set(&["a", "b", "c"]), &reference, Some(1));
        assert_eq!(top, vec![("b".to_owned(), 2)]);
    }

    #[test]
    fn chunk_sizes_use_ceiling_division() {
        assert_eq!(Percentiles::chunk_sizes(25), vec![3, 3, 3, 3, 3, 3, 3, 3, 1]);
        assert_eq!(Percentiles::chunk_sizes(20), vec![2; 10]);
        assert_eq!(Percentiles::chunk_sizes(0), Vec::<usize>::new());
    }

    #[test]
    fn percentiles_score_each_bin() {
        let ranked: Vec<(String, u64)> = (0..20)
            .map(|i| (format!("w{i:02}"), 100 - i as u64))
            .collect();
        let retrieved = set(&["w00", "w01", "w02"]);
        let p = percentiles(&ranked, &retrieved).unwrap();
        assert_eq!(p.val_scores.len(), 10);
        assert_eq!(p.bin_sizes, vec![2; 10]);
        assert_eq!(p.val_scores[0], 100.0);
        assert_eq!(p.val_scores[1], 50.0);
        assert!(p.val_scores[2..].iter().all(|s| *s == 0.0));
        assert_eq!(p.num_percentiles, 10);
    }

    #[test]
    fn small_vocabulary_bins_cover_every_word() {
        let ranked: Vec<(String, u64)> = (0..11).map(|i| (format!("w{i:02}"), 20 - i)).collect();
        let retrieved = set(&["w10"]);
        let p = percentiles(&ranked, &retrieved).unwrap();
        assert_eq!(p.bin_sizes, vec![2, 2, 2, 2, 2, 1]);
        assert_eq!(p.val_scores, vec![0.0, 0.0, 0.0, 0.0, 0.0, 100.0]);
    }

    #[test]
    fn score_system_bins_target_by_reference_frequency() {
        let reference: FrequencyTable = ["a", "a", "b", "b", "b", "c"].into_iter().collect();
        let target = set(&["a", "b", "c"]);
        let blob = score_system(&set(&["a", "z"]), &target, &reference).unwrap();
        assert!((blob.coverage.score - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(blob.omissions, vec![("a".to_owned(), 2)]);
        // ranked target: b(3) a(2) c(1)
        assert_eq!(blob.percentiles.val_scores, vec![0.0, 100.0, 0.0]);
    }
}
