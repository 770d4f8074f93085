//! Novel and unique generated descriptions.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{DiversityError, Result};

const SENTENCE_FINAL: &[char] = &['.', '?', '!'];

/// Lowercase and strip trailing sentence-final punctuation.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().trim_end_matches(SENTENCE_FINAL).to_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyStats {
    pub unique_descriptions: BTreeSet<String>,
    pub num_unique_descriptions: usize,
    pub novel_descriptions: BTreeSet<String>,
    pub num_novel_description_types: usize,
    /// Generated descriptions (tokens, not types) that are novel.
    pub total_num_novel_descriptions: usize,
    pub percentage_novel: f64,
}

/// Compare generated descriptions against the training descriptions.
pub fn sentence_stats<T, G>(train: &[T], generated: &[G]) -> Result<NoveltyStats>
where
    T: AsRef<str>,
    G: AsRef<str>,
{
    if generated.is_empty() {
        return Err(DiversityError::EmptyInput("generated descriptions"));
    }
    let train_unique: HashSet<String> = train.iter().map(|d| normalize(d.as_ref())).collect();
    let gen_normalized: Vec<String> = generated.iter().map(|d| normalize(d.as_ref())).collect();

    let unique: BTreeSet<String> = gen_normalized.iter().cloned().collect();
    let novel: BTreeSet<String> = unique
        .iter()
        .filter(|d| !train_unique.contains(*d))
        .cloned()
        .collect();
    let total_novel = gen_normalized.iter().filter(|d| novel.contains(*d)).count();

    Ok(NoveltyStats {
        num_unique_descriptions: unique.len(),
        unique_descriptions: unique,
        num_novel_description_types: novel.len(),
        novel_descriptions: novel,
        total_num_novel_descriptions: total_novel,
        percentage_novel: total_novel as f64 / generated.len() as f64 * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_final_punctuation_only() {
        assert_eq!(normalize("A Dog runs!?."), "a dog runs");
        assert_eq!(normalize("...a dog"), "...a dog");
    }

    #[test]
    fn counts_novel_occurrences_not_types() {
        let train = ["A dog runs.", "A cat sleeps"];
        let generated = ["a dog runs", "A bird flies.", "a bird flies", "a cow"];
        let stats = sentence_stats(&train, &generated).unwrap();
        assert_eq!(stats.num_unique_descriptions, 3);
        assert_eq!(stats.num_novel_description_types, 2);
        assert_eq!(stats.total_num_novel_descriptions, 3);
        assert_eq!(stats.percentage_novel, 75.0);
    }

    #[test]
    fn corpus_against_itself_is_not_novel() {
        let corpus = ["A dog.", "a cat", "Two birds!"];
        let stats = sentence_stats(&corpus, &corpus).unwrap();
        assert_eq!(stats.percentage_novel, 0.0);
        assert!(stats.novel_descriptions.is_empty());
    }

    #[test]
    fn empty_generation_fails() {
        let none: [&str; 0] = [];
        assert_eq!(
            sentence_stats(&["a"], &none),
            Err(DiversityError::EmptyInput("generated descriptions"))
        );
    }
}
