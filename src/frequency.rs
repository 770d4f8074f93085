//! Word frequency tables with a reproducible ranking order.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Word → count, iterated in word order and ranked by count descending,
/// then word ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable(BTreeMap<String, u64>);

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sentences(sentences: &[Vec<String>]) -> Self {
        let mut table = Self::new();
        for word in sentences.iter().flatten() {
            table.add(word, 1);
        }
        table
    }

    pub fn add(&mut self, word: &str, n: u64) {
        *self.0.entry(word.to_owned()).or_default() += n;
    }

    pub fn merge(&mut self, other: &FrequencyTable) {
        for (word, count) in &other.0 {
            self.add(word, *count);
        }
    }

    /// Count of `word`, 0 when unseen.
    pub fn get(&self, word: &str) -> u64 {
        self.0.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(w, c)| (w.as_str(), *c))
    }

    /// All `(word, count)` pairs, most frequent first.
    pub fn most_common(&self) -> Vec<(String, u64)> {
        self.0
            .iter()
            .map(|(w, c)| (w.clone(), *c))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .collect()
    }

    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.most_common();
        ranked.truncate(n);
        ranked
    }
}

impl<S: AsRef<str>> FromIterator<S> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = Self::new();
        for word in iter {
            table.add(word.as_ref(), 1);
        }
        table
    }
}
